use crate::Result;
use crate::context::RenderContext;
use crate::glyph::{Glyph, GlyphData, ScreenGeometry};
use crate::hittest::HitGeometry;
use crate::spatial::{Bounds, SpatialIndex};
use crate::visuals::{ResolvedVisuals, Visuals};
use narwhal_core::{BBox, ColumnDataSource, CoordinateMapping, Selection, SubscriberId};
use std::cell::Cell;
use std::rc::Rc;

/// Position of a renderer inside its plot.
pub type RendererId = usize;

/// Alpha factor applied to non-selected rows when no non-selection visuals are configured.
pub const NONSELECTION_ALPHA: f64 = 0.2;

/// A glyph bound to a named data source.
///
/// The spatial index is rebuilt lazily: attaching subscribes a flag to the source's structural
/// tier, and the next hit test after the flag fires rebuilds the index from fresh data.
#[derive(Debug)]
pub struct GlyphRenderer {
    pub name: String,
    pub source: String,
    pub glyph: Glyph,
    pub visuals: Visuals,
    pub selection_visuals: Option<Visuals>,
    pub nonselection_visuals: Option<Visuals>,
    pub visible: bool,
    index: SpatialIndex,
    stale: Rc<Cell<bool>>,
    subscription: Option<SubscriberId>,
    index_builds: usize,
}

impl GlyphRenderer {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        glyph: Glyph,
        visuals: Visuals,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            glyph,
            visuals,
            selection_visuals: None,
            nonselection_visuals: None,
            visible: true,
            index: SpatialIndex::default(),
            stale: Rc::new(Cell::new(true)),
            subscription: None,
            index_builds: 0,
        }
    }

    pub fn with_selection_visuals(mut self, visuals: Visuals) -> Self {
        self.selection_visuals = Some(visuals);
        self
    }

    pub fn with_nonselection_visuals(mut self, visuals: Visuals) -> Self {
        self.nonselection_visuals = Some(visuals);
        self
    }

    /// Subscribes to `source`'s structural tier and marks the index stale.
    pub fn attach(&mut self, source: &mut ColumnDataSource) {
        let stale = Rc::clone(&self.stale);
        let id = source
            .signals_mut()
            .change
            .connect(move |_| stale.set(true));
        self.subscription = Some(id);
        self.stale.set(true);
    }

    pub fn detach(&mut self, source: &mut ColumnDataSource) {
        if let Some(id) = self.subscription.take() {
            source.signals_mut().change.disconnect(id);
        }
    }

    pub fn is_index_stale(&self) -> bool {
        self.stale.get()
    }

    /// How many times the spatial index has been built.
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }

    pub fn data(&self, source: &ColumnDataSource) -> Result<GlyphData> {
        self.glyph.set_data(source)
    }

    pub fn geometry(
        &self,
        data: &GlyphData,
        mapping: &CoordinateMapping,
    ) -> Option<ScreenGeometry> {
        self.glyph.map_data(data, mapping)
    }

    fn ensure_index(&mut self, data: &GlyphData) {
        if !self.stale.get() {
            return;
        }
        self.index = SpatialIndex::new(self.glyph.index_entries(data));
        self.index_builds += 1;
        self.stale.set(false);
        tracing::debug!(
            renderer = %self.name,
            rows = self.index.len(),
            "spatial index rebuilt"
        );
    }

    /// Hit-tests `hit` against the rows whose padded extent meets the query box.
    pub fn hit_test(
        &mut self,
        source: &ColumnDataSource,
        hit: &HitGeometry,
        mapping: &CoordinateMapping,
    ) -> Result<Selection> {
        let data = self.data(source)?;
        self.ensure_index(&data);
        let Some(geometry) = self.geometry(&data, mapping) else {
            return Ok(Selection::default());
        };
        let visuals = self.visuals.resolve(source)?;

        let pad = self.glyph.screen_padding(&data, &geometry, &visuals)
            + (visuals.max_line_width() / 2.0).max(2.0);
        let screen = hit.query_box(pad);
        let query = Bounds::new(
            mapping.x_scale.invert(screen.left),
            mapping.y_scale.invert(screen.top),
            mapping.x_scale.invert(screen.right),
            mapping.y_scale.invert(screen.bottom),
        );
        let candidates = if query.x0.is_nan() {
            (0..source.len()).collect()
        } else {
            self.index.indices(&query)
        };
        tracing::trace!(
            renderer = %self.name,
            candidates = candidates.len(),
            "hit test"
        );
        Ok(self
            .glyph
            .hit_test(hit, &candidates, &data, &geometry, &visuals))
    }

    /// Draws every row. With a non-empty selection, unselected rows use the non-selection
    /// visuals and are drawn first.
    pub fn render(
        &self,
        ctx: &mut dyn RenderContext,
        source: &ColumnDataSource,
        mapping: &CoordinateMapping,
    ) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        let data = self.data(source)?;
        let Some(geometry) = self.geometry(&data, mapping) else {
            return Ok(());
        };
        let visuals = self.visuals.resolve(source)?;
        let len = source.len();

        let selected: Vec<usize> = source
            .selected
            .indices
            .iter()
            .copied()
            .filter(|&i| i < len)
            .collect();
        if selected.is_empty() {
            let all: Vec<usize> = (0..len).collect();
            self.glyph.render(ctx, &all, &data, &geometry, &visuals);
            return Ok(());
        }

        let unselected: Vec<usize> = (0..len)
            .filter(|i| !source.selected.contains(*i))
            .collect();
        let nonselection = match &self.nonselection_visuals {
            Some(v) => v.resolve(source)?,
            None => visuals.clone().with_alpha_scale(NONSELECTION_ALPHA),
        };
        let selection = match &self.selection_visuals {
            Some(v) => v.resolve(source)?,
            None => visuals,
        };
        self.glyph
            .render(ctx, &unselected, &data, &geometry, &nonselection);
        self.glyph
            .render(ctx, &selected, &data, &geometry, &selection);
        Ok(())
    }

    /// Draws a miniature of row `index` into `bbox` through the glyph's render path.
    pub fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        source: &ColumnDataSource,
        mapping: &CoordinateMapping,
        bbox: &BBox,
        index: usize,
    ) -> Result<()> {
        let data = self.data(source)?;
        let Some(geometry) = self.geometry(&data, mapping) else {
            return Ok(());
        };
        let visuals = self.visuals.resolve(source)?;
        self.glyph
            .legend(ctx, bbox, index, &data, &geometry, &visuals);
        Ok(())
    }

    pub fn bounds(&self, source: &ColumnDataSource) -> Result<Option<Bounds>> {
        let data = self.data(source)?;
        Ok(self.glyph.bounds(&data))
    }

    /// Screen anchor (center) of row `index`; `None` for glyphs without one.
    pub fn anchor(
        &self,
        source: &ColumnDataSource,
        mapping: &CoordinateMapping,
        index: usize,
    ) -> Result<Option<(f64, f64)>> {
        let data = self.data(source)?;
        Ok(self
            .geometry(&data, mapping)
            .and_then(|geometry| self.glyph.anchor(index, &data, &geometry)))
    }

    /// Resolved normal visuals, for callers drawing alongside the glyph.
    pub fn resolved_visuals(&self, source: &ColumnDataSource) -> Result<ResolvedVisuals> {
        self.visuals.resolve(source)
    }
}
