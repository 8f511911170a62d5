//! Plot scenes: a laid-out canvas, the axis ranges, the data sources and their renderers.
//!
//! A [`Plot`] owns every data source. Renderers refer to their source by name and are addressed
//! by [`RendererId`]; callers that mutate data (edit tools) receive `&mut Plot`, so a source has
//! exactly one writer at a time.

use crate::context::{FillStyle, LineStyle, RenderContext, TextAlign, TextAttrs, TextBaseline};
use crate::hittest::HitGeometry;
use crate::registry::GlyphRegistry;
use crate::renderer::{GlyphRenderer, RendererId};
use crate::selection_manager;
use crate::spatial::Bounds;
use crate::svg::SvgContext;
use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
use crate::visuals::Visuals;
use crate::{Error, Result};
use beluga::{Borders, Canvas};
use indexmap::IndexMap;
use narwhal_core::{
    BBox, ColumnData, ColumnDataSource, CoordinateMapping, DataPoint, Range1d, ScaleKind,
    Selection, SelectionMode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct Plot {
    canvas: Canvas,
    pub x_range: Range1d,
    pub y_range: Range1d,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
    pub background: Option<String>,
    pub legend: Option<Legend>,
    sources: IndexMap<String, ColumnDataSource>,
    renderers: Vec<GlyphRenderer>,
}

impl Plot {
    pub fn new(width: f64, height: f64, borders: Borders) -> Result<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height, borders)?,
            x_range: Range1d::new(0.0, 1.0),
            y_range: Range1d::new(0.0, 1.0),
            x_scale: ScaleKind::Linear,
            y_scale: ScaleKind::Linear,
            background: None,
            legend: None,
            sources: IndexMap::new(),
            renderers: Vec::new(),
        })
    }

    pub fn from_json(text: &str, registry: &GlyphRegistry) -> Result<Self> {
        let spec: PlotSpec = serde_json::from_str(text)?;
        Self::from_spec(spec, registry)
    }

    pub fn from_spec(spec: PlotSpec, registry: &GlyphRegistry) -> Result<Self> {
        let mut plot = Self::new(spec.width, spec.height, Borders::uniform(spec.border))?;
        plot.x_scale = spec.x_scale;
        plot.y_scale = spec.y_scale;
        plot.background = spec.background;

        for (name, data) in spec.sources {
            let source = ColumnDataSource::from_data(data);
            source.validate()?;
            plot.add_source(name, source);
        }
        for (i, r) in spec.renderers.into_iter().enumerate() {
            let glyph = registry.build(&r.glyph)?;
            let name = r
                .name
                .unwrap_or_else(|| format!("{}{i}", glyph.type_name().to_lowercase()));
            let mut renderer = GlyphRenderer::new(name, r.source, glyph, r.visuals);
            renderer.selection_visuals = r.selection_visuals;
            renderer.nonselection_visuals = r.nonselection_visuals;
            renderer.visible = r.visible;
            plot.add_renderer(renderer)?;
        }

        let auto_x = match spec.x_range {
            RangeSpec::Fixed(range) => {
                plot.x_range = range;
                false
            }
            RangeSpec::Auto(_) => true,
        };
        let auto_y = match spec.y_range {
            RangeSpec::Fixed(range) => {
                plot.y_range = range;
                false
            }
            RangeSpec::Auto(_) => true,
        };
        if auto_x || auto_y {
            match plot.auto_range(auto_x, auto_y, spec.range_padding) {
                // Nothing drawn yet (an empty scene for edit tools): keep the unit range.
                Err(Error::EmptyBounds { axis }) => {
                    tracing::warn!(axis, "no finite bounds to auto-range from");
                }
                other => other?,
            }
        }

        if let Some(legend) = spec.legend {
            for entry in &legend.entries {
                plot.renderer(entry.renderer)?;
            }
            plot.legend = Some(legend);
        }
        Ok(plot)
    }

    /// Adds (or replaces) a named source; renderers already pointing at `name` re-attach.
    pub fn add_source(&mut self, name: impl Into<String>, mut source: ColumnDataSource) {
        let name = name.into();
        for renderer in self.renderers.iter_mut().filter(|r| r.source == name) {
            renderer.attach(&mut source);
        }
        self.sources.insert(name, source);
    }

    pub fn add_renderer(&mut self, mut renderer: GlyphRenderer) -> Result<RendererId> {
        let source = self
            .sources
            .get_mut(&renderer.source)
            .ok_or_else(|| Error::UnknownSource {
                name: renderer.source.clone(),
            })?;
        renderer.attach(source);
        self.renderers.push(renderer);
        Ok(self.renderers.len() - 1)
    }

    pub fn source(&self, name: &str) -> Result<&ColumnDataSource> {
        self.sources.get(name).ok_or_else(|| Error::UnknownSource {
            name: name.to_string(),
        })
    }

    pub fn source_mut(&mut self, name: &str) -> Result<&mut ColumnDataSource> {
        self.sources.get_mut(name).ok_or_else(|| Error::UnknownSource {
            name: name.to_string(),
        })
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &ColumnDataSource)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Column data of every source, keyed by source name.
    pub fn source_data(&self) -> IndexMap<String, ColumnData> {
        self.sources
            .iter()
            .map(|(k, v)| (k.clone(), v.data().clone()))
            .collect()
    }

    pub fn renderer(&self, id: RendererId) -> Result<&GlyphRenderer> {
        self.renderers
            .get(id)
            .ok_or(Error::UnknownRenderer { index: id })
    }

    pub fn renderer_mut(&mut self, id: RendererId) -> Result<&mut GlyphRenderer> {
        self.renderers
            .get_mut(id)
            .ok_or(Error::UnknownRenderer { index: id })
    }

    pub fn renderers(&self) -> &[GlyphRenderer] {
        &self.renderers
    }

    /// The source of renderer `id`.
    pub fn renderer_source(&self, id: RendererId) -> Result<&ColumnDataSource> {
        self.source(&self.renderer(id)?.source)
    }

    pub fn renderer_source_mut(&mut self, id: RendererId) -> Result<&mut ColumnDataSource> {
        let name = self.renderer(id)?.source.clone();
        self.source_mut(&name)
    }

    pub fn renderer_and_source_mut(
        &mut self,
        id: RendererId,
    ) -> Result<(&mut GlyphRenderer, &mut ColumnDataSource)> {
        let renderer = self
            .renderers
            .get_mut(id)
            .ok_or(Error::UnknownRenderer { index: id })?;
        let source = self
            .sources
            .get_mut(&renderer.source)
            .ok_or_else(|| Error::UnknownSource {
                name: renderer.source.clone(),
            })?;
        Ok((renderer, source))
    }

    pub fn size(&self) -> (f64, f64) {
        self.canvas.size()
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.canvas.set_size(width, height)?;
        self.canvas.solve()?;
        Ok(())
    }

    pub fn frame_bbox(&self) -> BBox {
        let (left, top, right, bottom) = self.canvas.frame_geometry().bbox();
        BBox::new(left, top, right, bottom)
    }

    pub fn mapping(&self) -> Result<CoordinateMapping> {
        Ok(CoordinateMapping::new(
            &self.x_scale,
            self.x_range,
            &self.y_scale,
            self.y_range,
            &self.frame_bbox(),
        )?)
    }

    /// Data point under a screen position, or `None` outside the frame.
    pub fn screen_to_data(&self, sx: f64, sy: f64) -> Result<Option<DataPoint>> {
        if !self.frame_bbox().contains(sx, sy) {
            return Ok(None);
        }
        Ok(Some(self.mapping()?.map_from_screen(sx, sy)))
    }

    /// Fits the selected axes to the union of the visible renderers' bounds, widened by
    /// `padding` (a fraction of the span) on each side.
    pub fn auto_range(&mut self, x: bool, y: bool, padding: f64) -> Result<()> {
        let mut all = Vec::new();
        for renderer in self.renderers.iter().filter(|r| r.visible) {
            let source = self.source(&renderer.source)?;
            all.extend(renderer.bounds(source)?);
        }
        let Some(bounds) = Bounds::union_all(all) else {
            return Err(Error::EmptyBounds {
                axis: if x { "x" } else { "y" },
            });
        };
        if x {
            self.x_range = Range1d::new(bounds.x0, bounds.x1).padded(padding);
        }
        if y {
            self.y_range = Range1d::new(bounds.y0, bounds.y1).padded(padding);
        }
        tracing::debug!(
            x0 = self.x_range.start,
            x1 = self.x_range.end,
            y0 = self.y_range.start,
            y1 = self.y_range.end,
            "auto-ranged"
        );
        Ok(())
    }

    pub fn hit_test(&mut self, id: RendererId, hit: &HitGeometry) -> Result<Selection> {
        let mapping = self.mapping()?;
        let (renderer, source) = self.renderer_and_source_mut(id)?;
        renderer.hit_test(source, hit, &mapping)
    }

    pub fn select(
        &mut self,
        id: RendererId,
        hit: &HitGeometry,
        mode: SelectionMode,
    ) -> Result<bool> {
        let mapping = self.mapping()?;
        let (renderer, source) = self.renderer_and_source_mut(id)?;
        selection_manager::select(renderer, source, hit, &mapping, mode)
    }

    pub fn inspect(&mut self, id: RendererId, hit: &HitGeometry) -> Result<Selection> {
        let mapping = self.mapping()?;
        let (renderer, source) = self.renderer_and_source_mut(id)?;
        selection_manager::inspect(renderer, source, hit, &mapping)
    }

    pub fn clear_selection(&mut self, source: &str) -> Result<()> {
        selection_manager::clear(self.source_mut(source)?);
        Ok(())
    }

    /// Draws every renderer in insertion order, then the legend.
    pub fn render(&self, ctx: &mut dyn RenderContext) -> Result<()> {
        let mapping = self.mapping()?;
        for renderer in &self.renderers {
            let source = self.source(&renderer.source)?;
            renderer.render(ctx, source, &mapping)?;
        }
        if let Some(legend) = &self.legend {
            self.render_legend(ctx, legend, &mapping)?;
        }
        Ok(())
    }

    pub fn render_svg(&self) -> Result<String> {
        let (width, height) = self.size();
        let mut ctx = SvgContext::new(width, height);
        if let Some(color) = &self.background {
            ctx.background(color);
        }
        self.render(&mut ctx)?;
        Ok(ctx.finish())
    }

    fn render_legend(
        &self,
        ctx: &mut dyn RenderContext,
        legend: &Legend,
        mapping: &CoordinateMapping,
    ) -> Result<()> {
        if legend.entries.is_empty() {
            return Ok(());
        }
        let attrs = TextAttrs {
            baseline: TextBaseline::Middle,
            align: TextAlign::Left,
            ..TextAttrs::default()
        };
        let style = TextStyle {
            font_family: Some(attrs.font.clone()),
            font_size: attrs.font_size,
            font_weight: None,
        };
        let measurer = DeterministicTextMeasurer::default();
        let label_width = legend
            .entries
            .iter()
            .map(|e| measurer.measure(&e.label, &style).width)
            .fold(0.0, f64::max);

        let n = legend.entries.len() as f64;
        let width = 2.0 * LEGEND_PADDING + LEGEND_GLYPH + LEGEND_LABEL_GAP + label_width;
        let height = 2.0 * LEGEND_PADDING + n * LEGEND_GLYPH + (n - 1.0) * LEGEND_SPACING;
        let frame = self.frame_bbox();
        let (x, y) = match legend.location {
            LegendLocation::TopLeft => (frame.left + LEGEND_MARGIN, frame.top + LEGEND_MARGIN),
            LegendLocation::TopRight => (
                frame.right - LEGEND_MARGIN - width,
                frame.top + LEGEND_MARGIN,
            ),
            LegendLocation::BottomLeft => (
                frame.left + LEGEND_MARGIN,
                frame.bottom - LEGEND_MARGIN - height,
            ),
            LegendLocation::BottomRight => (
                frame.right - LEGEND_MARGIN - width,
                frame.bottom - LEGEND_MARGIN - height,
            ),
        };

        ctx.begin_path();
        ctx.rect(x, y, width, height);
        ctx.set_fill(&FillStyle {
            color: "white".to_string(),
            alpha: 0.95,
        });
        ctx.fill();
        ctx.set_line(&LineStyle {
            color: "#e5e5e5".to_string(),
            alpha: 1.0,
            width: 1.0,
            dash: Vec::new(),
        });
        ctx.stroke();

        for (i, entry) in legend.entries.iter().enumerate() {
            let top = y + LEGEND_PADDING + i as f64 * (LEGEND_GLYPH + LEGEND_SPACING);
            let left = x + LEGEND_PADDING;
            let Ok(renderer) = self.renderer(entry.renderer) else {
                tracing::warn!(renderer = entry.renderer, "legend entry names an unknown renderer");
                continue;
            };
            let source = self.source(&renderer.source)?;
            let bbox = BBox::new(left, top, left + LEGEND_GLYPH, top + LEGEND_GLYPH);
            renderer.legend(ctx, source, mapping, &bbox, entry.index)?;

            ctx.set_text(&attrs);
            ctx.fill_text(
                &entry.label,
                left + LEGEND_GLYPH + LEGEND_LABEL_GAP,
                top + LEGEND_GLYPH / 2.0,
            );
        }
        Ok(())
    }
}

const LEGEND_MARGIN: f64 = 10.0;
const LEGEND_PADDING: f64 = 8.0;
const LEGEND_GLYPH: f64 = 20.0;
const LEGEND_SPACING: f64 = 4.0;
const LEGEND_LABEL_GAP: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendLocation {
    #[default]
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub renderer: RendererId,
    /// Row whose visuals the swatch uses.
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Legend {
    pub location: LegendLocation,
    pub entries: Vec<LegendEntry>,
}

/// `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Auto {
    Auto,
}

/// A fixed `{"start", "end"}` range or `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Fixed(Range1d),
    Auto(Auto),
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::Auto(Auto::Auto)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RendererSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub source: String,
    /// `{"type": "<glyph tag>", ...}`, resolved through a [`GlyphRegistry`].
    pub glyph: serde_json::Value,
    #[serde(default)]
    pub visuals: Visuals,
    #[serde(default)]
    pub selection_visuals: Option<Visuals>,
    #[serde(default)]
    pub nonselection_visuals: Option<Visuals>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// JSON scene file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotSpec {
    pub width: f64,
    pub height: f64,
    /// Minimum distance between the canvas edge and the frame, in pixels.
    pub border: f64,
    pub x_range: RangeSpec,
    pub y_range: RangeSpec,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
    pub range_padding: f64,
    pub background: Option<String>,
    pub sources: IndexMap<String, ColumnData>,
    pub renderers: Vec<RendererSpec>,
    pub legend: Option<Legend>,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            border: Borders::default().left,
            x_range: RangeSpec::default(),
            y_range: RangeSpec::default(),
            x_scale: ScaleKind::Linear,
            y_scale: ScaleKind::Linear,
            range_padding: 0.1,
            background: Some("white".to_string()),
            sources: IndexMap::new(),
            renderers: Vec::new(),
            legend: None,
        }
    }
}
