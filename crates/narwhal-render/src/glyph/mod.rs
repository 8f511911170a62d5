//! Glyph views.
//!
//! Every glyph implements [`GlyphView`]: read its data-space arrays from a source
//! (`set_data`), map them to screen space (`map_data`), and draw, hit-test, or summarize the
//! mapped rows. Screen geometry is returned by value and passed back explicitly; glyphs hold
//! no per-frame state. [`Glyph`] is the closed set of glyphs a renderer dispatches over.

pub mod ellipse;
pub mod multi_line;
pub mod rect;
pub mod text;

pub use ellipse::Ellipse;
pub use multi_line::MultiLine;
pub use rect::Rect;
pub use text::Text;

use crate::Result;
use crate::context::RenderContext;
use crate::hittest::{HitGeometry, SpanDirection, to_local};
use crate::spatial::{Bounds, IndexEntry};
use crate::visuals::{DistanceSpec, ResolvedVisuals, SpatialUnits, Spec};
use narwhal_core::{BBox, ColumnDataSource, CoordinateMapping, Scale, Selection};

pub trait GlyphView {
    type Data;
    type Geometry;

    fn set_data(&self, source: &ColumnDataSource) -> Result<Self::Data>;

    fn map_data(&self, data: &Self::Data, mapping: &CoordinateMapping) -> Self::Geometry;

    /// Draws the rows in `indices`; rows with non-finite geometry are skipped.
    fn render(
        &self,
        ctx: &mut dyn RenderContext,
        indices: &[usize],
        data: &Self::Data,
        geometry: &Self::Geometry,
        visuals: &ResolvedVisuals,
    );

    /// Tests the rows in `candidates` (ascending) against `hit`.
    fn hit_test(
        &self,
        hit: &HitGeometry,
        candidates: &[usize],
        data: &Self::Data,
        geometry: &Self::Geometry,
        visuals: &ResolvedVisuals,
    ) -> Selection;

    /// Draws a miniature of row `index` fitted into `bbox`, through `render`.
    fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &Self::Data,
        geometry: &Self::Geometry,
        visuals: &ResolvedVisuals,
    );

    /// Data-space extent of every finite row, padded by the largest data-unit half-extent.
    fn bounds(&self, data: &Self::Data) -> Option<Bounds>;

    /// Per-row data-space extents for the spatial index.
    fn index_entries(&self, data: &Self::Data) -> Vec<IndexEntry>;

    /// Largest screen-unit half-extent, added to index queries.
    fn screen_padding(
        &self,
        data: &Self::Data,
        geometry: &Self::Geometry,
        visuals: &ResolvedVisuals,
    ) -> f64;

    /// Screen anchor of row `index` (its center), if the glyph has one.
    fn anchor(&self, index: usize, geometry: &Self::Geometry) -> Option<(f64, f64)>;
}

/// Data-space arrays of ellipse and rect glyphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub width: Vec<f64>,
    pub height: Vec<f64>,
    pub angle: Vec<f64>,
    /// Largest half width/height in data units; 0 for screen-unit dimensions.
    pub max_half_width: f64,
    pub max_half_height: f64,
}

/// Screen-space arrays of ellipse and rect glyphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointGeometry {
    pub sx: Vec<f64>,
    pub sy: Vec<f64>,
    pub sw: Vec<f64>,
    pub sh: Vec<f64>,
    pub angle: Vec<f64>,
}

impl PointGeometry {
    pub fn len(&self) -> usize {
        self.sx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sx.is_empty()
    }

    fn renderable(&self, i: usize) -> bool {
        [&self.sx, &self.sy, &self.sw, &self.sh, &self.angle]
            .iter()
            .all(|v| v.get(i).is_some_and(|x| x.is_finite()))
    }

    /// One-row geometry centered in `bbox`.
    fn legend(bbox: &BBox, sw: f64, sh: f64) -> Self {
        Self {
            sx: vec![bbox.hcenter()],
            sy: vec![bbox.vcenter()],
            sw: vec![sw],
            sh: vec![sh],
            angle: vec![0.0],
        }
    }
}

pub use multi_line::{LinesData, LinesGeometry};
pub use text::{TextData, TextGeometry};

/// Reads the x/y/width/height/angle arrays shared by ellipse and rect.
fn point_data(
    source: &ColumnDataSource,
    x: &Spec<f64>,
    y: &Spec<f64>,
    width: &DistanceSpec,
    height: &DistanceSpec,
    angle: &Spec<f64>,
) -> Result<PointData> {
    let len = source.len();
    let width_values = width.resolve(source)?;
    let height_values = height.resolve(source)?;
    let half = |units: SpatialUnits, max: f64| match units {
        SpatialUnits::Data => max / 2.0,
        SpatialUnits::Screen => 0.0,
    };
    Ok(PointData {
        x: x.resolve(source)?.to_vec(len),
        y: y.resolve(source)?.to_vec(len),
        width: width_values.to_vec(len),
        height: height_values.to_vec(len),
        angle: angle.resolve(source)?.to_vec(len),
        max_half_width: half(width.units, width_values.max()),
        max_half_height: half(height.units, height_values.max()),
    })
}

/// Screen extent of a dimension centered on `centers`: data units are scaled through `scale`
/// as `|scale(x + w/2) - scale(x - w/2)|`, screen units pass through.
pub fn map_distance(
    scale: &Scale,
    centers: &[f64],
    sizes: &[f64],
    units: SpatialUnits,
) -> Vec<f64> {
    match units {
        SpatialUnits::Screen => sizes.to_vec(),
        SpatialUnits::Data => centers
            .iter()
            .zip(sizes)
            .map(|(c, s)| (scale.compute(c + s / 2.0) - scale.compute(c - s / 2.0)).abs())
            .collect(),
    }
}

fn map_point_data(
    data: &PointData,
    mapping: &CoordinateMapping,
    width_units: SpatialUnits,
    height_units: SpatialUnits,
) -> PointGeometry {
    PointGeometry {
        sx: mapping.x_scale.v_compute(&data.x),
        sy: mapping.y_scale.v_compute(&data.y),
        sw: map_distance(&mapping.x_scale, &data.x, &data.width, width_units),
        sh: map_distance(&mapping.y_scale, &data.y, &data.height, height_units),
        angle: data.angle.clone(),
    }
}

fn point_bounds(data: &PointData) -> Option<Bounds> {
    let points = data
        .x
        .iter()
        .zip(&data.y)
        .map(|(x, y)| Bounds::point(*x, *y));
    Bounds::union_all(points).map(|b| b.padded(data.max_half_width, data.max_half_height))
}

/// Index extents of rotated boxes: a data-unit row is padded by its half diagonal.
fn point_entries(
    data: &PointData,
    width_units: SpatialUnits,
    height_units: SpatialUnits,
) -> Vec<IndexEntry> {
    (0..data.x.len())
        .map(|i| {
            let hw = match width_units {
                SpatialUnits::Data => data.width.get(i).copied().unwrap_or(f64::NAN) / 2.0,
                SpatialUnits::Screen => 0.0,
            };
            let hh = match height_units {
                SpatialUnits::Data => data.height.get(i).copied().unwrap_or(f64::NAN) / 2.0,
                SpatialUnits::Screen => 0.0,
            };
            let r = hw.hypot(hh);
            IndexEntry {
                index: i,
                bounds: Bounds::point(data.x[i], data.y[i]).padded(r, r),
            }
        })
        .collect()
}

fn point_screen_padding(geometry: &PointGeometry, units: (SpatialUnits, SpatialUnits)) -> f64 {
    if units == (SpatialUnits::Data, SpatialUnits::Data) {
        return 0.0;
    }
    (0..geometry.len())
        .filter(|i| geometry.renderable(*i))
        .map(|i| (geometry.sw[i] / 2.0).hypot(geometry.sh[i] / 2.0))
        .fold(0.0, f64::max)
}

/// Point-glyph hit-testing. `contains(lx, ly, hw, hh)` decides point hits in the row's local
/// (unrotated, centered) frame.
fn hit_point_glyph(
    hit: &HitGeometry,
    candidates: &[usize],
    geometry: &PointGeometry,
    contains: impl Fn(f64, f64, f64, f64) -> bool,
) -> Selection {
    let hits = candidates.iter().copied().filter(|&i| {
        if !geometry.renderable(i) {
            return false;
        }
        let (cx, cy) = (geometry.sx[i], geometry.sy[i]);
        let (hw, hh) = (geometry.sw[i] / 2.0, geometry.sh[i] / 2.0);
        match *hit {
            HitGeometry::Point { sx, sy } => {
                let (lx, ly) = to_local(sx, sy, cx, cy, geometry.angle[i]);
                contains(lx, ly, hw, hh)
            }
            HitGeometry::Span {
                direction: SpanDirection::H,
                sx,
                ..
            } => (sx - cx).abs() <= hw,
            HitGeometry::Span {
                direction: SpanDirection::V,
                sy,
                ..
            } => (sy - cy).abs() <= hh,
            HitGeometry::Rect { .. } => rect_contains(hit, cx, cy),
        }
    });
    Selection::from_indices(hits)
}

fn rect_contains(hit: &HitGeometry, x: f64, y: f64) -> bool {
    let q = hit.query_box(0.0);
    q.contains(x, y)
}

/// The closed set of glyph kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Glyph {
    Ellipse(Ellipse),
    Rect(Rect),
    Text(Text),
    MultiLine(MultiLine),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphData {
    Point(PointData),
    Text(TextData),
    Lines(LinesData),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenGeometry {
    Point(PointGeometry),
    Text(TextGeometry),
    Lines(LinesGeometry),
}

macro_rules! dispatch_data {
    ($glyph:expr, $data:expr, |$g:ident, $d:ident| $body:expr) => {
        match ($glyph, $data) {
            (Glyph::Ellipse($g), GlyphData::Point($d)) => Some($body),
            (Glyph::Rect($g), GlyphData::Point($d)) => Some($body),
            (Glyph::Text($g), GlyphData::Text($d)) => Some($body),
            (Glyph::MultiLine($g), GlyphData::Lines($d)) => Some($body),
            _ => None,
        }
    };
}

macro_rules! dispatch_all {
    ($glyph:expr, $data:expr, $geometry:expr, |$g:ident, $d:ident, $s:ident| $body:expr) => {
        match ($glyph, $data, $geometry) {
            (Glyph::Ellipse($g), GlyphData::Point($d), ScreenGeometry::Point($s)) => Some($body),
            (Glyph::Rect($g), GlyphData::Point($d), ScreenGeometry::Point($s)) => Some($body),
            (Glyph::Text($g), GlyphData::Text($d), ScreenGeometry::Text($s)) => Some($body),
            (Glyph::MultiLine($g), GlyphData::Lines($d), ScreenGeometry::Lines($s)) => {
                Some($body)
            }
            _ => None,
        }
    };
}

fn mismatch(glyph: &Glyph) {
    tracing::warn!(glyph = glyph.type_name(), "glyph data does not match glyph kind");
}

impl Glyph {
    pub fn type_name(&self) -> &'static str {
        match self {
            Glyph::Ellipse(_) => "Ellipse",
            Glyph::Rect(_) => "Rect",
            Glyph::Text(_) => "Text",
            Glyph::MultiLine(_) => "MultiLine",
        }
    }

    /// Column names of the x/y coordinates when both are field references (`xs`/`ys` for
    /// multi-line).
    pub fn coordinate_fields(&self) -> Option<(&str, &str)> {
        match self {
            Glyph::Ellipse(g) => fields(&g.x, &g.y),
            Glyph::Rect(g) => fields(&g.x, &g.y),
            Glyph::Text(g) => fields(&g.x, &g.y),
            Glyph::MultiLine(g) => fields(&g.xs, &g.ys),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Glyph::MultiLine(_))
    }

    pub fn set_data(&self, source: &ColumnDataSource) -> Result<GlyphData> {
        Ok(match self {
            Glyph::Ellipse(g) => GlyphData::Point(g.set_data(source)?),
            Glyph::Rect(g) => GlyphData::Point(g.set_data(source)?),
            Glyph::Text(g) => GlyphData::Text(g.set_data(source)?),
            Glyph::MultiLine(g) => GlyphData::Lines(g.set_data(source)?),
        })
    }

    pub fn map_data(
        &self,
        data: &GlyphData,
        mapping: &CoordinateMapping,
    ) -> Option<ScreenGeometry> {
        let out = match (self, data) {
            (Glyph::Ellipse(g), GlyphData::Point(d)) => {
                Some(ScreenGeometry::Point(g.map_data(d, mapping)))
            }
            (Glyph::Rect(g), GlyphData::Point(d)) => {
                Some(ScreenGeometry::Point(g.map_data(d, mapping)))
            }
            (Glyph::Text(g), GlyphData::Text(d)) => {
                Some(ScreenGeometry::Text(g.map_data(d, mapping)))
            }
            (Glyph::MultiLine(g), GlyphData::Lines(d)) => {
                Some(ScreenGeometry::Lines(g.map_data(d, mapping)))
            }
            _ => None,
        };
        if out.is_none() {
            mismatch(self);
        }
        out
    }

    pub fn render(
        &self,
        ctx: &mut dyn RenderContext,
        indices: &[usize],
        data: &GlyphData,
        geometry: &ScreenGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let drawn = dispatch_all!(self, data, geometry, |g, d, s| g
            .render(ctx, indices, d, s, visuals));
        if drawn.is_none() {
            mismatch(self);
        }
    }

    pub fn hit_test(
        &self,
        hit: &HitGeometry,
        candidates: &[usize],
        data: &GlyphData,
        geometry: &ScreenGeometry,
        visuals: &ResolvedVisuals,
    ) -> Selection {
        dispatch_all!(self, data, geometry, |g, d, s| g
            .hit_test(hit, candidates, d, s, visuals))
        .unwrap_or_else(|| {
            mismatch(self);
            Selection::default()
        })
    }

    pub fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &GlyphData,
        geometry: &ScreenGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let drawn = dispatch_all!(self, data, geometry, |g, d, s| g
            .legend(ctx, bbox, index, d, s, visuals));
        if drawn.is_none() {
            mismatch(self);
        }
    }

    pub fn bounds(&self, data: &GlyphData) -> Option<Bounds> {
        dispatch_data!(self, data, |g, d| g.bounds(d)).flatten()
    }

    pub fn index_entries(&self, data: &GlyphData) -> Vec<IndexEntry> {
        dispatch_data!(self, data, |g, d| g.index_entries(d)).unwrap_or_default()
    }

    pub fn screen_padding(
        &self,
        data: &GlyphData,
        geometry: &ScreenGeometry,
        visuals: &ResolvedVisuals,
    ) -> f64 {
        let padding = dispatch_all!(self, data, geometry, |g, d, s| {
            g.screen_padding(d, s, visuals)
        });
        padding.unwrap_or(0.0)
    }

    pub fn anchor(
        &self,
        index: usize,
        data: &GlyphData,
        geometry: &ScreenGeometry,
    ) -> Option<(f64, f64)> {
        dispatch_all!(self, data, geometry, |g, _d, s| g.anchor(index, s)).flatten()
    }
}

fn fields<'a, T>(x: &'a Spec<T>, y: &'a Spec<T>) -> Option<(&'a str, &'a str)> {
    match (x, y) {
        (Spec::Field(x), Spec::Field(y)) => Some((x.as_str(), y.as_str())),
        _ => None,
    }
}
