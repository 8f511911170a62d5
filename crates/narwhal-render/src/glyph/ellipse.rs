use super::{
    GlyphView, PointData, PointGeometry, hit_point_glyph, map_point_data, point_bounds,
    point_data, point_entries, point_screen_padding,
};
use crate::Result;
use crate::context::RenderContext;
use crate::hittest::HitGeometry;
use crate::spatial::{Bounds, IndexEntry};
use crate::visuals::{DistanceSpec, ResolvedVisuals, Spec};
use narwhal_core::{BBox, ColumnDataSource, CoordinateMapping, Selection};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ellipse {
    pub x: Spec<f64>,
    pub y: Spec<f64>,
    pub width: DistanceSpec,
    pub height: DistanceSpec,
    #[serde(default = "zero_angle")]
    pub angle: Spec<f64>,
}

fn zero_angle() -> Spec<f64> {
    Spec::Value(0.0)
}

impl Ellipse {
    pub fn new(x: Spec<f64>, y: Spec<f64>, width: DistanceSpec, height: DistanceSpec) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle: zero_angle(),
        }
    }
}

impl GlyphView for Ellipse {
    type Data = PointData;
    type Geometry = PointGeometry;

    fn set_data(&self, source: &ColumnDataSource) -> Result<PointData> {
        point_data(
            source,
            &self.x,
            &self.y,
            &self.width,
            &self.height,
            &self.angle,
        )
    }

    fn map_data(&self, data: &PointData, mapping: &CoordinateMapping) -> PointGeometry {
        map_point_data(data, mapping, self.width.units, self.height.units)
    }

    fn render(
        &self,
        ctx: &mut dyn RenderContext,
        indices: &[usize],
        _data: &PointData,
        g: &PointGeometry,
        visuals: &ResolvedVisuals,
    ) {
        for &i in indices {
            if !g.renderable(i) {
                continue;
            }
            ctx.begin_path();
            ctx.ellipse(g.sx[i], g.sy[i], g.sw[i] / 2.0, g.sh[i] / 2.0, g.angle[i]);
            if let Some(fill) = visuals.fill(i) {
                ctx.set_fill(&fill);
                ctx.fill();
            }
            if let Some(line) = visuals.line(i) {
                ctx.set_line(&line);
                ctx.stroke();
            }
        }
    }

    fn hit_test(
        &self,
        hit: &HitGeometry,
        candidates: &[usize],
        _data: &PointData,
        geometry: &PointGeometry,
        _visuals: &ResolvedVisuals,
    ) -> Selection {
        hit_point_glyph(hit, candidates, geometry, |lx, ly, hw, hh| {
            hw > 0.0 && hh > 0.0 && (lx / hw).powi(2) + (ly / hh).powi(2) <= 1.0
        })
    }

    /// A circle-ish miniature keeping the row's aspect ratio, 80% of the smaller bbox side.
    fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &PointData,
        g: &PointGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let (w, h) = (
            g.sw.get(index).copied().unwrap_or(1.0),
            g.sh.get(index).copied().unwrap_or(1.0),
        );
        let scale = if w.is_finite() && h.is_finite() && h > 0.0 {
            w / h
        } else {
            1.0
        };
        let d = bbox.width().abs().min(bbox.height().abs()) * 0.8;
        let (sw, sh) = if scale > 1.0 {
            (d, d / scale)
        } else {
            (d * scale, d)
        };
        let row = PointGeometry::legend(bbox, sw, sh);
        self.render(ctx, &[0], data, &row, &visuals.single_row(index));
    }

    fn bounds(&self, data: &PointData) -> Option<Bounds> {
        point_bounds(data)
    }

    fn index_entries(&self, data: &PointData) -> Vec<IndexEntry> {
        point_entries(data, self.width.units, self.height.units)
    }

    fn screen_padding(
        &self,
        _data: &PointData,
        geometry: &PointGeometry,
        _visuals: &ResolvedVisuals,
    ) -> f64 {
        point_screen_padding(geometry, (self.width.units, self.height.units))
    }

    fn anchor(&self, index: usize, geometry: &PointGeometry) -> Option<(f64, f64)> {
        geometry
            .renderable(index)
            .then(|| (geometry.sx[index], geometry.sy[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawOp, RecordingContext};
    use crate::visuals::Visuals;
    use narwhal_core::{Column, Range1d, ScaleKind};

    fn mapping() -> CoordinateMapping {
        // 10 px per data unit, y flipped.
        CoordinateMapping::new(
            &ScaleKind::Linear,
            Range1d::new(0.0, 10.0),
            &ScaleKind::Linear,
            Range1d::new(0.0, 10.0),
            &BBox::new(0.0, 0.0, 100.0, 100.0),
        )
        .unwrap()
    }

    fn source() -> ColumnDataSource {
        ColumnDataSource::from_columns([
            ("x", Column::Number(vec![2.0, f64::NAN, 8.0])),
            ("y", Column::Number(vec![2.0, 5.0, 8.0])),
        ])
    }

    fn glyph() -> Ellipse {
        Ellipse::new(
            Spec::field("x"),
            Spec::field("y"),
            DistanceSpec::data(2.0),
            DistanceSpec::screen(10.0),
        )
    }

    #[test]
    fn maps_data_and_screen_units_and_skips_nan_rows() {
        let source = source();
        let glyph = glyph();
        let data = glyph.set_data(&source).unwrap();
        let g = glyph.map_data(&data, &mapping());
        assert_eq!(g.sx[0], 20.0);
        assert_eq!(g.sy[0], 80.0);
        assert_eq!(g.sw[0], 20.0);
        assert_eq!(g.sh[0], 10.0);
        assert_eq!(data.max_half_width, 1.0);
        assert_eq!(data.max_half_height, 0.0);

        let visuals = Visuals::default().resolve(&source).unwrap();
        let mut ctx = RecordingContext::new();
        glyph.render(&mut ctx, &[0, 1, 2], &data, &g, &visuals);
        assert_eq!(ctx.count(|op| matches!(op, DrawOp::Ellipse { .. })), 2);
    }

    #[test]
    fn point_hits_use_the_rotated_ellipse() {
        let source = source();
        let glyph = glyph();
        let data = glyph.set_data(&source).unwrap();
        let g = glyph.map_data(&data, &mapping());
        let visuals = Visuals::default().resolve(&source).unwrap();

        let rows = [0, 1, 2];
        let inside = glyph.hit_test(&HitGeometry::point(29.0, 80.0), &rows, &data, &g, &visuals);
        assert_eq!(inside.indices.iter().copied().collect::<Vec<_>>(), vec![0]);
        let outside = glyph.hit_test(&HitGeometry::point(20.0, 87.0), &rows, &data, &g, &visuals);
        assert!(outside.is_empty());

        let bounds = glyph.bounds(&data).unwrap();
        assert_eq!((bounds.x0, bounds.x1), (1.0, 9.0));
        assert_eq!((bounds.y0, bounds.y1), (2.0, 8.0));
    }

    #[test]
    fn legend_keeps_the_aspect_ratio() {
        let source = source();
        let glyph = glyph();
        let data = glyph.set_data(&source).unwrap();
        let g = glyph.map_data(&data, &mapping());
        let visuals = Visuals::default().resolve(&source).unwrap();

        let mut ctx = RecordingContext::new();
        glyph.legend(&mut ctx, &BBox::new(0.0, 0.0, 20.0, 10.0), 0, &data, &g, &visuals);
        let ellipse = ctx
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Ellipse { cx, cy, rx, ry, .. } => Some((*cx, *cy, *rx, *ry)),
                _ => None,
            })
            .unwrap();
        assert_eq!(ellipse, (10.0, 5.0, 4.0, 2.0));
    }
}
