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

/// Axis-aligned (or rotated) rectangles centered on `(x, y)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rect {
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

impl Rect {
    pub fn new(x: Spec<f64>, y: Spec<f64>, width: DistanceSpec, height: DistanceSpec) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle: zero_angle(),
        }
    }

    pub fn with_angle(mut self, angle: Spec<f64>) -> Self {
        self.angle = angle;
        self
    }
}

impl GlyphView for Rect {
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
            let (hw, hh) = (g.sw[i] / 2.0, g.sh[i] / 2.0);
            let rotated = g.angle[i] != 0.0;
            ctx.begin_path();
            if rotated {
                ctx.save();
                ctx.translate(g.sx[i], g.sy[i]);
                ctx.rotate(g.angle[i]);
                ctx.rect(-hw, -hh, g.sw[i], g.sh[i]);
            } else {
                ctx.rect(g.sx[i] - hw, g.sy[i] - hh, g.sw[i], g.sh[i]);
            }
            if let Some(fill) = visuals.fill(i) {
                ctx.set_fill(&fill);
                ctx.fill();
            }
            if let Some(line) = visuals.line(i) {
                ctx.set_line(&line);
                ctx.stroke();
            }
            if rotated {
                ctx.restore();
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
            lx.abs() <= hw && ly.abs() <= hh
        })
    }

    fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &PointData,
        _geometry: &PointGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let row = PointGeometry::legend(bbox, bbox.width().abs() * 0.8, bbox.height().abs() * 0.8);
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
