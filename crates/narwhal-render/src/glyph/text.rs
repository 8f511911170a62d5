use super::GlyphView;
use crate::Result;
use crate::context::{RenderContext, TextAlign, TextBaseline};
use crate::hittest::{HitGeometry, SpanDirection, to_local};
use crate::spatial::{Bounds, IndexEntry};
use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
use crate::visuals::{Resolved, ResolvedVisuals, Spec};
use narwhal_core::{BBox, ColumnDataSource, CoordinateMapping, Selection};
use serde::Deserialize;

/// Text labels anchored at `(x, y)`, optionally rotated and offset in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Text {
    pub x: Spec<f64>,
    pub y: Spec<f64>,
    pub text: Spec<String>,
    #[serde(default = "zero")]
    pub angle: Spec<f64>,
    #[serde(default = "zero")]
    pub x_offset: Spec<f64>,
    #[serde(default = "zero")]
    pub y_offset: Spec<f64>,
}

fn zero() -> Spec<f64> {
    Spec::Value(0.0)
}

impl Text {
    pub fn new(x: Spec<f64>, y: Spec<f64>, text: Spec<String>) -> Self {
        Self {
            x,
            y,
            text,
            angle: zero(),
            x_offset: zero(),
            y_offset: zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub angle: Vec<f64>,
    pub text: Vec<String>,
    pub x_offset: Vec<f64>,
    pub y_offset: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextGeometry {
    pub sx: Vec<f64>,
    pub sy: Vec<f64>,
    pub angle: Vec<f64>,
    pub x_offset: Vec<f64>,
    pub y_offset: Vec<f64>,
}

impl TextGeometry {
    fn renderable(&self, i: usize) -> bool {
        [&self.sx, &self.sy, &self.angle, &self.x_offset, &self.y_offset]
            .iter()
            .all(|v| v.get(i).is_some_and(|x| x.is_finite()))
    }

    /// Rotation origin of row `i`.
    fn origin(&self, i: usize) -> (f64, f64) {
        (self.sx[i] + self.x_offset[i], self.sy[i] + self.y_offset[i])
    }
}

/// Local box `(x0, x1, y0, y1)` of a `width` x `height` label relative to its anchor.
fn text_box(width: f64, height: f64, align: TextAlign, baseline: TextBaseline) -> [f64; 4] {
    let (x0, x1) = match align {
        TextAlign::Left => (0.0, width),
        TextAlign::Center => (-width / 2.0, width / 2.0),
        TextAlign::Right => (-width, 0.0),
    };
    let (y0, y1) = match baseline {
        TextBaseline::Top => (0.0, height),
        TextBaseline::Middle => (-height / 2.0, height / 2.0),
        TextBaseline::Bottom | TextBaseline::Alphabetic => (-height, 0.0),
    };
    [x0, x1, y0, y1]
}

fn measured_box(text: &str, visuals: &ResolvedVisuals, i: usize) -> [f64; 4] {
    let attrs = visuals.text(i);
    let style = TextStyle {
        font_family: Some(attrs.font),
        font_size: attrs.font_size,
        font_weight: None,
    };
    let metrics = DeterministicTextMeasurer::default().measure(text, &style);
    text_box(metrics.width, metrics.height, attrs.align, attrs.baseline)
}

impl GlyphView for Text {
    type Data = TextData;
    type Geometry = TextGeometry;

    fn set_data(&self, source: &ColumnDataSource) -> Result<TextData> {
        let len = source.len();
        let text = match self.text.resolve(source)? {
            Resolved::Const(t) => vec![t; len],
            Resolved::Array(values) => values,
        };
        Ok(TextData {
            x: self.x.resolve(source)?.to_vec(len),
            y: self.y.resolve(source)?.to_vec(len),
            angle: self.angle.resolve(source)?.to_vec(len),
            text,
            x_offset: self.x_offset.resolve(source)?.to_vec(len),
            y_offset: self.y_offset.resolve(source)?.to_vec(len),
        })
    }

    fn map_data(&self, data: &TextData, mapping: &CoordinateMapping) -> TextGeometry {
        let (sx, sy) = mapping.v_map_to_screen(&data.x, &data.y);
        TextGeometry {
            sx,
            sy,
            angle: data.angle.clone(),
            x_offset: data.x_offset.clone(),
            y_offset: data.y_offset.clone(),
        }
    }

    fn render(
        &self,
        ctx: &mut dyn RenderContext,
        indices: &[usize],
        data: &TextData,
        g: &TextGeometry,
        visuals: &ResolvedVisuals,
    ) {
        for &i in indices {
            let Some(text) = data.text.get(i) else {
                continue;
            };
            if !g.renderable(i) {
                continue;
            }
            let (ox, oy) = g.origin(i);
            ctx.save();
            ctx.translate(ox, oy);
            ctx.rotate(g.angle[i]);
            ctx.set_text(&visuals.text(i));
            ctx.fill_text(text, 0.0, 0.0);
            ctx.restore();
        }
    }

    fn hit_test(
        &self,
        hit: &HitGeometry,
        candidates: &[usize],
        data: &TextData,
        g: &TextGeometry,
        visuals: &ResolvedVisuals,
    ) -> Selection {
        let hits = candidates.iter().copied().filter(|&i| {
            let Some(text) = data.text.get(i) else {
                return false;
            };
            if !g.renderable(i) {
                return false;
            }
            let (ox, oy) = g.origin(i);
            let [x0, x1, y0, y1] = measured_box(text, visuals, i);
            match *hit {
                HitGeometry::Point { sx, sy } => {
                    let (lx, ly) = to_local(sx, sy, ox, oy, g.angle[i]);
                    x0 <= lx && lx <= x1 && y0 <= ly && ly <= y1
                }
                HitGeometry::Span {
                    direction: SpanDirection::H,
                    sx,
                    ..
                } => x0 <= sx - ox && sx - ox <= x1,
                HitGeometry::Span {
                    direction: SpanDirection::V,
                    sy,
                    ..
                } => y0 <= sy - oy && sy - oy <= y1,
                HitGeometry::Rect { .. } => hit.query_box(0.0).contains(g.sx[i], g.sy[i]),
            }
        });
        Selection::from_indices(hits)
    }

    fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &TextData,
        _geometry: &TextGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let Some(text) = data.text.get(index) else {
            return;
        };
        let row_data = TextData {
            text: vec![text.clone()],
            ..TextData::default()
        };
        let row = TextGeometry {
            sx: vec![bbox.hcenter()],
            sy: vec![bbox.vcenter()],
            angle: vec![0.0],
            x_offset: vec![0.0],
            y_offset: vec![0.0],
        };
        self.render(ctx, &[0], &row_data, &row, &visuals.single_row(index));
    }

    fn bounds(&self, data: &TextData) -> Option<Bounds> {
        Bounds::union_all(data.x.iter().zip(&data.y).map(|(x, y)| Bounds::point(*x, *y)))
    }

    fn index_entries(&self, data: &TextData) -> Vec<IndexEntry> {
        data.x
            .iter()
            .zip(&data.y)
            .enumerate()
            .map(|(index, (x, y))| IndexEntry {
                index,
                bounds: Bounds::point(*x, *y),
            })
            .collect()
    }

    /// Labels extend away from their anchor by their measured size plus their offset.
    fn screen_padding(&self, data: &TextData, g: &TextGeometry, visuals: &ResolvedVisuals) -> f64 {
        (0..g.sx.len())
            .filter(|&i| g.renderable(i))
            .filter_map(|i| {
                let [x0, x1, y0, y1] = measured_box(data.text.get(i)?, visuals, i);
                let reach = x0.abs().max(x1.abs()).hypot(y0.abs().max(y1.abs()));
                Some(reach + g.x_offset[i].hypot(g.y_offset[i]))
            })
            .fold(0.0, f64::max)
    }

    fn anchor(&self, index: usize, g: &TextGeometry) -> Option<(f64, f64)> {
        g.renderable(index).then(|| (g.sx[index], g.sy[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawOp, RecordingContext};
    use crate::visuals::{TextProps, Visuals};
    use narwhal_core::{Column, Range1d, ScaleKind};
    use std::f64::consts::FRAC_PI_2;

    fn setup(angle: f64) -> (Text, TextData, TextGeometry, ResolvedVisuals) {
        let source = ColumnDataSource::from_columns([
            ("x", Column::Number(vec![50.0, f64::NAN])),
            ("y", Column::Number(vec![50.0, 10.0])),
            ("label", Column::Text(vec!["abc".into(), "hidden".into()])),
        ]);
        let mut glyph = Text::new(Spec::field("x"), Spec::field("y"), Spec::field("label"));
        glyph.angle = Spec::Value(angle);
        let mapping = CoordinateMapping::new(
            &ScaleKind::Linear,
            Range1d::new(0.0, 100.0),
            &ScaleKind::Linear,
            Range1d::new(100.0, 0.0),
            &BBox::new(0.0, 0.0, 100.0, 100.0),
        )
        .unwrap();
        let data = glyph.set_data(&source).unwrap();
        let g = glyph.map_data(&data, &mapping);
        let visuals = Visuals {
            text: TextProps {
                text_font_size: 10.0,
                ..TextProps::default()
            },
            ..Visuals::default()
        }
        .resolve(&source)
        .unwrap();
        (glyph, data, g, visuals)
    }

    #[test]
    fn hits_use_the_measured_box_above_the_baseline() {
        let (glyph, data, g, visuals) = setup(0.0);
        // "abc" at 10px is 18 wide and 12 tall, left aligned, bottom baseline.
        let above = glyph.hit_test(&HitGeometry::point(55.0, 45.0), &[0, 1], &data, &g, &visuals);
        assert_eq!(above, Selection::from_indices([0]));
        let below = glyph.hit_test(&HitGeometry::point(55.0, 55.0), &[0, 1], &data, &g, &visuals);
        assert!(below.is_empty());
        let padding = glyph.screen_padding(&data, &g, &visuals);
        assert!((padding - 18f64.hypot(12.0)).abs() < 1e-9);
    }

    #[test]
    fn rotation_turns_the_box_around_the_anchor() {
        let (glyph, data, g, visuals) = setup(FRAC_PI_2);
        let hit = glyph.hit_test(&HitGeometry::point(55.0, 60.0), &[0], &data, &g, &visuals);
        assert!(hit.contains(0));

        let mut ctx = RecordingContext::new();
        glyph.render(&mut ctx, &[0, 1], &data, &g, &visuals);
        assert_eq!(ctx.texts(), vec!["abc"]);
        assert!(ctx.ops.contains(&DrawOp::Rotate(FRAC_PI_2)));
    }

    #[test]
    fn legend_draws_the_row_text_centered() {
        let (glyph, data, g, visuals) = setup(0.0);
        let mut ctx = RecordingContext::new();
        glyph.legend(&mut ctx, &BBox::new(0.0, 0.0, 20.0, 10.0), 0, &data, &g, &visuals);
        assert!(ctx.ops.contains(&DrawOp::Translate(10.0, 5.0)));
        assert_eq!(ctx.texts(), vec!["abc"]);
    }
}
