use super::GlyphView;
use crate::Result;
use crate::context::RenderContext;
use crate::hittest::{HitGeometry, SpanDirection, dist_to_segment, line_intersection};
use crate::spatial::{Bounds, IndexEntry};
use crate::visuals::{ResolvedVisuals, Spec};
use narwhal_core::{BBox, ColumnDataSource, CoordinateMapping, Selection};
use serde::Deserialize;

/// One polyline per row, read from list-valued `xs`/`ys` columns. A non-finite vertex breaks
/// the line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultiLine {
    pub xs: Spec<Vec<f64>>,
    pub ys: Spec<Vec<f64>>,
}

impl MultiLine {
    pub fn new(xs: impl Into<String>, ys: impl Into<String>) -> Self {
        Self {
            xs: Spec::field(xs),
            ys: Spec::field(ys),
        }
    }
}

fn resolve(spec: &Spec<Vec<f64>>, source: &ColumnDataSource) -> Result<Vec<Vec<f64>>> {
    Ok(match spec {
        Spec::Field(name) => source.number_lists(name)?.to_vec(),
        Spec::Value(line) => vec![line.clone(); source.len()],
    })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinesData {
    pub xs: Vec<Vec<f64>>,
    pub ys: Vec<Vec<f64>>,
}

impl LinesData {
    /// Vertex `j` of row `i`, when it exists and is finite.
    pub fn vertex(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        vertex(&self.xs, &self.ys, i, j)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinesGeometry {
    pub sxs: Vec<Vec<f64>>,
    pub sys: Vec<Vec<f64>>,
}

impl LinesGeometry {
    pub fn vertex(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        vertex(&self.sxs, &self.sys, i, j)
    }

    fn segment_count(&self, i: usize) -> usize {
        let n = self.sxs.get(i).map_or(0, Vec::len);
        let m = self.sys.get(i).map_or(0, Vec::len);
        n.min(m).saturating_sub(1)
    }

    /// Finite segments of row `i` as `(j, start, end)`.
    fn segments(&self, i: usize) -> impl Iterator<Item = (usize, (f64, f64), (f64, f64))> + '_ {
        (0..self.segment_count(i))
            .filter_map(move |j| Some((j, self.vertex(i, j)?, self.vertex(i, j + 1)?)))
    }
}

fn vertex(xs: &[Vec<f64>], ys: &[Vec<f64>], i: usize, j: usize) -> Option<(f64, f64)> {
    let x = *xs.get(i)?.get(j)?;
    let y = *ys.get(i)?.get(j)?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

/// Where the pointer line crosses segment `seg` of row `row`, in data space.
///
/// A point query uses the 1px diagonal through the pointer; spans use their own line. `None`
/// for parallel lines or a missing segment.
pub fn interpolation_hit(
    data: &LinesData,
    row: usize,
    seg: usize,
    hit: &HitGeometry,
    mapping: &CoordinateMapping,
) -> Option<(f64, f64)> {
    let (x0, y0) = data.vertex(row, seg)?;
    let (x1, y1) = data.vertex(row, seg + 1)?;
    let a0 = mapping.map_to_screen(x0, y0);
    let a1 = mapping.map_to_screen(x1, y1);
    let (sx, sy) = hit.anchor();
    let (b0, b1) = match hit {
        HitGeometry::Span {
            direction: SpanDirection::H,
            ..
        } => ((sx, 0.0), (sx, 1.0)),
        HitGeometry::Span {
            direction: SpanDirection::V,
            ..
        } => ((0.0, sy), (1.0, sy)),
        _ => ((sx, sy), (sx + 1.0, sy + 1.0)),
    };
    let (ix, iy) = line_intersection((a0.x, a0.y), (a1.x, a1.y), b0, b1)?;
    let p = mapping.map_from_screen(ix, iy);
    Some((p.x, p.y))
}

impl GlyphView for MultiLine {
    type Data = LinesData;
    type Geometry = LinesGeometry;

    fn set_data(&self, source: &ColumnDataSource) -> Result<LinesData> {
        Ok(LinesData {
            xs: resolve(&self.xs, source)?,
            ys: resolve(&self.ys, source)?,
        })
    }

    fn map_data(&self, data: &LinesData, mapping: &CoordinateMapping) -> LinesGeometry {
        LinesGeometry {
            sxs: data.xs.iter().map(|xs| mapping.x_scale.v_compute(xs)).collect(),
            sys: data.ys.iter().map(|ys| mapping.y_scale.v_compute(ys)).collect(),
        }
    }

    fn render(
        &self,
        ctx: &mut dyn RenderContext,
        indices: &[usize],
        _data: &LinesData,
        g: &LinesGeometry,
        visuals: &ResolvedVisuals,
    ) {
        for &i in indices {
            let (Some(sx), Some(sy)) = (g.sxs.get(i), g.sys.get(i)) else {
                continue;
            };
            let Some(line) = visuals.line(i) else {
                continue;
            };
            ctx.set_line(&line);
            ctx.begin_path();
            let mut pen_down = false;
            for (x, y) in sx.iter().zip(sy) {
                if !(x.is_finite() && y.is_finite()) {
                    ctx.stroke();
                    ctx.begin_path();
                    pen_down = false;
                    continue;
                }
                if pen_down {
                    ctx.line_to(*x, *y);
                } else {
                    ctx.move_to(*x, *y);
                    pen_down = true;
                }
            }
            ctx.stroke();
        }
    }

    /// Point queries select the single nearest segment within `max(2, line_width / 2)` pixels;
    /// ties keep the earlier row. Spans select every segment straddling the span line, rects
    /// every row with a vertex inside.
    fn hit_test(
        &self,
        hit: &HitGeometry,
        candidates: &[usize],
        _data: &LinesData,
        g: &LinesGeometry,
        visuals: &ResolvedVisuals,
    ) -> Selection {
        let mut result = Selection::default();
        match *hit {
            HitGeometry::Point { sx, sy } => {
                let mut best: Option<(usize, usize, f64)> = None;
                for &i in candidates {
                    let threshold = (visuals.line_width(i) / 2.0).max(2.0);
                    for (j, v, w) in g.segments(i) {
                        let d = dist_to_segment((sx, sy), v, w);
                        if d < threshold && best.is_none_or(|(_, _, bd)| d < bd) {
                            best = Some((i, j, d));
                        }
                    }
                }
                if let Some((i, j, _)) = best {
                    result.indices.insert(i);
                    result.multiline_indices.insert(i, vec![j]);
                }
            }
            HitGeometry::Span { direction, sx, sy } => {
                for &i in candidates {
                    let hits: Vec<usize> = g
                        .segments(i)
                        .filter(|(_, v, w)| {
                            let (a, b, val) = match direction {
                                SpanDirection::H => (v.0, w.0, sx),
                                SpanDirection::V => (v.1, w.1, sy),
                            };
                            a.min(b) <= val && val <= a.max(b)
                        })
                        .map(|(j, _, _)| j)
                        .collect();
                    if !hits.is_empty() {
                        result.indices.insert(i);
                        result.multiline_indices.insert(i, hits);
                    }
                }
            }
            HitGeometry::Rect { .. } => {
                let query = hit.query_box(0.0);
                for &i in candidates {
                    let n = g.sxs.get(i).map_or(0, Vec::len);
                    let inside = (0..n)
                        .filter_map(|j| g.vertex(i, j))
                        .any(|(x, y)| query.contains(x, y));
                    if inside {
                        result.indices.insert(i);
                    }
                }
            }
        }
        result
    }

    /// A horizontal stroke across the middle of `bbox`.
    fn legend(
        &self,
        ctx: &mut dyn RenderContext,
        bbox: &BBox,
        index: usize,
        data: &LinesData,
        _geometry: &LinesGeometry,
        visuals: &ResolvedVisuals,
    ) {
        let y = bbox.vcenter();
        let row = LinesGeometry {
            sxs: vec![vec![bbox.left, bbox.right]],
            sys: vec![vec![y, y]],
        };
        self.render(ctx, &[0], data, &row, &visuals.single_row(index));
    }

    fn bounds(&self, data: &LinesData) -> Option<Bounds> {
        Bounds::union_all(row_bounds(data))
    }

    fn index_entries(&self, data: &LinesData) -> Vec<IndexEntry> {
        row_bounds(data)
            .enumerate()
            .map(|(index, bounds)| IndexEntry { index, bounds })
            .collect()
    }

    fn screen_padding(&self, _: &LinesData, _: &LinesGeometry, _: &ResolvedVisuals) -> f64 {
        0.0
    }

    fn anchor(&self, _index: usize, _geometry: &LinesGeometry) -> Option<(f64, f64)> {
        None
    }
}

/// Extent of each row's finite vertices; NaN for rows without one.
fn row_bounds(data: &LinesData) -> impl Iterator<Item = Bounds> + '_ {
    (0..data.xs.len()).map(|i| {
        let n = data.xs[i].len().min(data.ys.get(i).map_or(0, Vec::len));
        let vertices = (0..n).filter_map(|j| data.vertex(i, j));
        Bounds::union_all(vertices.map(|(x, y)| Bounds::point(x, y)))
            .unwrap_or_else(|| Bounds::point(f64::NAN, f64::NAN))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingContext;
    use crate::visuals::{LineProps, Visuals};
    use narwhal_core::{Column, Range1d, ScaleKind};

    fn identity() -> CoordinateMapping {
        CoordinateMapping::new(
            &ScaleKind::Linear,
            Range1d::new(0.0, 100.0),
            &ScaleKind::Linear,
            Range1d::new(100.0, 0.0),
            &BBox::new(0.0, 0.0, 100.0, 100.0),
        )
        .unwrap()
    }

    fn setup(
        rows: Vec<(Vec<f64>, Vec<f64>)>,
        width: f64,
    ) -> (MultiLine, LinesData, LinesGeometry, ResolvedVisuals) {
        let (xs, ys): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        let source = ColumnDataSource::from_columns([
            ("xs", Column::NumberList(xs)),
            ("ys", Column::NumberList(ys)),
        ]);
        let glyph = MultiLine::new("xs", "ys");
        let data = glyph.set_data(&source).unwrap();
        let g = glyph.map_data(&data, &identity());
        let visuals = Visuals {
            line: LineProps {
                line_width: Spec::Value(width),
                ..LineProps::default()
            },
            ..Visuals::default()
        }
        .resolve(&source)
        .unwrap();
        (glyph, data, g, visuals)
    }

    #[test]
    fn nan_vertices_split_the_stroke() {
        let (glyph, data, g, visuals) = setup(
            vec![(vec![0.0, 10.0, f64::NAN, 30.0, 40.0], vec![0.0, 10.0, 20.0, 30.0, 40.0])],
            1.0,
        );
        let mut ctx = RecordingContext::new();
        glyph.render(&mut ctx, &[0], &data, &g, &visuals);
        assert_eq!(
            ctx.stroked_paths(),
            vec![
                vec![(0.0, 0.0), (10.0, 10.0)],
                vec![(30.0, 30.0), (40.0, 40.0)]
            ]
        );
    }

    #[test]
    fn point_hits_pick_the_single_nearest_segment() {
        let rows = vec![
            (vec![0.0, 50.0, 100.0], vec![10.0, 10.0, 10.0]),
            (vec![0.0, 100.0], vec![13.0, 13.0]),
        ];
        let (glyph, data, g, visuals) = setup(rows.clone(), 1.0);
        // 1px from row 0, 2px from row 1 (not strictly within the 2px floor).
        let hit = glyph.hit_test(&HitGeometry::point(60.0, 11.0), &[0, 1], &data, &g, &visuals);
        assert_eq!(hit.indices.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(hit.multiline_indices.get(&0), Some(&vec![1]));

        // Wide lines widen the threshold; the nearer row still wins.
        let (glyph, data, g, visuals) = setup(rows, 10.0);
        let hit = glyph.hit_test(&HitGeometry::point(60.0, 12.0), &[0, 1], &data, &g, &visuals);
        assert_eq!(hit.indices.iter().copied().collect::<Vec<_>>(), vec![1]);

        let miss = glyph.hit_test(&HitGeometry::point(60.0, 40.0), &[0, 1], &data, &g, &visuals);
        assert!(miss.is_empty());
    }

    #[test]
    fn spans_collect_straddling_segments() {
        let (glyph, data, g, visuals) = setup(
            vec![(vec![0.0, 20.0, 40.0, 20.0], vec![0.0, 5.0, 0.0, 5.0])],
            1.0,
        );
        let hit = glyph.hit_test(
            &HitGeometry::span(SpanDirection::H, 30.0, 0.0),
            &[0],
            &data,
            &g,
            &visuals,
        );
        assert_eq!(hit.multiline_indices.get(&0), Some(&vec![1, 2]));
    }

    #[test]
    fn interpolation_maps_the_crossing_back_to_data() {
        let (_, data, _, _) = setup(vec![(vec![0.0, 100.0], vec![0.0, 100.0])], 1.0);
        let hit = HitGeometry::span(SpanDirection::H, 25.0, 70.0);
        let p = interpolation_hit(&data, 0, 0, &hit, &identity()).unwrap();
        assert!((p.0 - 25.0).abs() < 1e-9 && (p.1 - 25.0).abs() < 1e-9);
        assert!(interpolation_hit(&data, 0, 1, &hit, &identity()).is_none());
    }
}
