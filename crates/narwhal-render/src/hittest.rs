use narwhal_core::BBox;
use serde::{Deserialize, Serialize};

/// `h` spans are vertical lines at `sx` (they select along x), `v` spans horizontal lines at
/// `sy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanDirection {
    H,
    V,
}

/// Screen-space query geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HitGeometry {
    Point {
        sx: f64,
        sy: f64,
    },
    Span {
        direction: SpanDirection,
        sx: f64,
        sy: f64,
    },
    Rect {
        sx0: f64,
        sy0: f64,
        sx1: f64,
        sy1: f64,
    },
}

impl HitGeometry {
    pub fn point(sx: f64, sy: f64) -> Self {
        HitGeometry::Point { sx, sy }
    }

    pub fn span(direction: SpanDirection, sx: f64, sy: f64) -> Self {
        HitGeometry::Span { direction, sx, sy }
    }

    /// The pointer position the geometry was built from (rect: its center).
    pub fn anchor(&self) -> (f64, f64) {
        match *self {
            HitGeometry::Point { sx, sy } | HitGeometry::Span { sx, sy, .. } => (sx, sy),
            HitGeometry::Rect { sx0, sy0, sx1, sy1 } => ((sx0 + sx1) / 2.0, (sy0 + sy1) / 2.0),
        }
    }

    /// Screen box covering every possible hit, widened by `pad` pixels. Spans are unbounded
    /// along their line.
    pub fn query_box(&self, pad: f64) -> BBox {
        match *self {
            HitGeometry::Point { sx, sy } => BBox::new(sx - pad, sy - pad, sx + pad, sy + pad),
            HitGeometry::Span {
                direction: SpanDirection::H,
                sx,
                ..
            } => BBox::new(sx - pad, f64::NEG_INFINITY, sx + pad, f64::INFINITY),
            HitGeometry::Span {
                direction: SpanDirection::V,
                sy,
                ..
            } => BBox::new(f64::NEG_INFINITY, sy - pad, f64::INFINITY, sy + pad),
            HitGeometry::Rect { sx0, sy0, sx1, sy1 } => BBox::new(
                sx0.min(sx1) - pad,
                sy0.min(sy1) - pad,
                sx0.max(sx1) + pad,
                sy0.max(sy1) + pad,
            ),
        }
    }
}

pub fn dist_squared(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let (dx, dy) = (x1 - x0, y1 - y0);
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `v`-`w`.
pub fn dist_to_segment_squared(p: (f64, f64), v: (f64, f64), w: (f64, f64)) -> f64 {
    let l2 = dist_squared(v.0, v.1, w.0, w.1);
    if l2 == 0.0 {
        return dist_squared(p.0, p.1, v.0, v.1);
    }
    let t = (((p.0 - v.0) * (w.0 - v.0) + (p.1 - v.1) * (w.1 - v.1)) / l2).clamp(0.0, 1.0);
    dist_squared(p.0, p.1, v.0 + t * (w.0 - v.0), v.1 + t * (w.1 - v.1))
}

pub fn dist_to_segment(p: (f64, f64), v: (f64, f64), w: (f64, f64)) -> f64 {
    dist_to_segment_squared(p, v, w).sqrt()
}

/// Intersection of the infinite lines through `a0`-`a1` and `b0`-`b1`; `None` when parallel.
pub fn line_intersection(
    a0: (f64, f64),
    a1: (f64, f64),
    b0: (f64, f64),
    b1: (f64, f64),
) -> Option<(f64, f64)> {
    let denom = (b1.1 - b0.1) * (a1.0 - a0.0) - (b1.0 - b0.0) * (a1.1 - a0.1);
    if denom == 0.0 {
        return None;
    }
    let t = ((b1.0 - b0.0) * (a0.1 - b0.1) - (b1.1 - b0.1) * (a0.0 - b0.0)) / denom;
    Some((a0.0 + t * (a1.0 - a0.0), a0.1 + t * (a1.1 - a0.1)))
}

/// `(px, py)` relative to `(cx, cy)`, rotated by `-angle`.
pub fn to_local(px: f64, py: f64, cx: f64, cy: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    let (dx, dy) = (px - cx, py - cy);
    (dx * cos + dy * sin, dy * cos - dx * sin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        assert_eq!(dist_to_segment((5.0, 3.0), (0.0, 0.0), (10.0, 0.0)), 3.0);
        assert_eq!(dist_to_segment((13.0, 4.0), (0.0, 0.0), (10.0, 0.0)), 5.0);
        assert_eq!(dist_to_segment((3.0, 4.0), (0.0, 0.0), (0.0, 0.0)), 5.0);
    }

    #[test]
    fn lines_intersect_unless_parallel() {
        let p = line_intersection((0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)).unwrap();
        assert_eq!(p, (1.0, 1.0));
        assert!(line_intersection((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn geometry_reads_tagged_json() {
        let g: HitGeometry =
            serde_json::from_str(r#"{"type": "span", "direction": "h", "sx": 1, "sy": 2}"#)
                .unwrap();
        assert_eq!(g, HitGeometry::span(SpanDirection::H, 1.0, 2.0));
        assert_eq!(g.query_box(2.0).left, -1.0);
    }
}
