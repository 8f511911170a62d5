use serde::{Deserialize, Serialize};

/// Data-space extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Bounds {
    /// Normalizes the corners so that `x0 <= x1` and `y0 <= y1`. Any NaN corner makes the
    /// whole box NaN.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        if x0.is_nan() || y0.is_nan() || x1.is_nan() || y1.is_nan() {
            return Self {
                x0: f64::NAN,
                y0: f64::NAN,
                x1: f64::NAN,
                y1: f64::NAN,
            };
        }
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn padded(&self, dx: f64, dy: f64) -> Bounds {
        Bounds {
            x0: self.x0 - dx,
            y0: self.y0 - dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Union of every finite bounds in `items`.
    pub fn union_all(items: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
        items
            .into_iter()
            .filter(Bounds::is_finite)
            .reduce(|a, b| a.union(&b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub index: usize,
    pub bounds: Bounds,
}

/// Static box index over row extents, sorted by left edge.
///
/// Rows with non-finite extents are left out, so they can never be hit.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    entries: Vec<IndexEntry>,
}

impl SpatialIndex {
    pub fn new(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let mut entries: Vec<IndexEntry> = entries
            .into_iter()
            .filter(|e| e.bounds.is_finite())
            .collect();
        entries.sort_by(|a, b| a.bounds.x0.total_cmp(&b.bounds.x0));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row indices whose extent intersects `query`, ascending.
    pub fn indices(&self, query: &Bounds) -> Vec<usize> {
        let end = self.entries.partition_point(|e| e.bounds.x0 <= query.x1);
        let mut out: Vec<usize> = self.entries[..end]
            .iter()
            .filter(|e| e.bounds.intersects(query))
            .map(|e| e.index)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::union_all(self.entries.iter().map(|e| e.bounds))
    }
}
