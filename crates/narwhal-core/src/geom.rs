use serde::{Deserialize, Serialize};

/// Pixel coordinates, origin at the top-left corner of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSpace;

/// Domain-value coordinates, origin wherever the ranges put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSpace;

pub type ScreenPoint = euclid::Point2D<f64, ScreenSpace>;
pub type ScreenVector = euclid::Vector2D<f64, ScreenSpace>;
pub type DataPoint = euclid::Point2D<f64, DataSpace>;
pub type DataVector = euclid::Vector2D<f64, DataSpace>;
pub type ScreenTransform = euclid::Transform2D<f64, ScreenSpace, ScreenSpace>;

pub fn screen_point(x: f64, y: f64) -> ScreenPoint {
    euclid::point2(x, y)
}

pub fn data_point(x: f64, y: f64) -> DataPoint {
    euclid::point2(x, y)
}

/// Screen-space rectangle. `contains` is inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn hcenter(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn vcenter(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn contains(&self, sx: f64, sy: f64) -> bool {
        sx >= self.left && sx <= self.right && sy >= self.top && sy <= self.bottom
    }

    pub fn contains_point(&self, p: ScreenPoint) -> bool {
        self.contains(p.x, p.y)
    }

    /// Shrinks the box by `dx`/`dy` on each side.
    pub fn inset(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right - dx,
            self.bottom - dy,
        )
    }
}
