use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub alpha: f64,
    pub width: f64,
    pub dash: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub color: String,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Bottom,
    Alphabetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAttrs {
    pub color: String,
    pub alpha: f64,
    pub font: String,
    pub font_size: f64,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl Default for TextAttrs {
    fn default() -> Self {
        Self {
            color: "#444444".to_string(),
            alpha: 1.0,
            font: "helvetica".to_string(),
            font_size: 13.0,
            align: TextAlign::Left,
            baseline: TextBaseline::Bottom,
        }
    }
}

/// A 2D drawing surface with canvas semantics: a current path built by the path calls, painted
/// by `fill`/`stroke`, and a transform/style state stack driven by `save`/`restore`.
pub trait RenderContext {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, angle: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    /// Adds a closed ellipse sub-path centered on `(cx, cy)`, rotated by `rotation` radians.
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn set_line(&mut self, style: &LineStyle);
    fn set_fill(&mut self, style: &FillStyle);
    fn set_text(&mut self, attrs: &TextAttrs);

    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        rotation: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    SetLine(LineStyle),
    SetFill(FillStyle),
    SetText(TextAttrs),
    Fill,
    Stroke,
    FillText {
        text: String,
        x: f64,
        y: f64,
    },
}

/// Records every call; used to inspect what a glyph drew.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    pub ops: Vec<DrawOp>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The move/line vertices of the current path at each `stroke` call, one list per stroke.
    pub fn stroked_paths(&self) -> Vec<Vec<(f64, f64)>> {
        let mut out = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for op in &self.ops {
            match op {
                DrawOp::BeginPath => current.clear(),
                DrawOp::MoveTo(x, y) | DrawOp::LineTo(x, y) => current.push((*x, *y)),
                DrawOp::Stroke => out.push(current.clone()),
                _ => {}
            }
        }
        out
    }

    pub fn count(&self, matches: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| matches(op)).count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderContext for RecordingContext {
    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(DrawOp::Translate(dx, dy));
    }

    fn rotate(&mut self, angle: f64) {
        self.ops.push(DrawOp::Rotate(angle));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64) {
        self.ops.push(DrawOp::Ellipse {
            cx,
            cy,
            rx,
            ry,
            rotation,
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_line(&mut self, style: &LineStyle) {
        self.ops.push(DrawOp::SetLine(style.clone()));
    }

    fn set_fill(&mut self, style: &FillStyle) {
        self.ops.push(DrawOp::SetFill(style.clone()));
    }

    fn set_text(&mut self, attrs: &TextAttrs) {
        self.ops.push(DrawOp::SetText(attrs.clone()));
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }
}
