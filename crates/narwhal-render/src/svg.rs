use crate::context::{FillStyle, LineStyle, RenderContext, TextAlign, TextAttrs, TextBaseline};
use std::fmt::Write as _;
use std::str::FromStr;

/// Cubic Bezier control distance for a quarter ellipse.
const KAPPA: f64 = 0.552_284_749_831;

/// Affine transform `[a, b, c, d, e, f]`, mapping `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone)]
struct State {
    transform: Matrix,
    line: Option<LineStyle>,
    fill: Option<FillStyle>,
    text: TextAttrs,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: IDENTITY,
            line: None,
            fill: None,
            text: TextAttrs::default(),
        }
    }
}

/// Renders into an SVG document.
///
/// Path coordinates are transformed eagerly, so every `<path>` is in canvas pixels; text keeps
/// the current transform as a `matrix(...)` attribute. Each `fill`/`stroke` call emits one
/// element.
#[derive(Debug, Clone)]
pub struct SvgContext {
    width: f64,
    height: f64,
    state: State,
    stack: Vec<State>,
    path: String,
    body: String,
}

impl SvgContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: State::default(),
            stack: Vec::new(),
            path: String::new(),
            body: String::new(),
        }
    }

    /// Paints the whole canvas, typically before any glyph is drawn.
    pub fn background(&mut self, color: &str) {
        let Some(paint) = paint(color, 1.0) else {
            return;
        };
        let (w, h) = (self.fmt(self.width), self.fmt(self.height));
        let _ = write!(
            self.body,
            r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}""#,
            paint.0
        );
        self.opacity_attr("fill-opacity", paint.1);
        self.body.push_str("/>");
    }

    pub fn finish(self) -> String {
        let w = self.fmt(self.width);
        let h = self.fmt(self.height);
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{}</svg>"#,
            self.body
        )
    }

    fn fmt(&self, v: f64) -> String {
        fmt_number(&mut ryu_js::Buffer::new(), v).to_string()
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.state.transform;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn push_point(&mut self, cmd: char, x: f64, y: f64) {
        let (tx, ty) = self.apply(x, y);
        let sx = self.fmt(tx);
        let sy = self.fmt(ty);
        if !self.path.is_empty() {
            self.path.push(' ');
        }
        let _ = write!(self.path, "{cmd}{sx} {sy}");
    }

    fn push_curve(&mut self, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) {
        let mut parts = Vec::with_capacity(3);
        for (x, y) in [c1, c2, end] {
            let (tx, ty) = self.apply(x, y);
            parts.push(format!("{} {}", self.fmt(tx), self.fmt(ty)));
        }
        let _ = write!(self.path, " C{}", parts.join(" "));
    }

    fn opacity_attr(&mut self, name: &str, alpha: f64) {
        if alpha < 1.0 {
            let a = self.fmt(alpha);
            let _ = write!(self.body, r#" {name}="{a}""#);
        }
    }
}

impl RenderContext for SvgContext {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        let [a, b, c, d, e, f] = self.state.transform;
        self.state.transform = [a, b, c, d, a * dx + c * dy + e, b * dx + d * dy + f];
    }

    fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let [a, b, c, d, e, f] = self.state.transform;
        self.state.transform = [
            a * cos + c * sin,
            b * cos + d * sin,
            c * cos - a * sin,
            d * cos - b * sin,
            e,
            f,
        ];
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push_point('M', x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push_point('L', x, y);
    }

    fn close_path(&mut self) {
        if !self.path.is_empty() {
            self.path.push_str(" Z");
        }
    }

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64) {
        let (sin, cos) = rotation.sin_cos();
        let local = |x: f64, y: f64| (cx + x * cos - y * sin, cy + x * sin + y * cos);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        let start = local(rx, 0.0);
        self.push_point('M', start.0, start.1);
        let quarters = [
            ((rx, ky), (kx, ry), (0.0, ry)),
            ((-kx, ry), (-rx, ky), (-rx, 0.0)),
            ((-rx, -ky), (-kx, -ry), (0.0, -ry)),
            ((kx, -ry), (rx, -ky), (rx, 0.0)),
        ];
        for (c1, c2, end) in quarters {
            self.push_curve(local(c1.0, c1.1), local(c2.0, c2.1), local(end.0, end.1));
        }
        self.path.push_str(" Z");
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push_point('M', x, y);
        self.push_point('L', x + width, y);
        self.push_point('L', x + width, y + height);
        self.push_point('L', x, y + height);
        self.path.push_str(" Z");
    }

    fn set_line(&mut self, style: &LineStyle) {
        self.state.line = Some(style.clone());
    }

    fn set_fill(&mut self, style: &FillStyle) {
        self.state.fill = Some(style.clone());
    }

    fn set_text(&mut self, attrs: &TextAttrs) {
        self.state.text = attrs.clone();
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let Some(style) = self.state.fill.clone() else {
            return;
        };
        let Some((color, alpha)) = paint(&style.color, style.alpha) else {
            return;
        };
        let _ = write!(self.body, r#"<path d="{}" fill="{color}""#, self.path);
        self.opacity_attr("fill-opacity", alpha);
        self.body.push_str("/>");
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let Some(style) = self.state.line.clone() else {
            return;
        };
        let Some((color, alpha)) = paint(&style.color, style.alpha) else {
            return;
        };
        let width = self.fmt(style.width);
        let _ = write!(
            self.body,
            r#"<path d="{}" fill="none" stroke="{color}" stroke-width="{width}""#,
            self.path
        );
        self.opacity_attr("stroke-opacity", alpha);
        if !style.dash.is_empty() {
            let dash: Vec<String> = style.dash.iter().map(|v| self.fmt(*v)).collect();
            let _ = write!(self.body, r#" stroke-dasharray="{}""#, dash.join(" "));
        }
        self.body.push_str("/>");
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let attrs = self.state.text.clone();
        let Some((color, alpha)) = paint(&attrs.color, attrs.alpha) else {
            return;
        };
        let anchor = match attrs.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let baseline = match attrs.baseline {
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "central",
            TextBaseline::Bottom => "text-after-edge",
            TextBaseline::Alphabetic => "alphabetic",
        };
        let (sx, sy, size) = (self.fmt(x), self.fmt(y), self.fmt(attrs.font_size));
        let _ = write!(
            self.body,
            r#"<text x="{sx}" y="{sy}" fill="{color}" font-family="{}" font-size="{size}" text-anchor="{anchor}" dominant-baseline="{baseline}""#,
            escape_xml(&attrs.font)
        );
        self.opacity_attr("fill-opacity", alpha);
        if self.state.transform != IDENTITY {
            let m: Vec<String> = self
                .state
                .transform
                .iter()
                .map(|v| self.fmt(*v))
                .collect();
            let _ = write!(self.body, r#" transform="matrix({})""#, m.join(","));
        }
        let _ = write!(self.body, ">{}</text>", escape_xml(text));
    }
}

/// Parses a CSS color into `#rrggbb` and a combined opacity. Unparseable colors paint nothing.
fn paint(color: &str, alpha: f64) -> Option<(String, f64)> {
    match svgtypes::Color::from_str(color) {
        Ok(c) => Some((
            format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue),
            (alpha * f64::from(c.alpha) / 255.0).clamp(0.0, 1.0),
        )),
        Err(err) => {
            tracing::warn!(color, %err, "skipping paint with invalid color");
            None
        }
    }
}

/// Shortest round-trip form of `v` rounded to 3 decimals; non-finite values and `-0` print as
/// `0`.
fn fmt_number(buf: &mut ryu_js::Buffer, v: f64) -> &str {
    if !v.is_finite() {
        return "0";
    }
    let mut v = (v * 1000.0).round() / 1000.0;
    if v == -0.0 {
        v = 0.0;
    }
    buf.format_finite(v)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(color: &str) -> LineStyle {
        LineStyle {
            color: color.to_string(),
            alpha: 0.5,
            width: 2.0,
            dash: vec![4.0, 2.0],
        }
    }

    #[test]
    fn strokes_emit_transformed_paths() {
        let mut ctx = SvgContext::new(100.0, 50.0);
        ctx.set_line(&line("red"));
        ctx.save();
        ctx.translate(10.0, 5.0);
        ctx.begin_path();
        ctx.move_to(0.0, 0.0);
        ctx.line_to(1.5, 2.0);
        ctx.stroke();
        ctx.restore();
        let svg = ctx.finish();

        let doc = roxmltree::Document::parse(&svg).unwrap();
        let path = doc
            .descendants()
            .find(|n| n.has_tag_name("path"))
            .unwrap();
        assert_eq!(path.attribute("d"), Some("M10 5 L11.5 7"));
        assert_eq!(path.attribute("stroke"), Some("#ff0000"));
        assert_eq!(path.attribute("stroke-opacity"), Some("0.5"));
        assert_eq!(path.attribute("stroke-dasharray"), Some("4 2"));
        assert_eq!(doc.root_element().attribute("viewBox"), Some("0 0 100 50"));
    }

    #[test]
    fn invalid_colors_paint_nothing_and_text_is_escaped() {
        let mut ctx = SvgContext::new(10.0, 10.0);
        ctx.set_fill(&FillStyle {
            color: "not-a-color".to_string(),
            alpha: 1.0,
        });
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 1.0, 1.0);
        ctx.fill();
        ctx.rotate(std::f64::consts::FRAC_PI_2);
        ctx.fill_text("a<b", 1.0, 2.0);
        let svg = ctx.finish();

        let doc = roxmltree::Document::parse(&svg).unwrap();
        assert!(doc.descendants().all(|n| !n.has_tag_name("path")));
        let text = doc
            .descendants()
            .find(|n| n.has_tag_name("text"))
            .unwrap();
        assert_eq!(text.text(), Some("a<b"));
        assert_eq!(text.attribute("transform"), Some("matrix(0,1,-1,0,0,0)"));
    }
}
