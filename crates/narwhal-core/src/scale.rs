use crate::geom::{BBox, DataPoint, ScreenPoint, data_point, screen_point};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range1d {
    pub start: f64,
    pub end: f64,
}

impl Range1d {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn min(&self) -> f64 {
        self.start.min(self.end)
    }

    pub fn max(&self) -> f64 {
        self.start.max(self.end)
    }

    /// Widens the range by `fraction` of its span on each side. A zero span is widened by 1.
    pub fn padded(&self, fraction: f64) -> Self {
        let span = self.span();
        if span == 0.0 {
            return Self::new(self.start - 1.0, self.end + 1.0);
        }
        let pad = span * fraction;
        Self::new(self.start - pad, self.end + pad)
    }
}

/// `compute(x) = factor * x + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    source: Range1d,
    target: Range1d,
    factor: f64,
    offset: f64,
}

impl LinearScale {
    pub fn new(source: Range1d, target: Range1d) -> Result<Self> {
        if source.span() == 0.0 || !source.span().is_finite() {
            return Err(Error::InvalidScale {
                message: format!(
                    "linear source range [{}, {}] is empty",
                    source.start, source.end
                ),
            });
        }
        let factor = target.span() / source.span();
        let offset = target.start - factor * source.start;
        Ok(Self {
            source,
            target,
            factor,
            offset,
        })
    }

    pub fn compute(&self, x: f64) -> f64 {
        self.factor * x + self.offset
    }

    pub fn invert(&self, sx: f64) -> f64 {
        (sx - self.offset) / self.factor
    }
}

/// Logarithmic scale; non-positive inputs map to NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    source: Range1d,
    target: Range1d,
    log_start: f64,
    log_span: f64,
}

impl LogScale {
    pub fn new(source: Range1d, target: Range1d) -> Result<Self> {
        if source.start <= 0.0 || source.end <= 0.0 {
            return Err(Error::InvalidScale {
                message: format!(
                    "log source range [{}, {}] must be positive",
                    source.start, source.end
                ),
            });
        }
        let log_start = source.start.ln();
        let log_span = source.end.ln() - log_start;
        if log_span == 0.0 {
            return Err(Error::InvalidScale {
                message: format!("log source range [{}, {}] is empty", source.start, source.end),
            });
        }
        Ok(Self {
            source,
            target,
            log_start,
            log_span,
        })
    }

    pub fn compute(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return f64::NAN;
        }
        self.target.start + (x.ln() - self.log_start) / self.log_span * self.target.span()
    }

    pub fn invert(&self, sx: f64) -> f64 {
        let t = (sx - self.target.start) / self.target.span();
        (self.log_start + t * self.log_span).exp()
    }
}

/// Factors are laid out on synthetic coordinates `i + 0.5`, then mapped linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalScale {
    factors: Vec<String>,
    linear: LinearScale,
}

impl CategoricalScale {
    /// Maps the synthetic `source` range onto `target`. A non-finite or empty `source` falls
    /// back to the full factor range `[0, n]`.
    pub fn new(factors: Vec<String>, source: Range1d, target: Range1d) -> Result<Self> {
        let span = source.span();
        let source = if span.is_finite() && span != 0.0 {
            source
        } else {
            Range1d::new(0.0, factors.len().max(1) as f64)
        };
        let linear = LinearScale::new(source, target)?;
        Ok(Self { factors, linear })
    }

    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    pub fn synthetic(&self, factor: &str) -> Option<f64> {
        self.factors
            .iter()
            .position(|f| f == factor)
            .map(|i| i as f64 + 0.5)
    }

    pub fn factor_at(&self, x: f64) -> Option<&str> {
        if !(x >= 0.0) {
            return None;
        }
        self.factors.get(x.floor() as usize).map(String::as_str)
    }

    pub fn compute_factor(&self, factor: &str) -> Option<f64> {
        self.synthetic(factor).map(|x| self.linear.compute(x))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    #[default]
    Linear,
    Log,
    Categorical(Vec<String>),
}

impl ScaleKind {
    pub fn build(&self, source: Range1d, target: Range1d) -> Result<Scale> {
        Ok(match self {
            ScaleKind::Linear => Scale::Linear(LinearScale::new(source, target)?),
            ScaleKind::Log => Scale::Log(LogScale::new(source, target)?),
            ScaleKind::Categorical(factors) => {
                Scale::Categorical(CategoricalScale::new(factors.clone(), source, target)?)
            }
        })
    }
}

/// Data <-> screen transform for one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Linear(LinearScale),
    Log(LogScale),
    Categorical(CategoricalScale),
}

impl Scale {
    pub fn compute(&self, x: f64) -> f64 {
        match self {
            Scale::Linear(s) => s.compute(x),
            Scale::Log(s) => s.compute(x),
            Scale::Categorical(s) => s.linear.compute(x),
        }
    }

    pub fn invert(&self, sx: f64) -> f64 {
        match self {
            Scale::Linear(s) => s.invert(sx),
            Scale::Log(s) => s.invert(sx),
            Scale::Categorical(s) => s.linear.invert(sx),
        }
    }

    pub fn v_compute(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.compute(x)).collect()
    }

    pub fn v_invert(&self, sxs: &[f64]) -> Vec<f64> {
        sxs.iter().map(|&sx| self.invert(sx)).collect()
    }

    pub fn source_range(&self) -> Range1d {
        match self {
            Scale::Linear(s) => s.source,
            Scale::Log(s) => s.source,
            Scale::Categorical(s) => s.linear.source,
        }
    }

    pub fn target_range(&self) -> Range1d {
        match self {
            Scale::Linear(s) => s.target,
            Scale::Log(s) => s.target,
            Scale::Categorical(s) => s.linear.target,
        }
    }
}

/// The pair of scales a renderer maps through, targeting a frame in screen space.
///
/// The y scale targets `[frame.bottom, frame.top]`: data y grows upwards, screen y downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapping {
    pub x_scale: Scale,
    pub y_scale: Scale,
}

impl CoordinateMapping {
    pub fn new(
        x_kind: &ScaleKind,
        x_range: Range1d,
        y_kind: &ScaleKind,
        y_range: Range1d,
        frame: &BBox,
    ) -> Result<Self> {
        Ok(Self {
            x_scale: x_kind.build(x_range, Range1d::new(frame.left, frame.right))?,
            y_scale: y_kind.build(y_range, Range1d::new(frame.bottom, frame.top))?,
        })
    }

    pub fn map_to_screen(&self, x: f64, y: f64) -> ScreenPoint {
        screen_point(self.x_scale.compute(x), self.y_scale.compute(y))
    }

    pub fn map_from_screen(&self, sx: f64, sy: f64) -> DataPoint {
        data_point(self.x_scale.invert(sx), self.y_scale.invert(sy))
    }

    pub fn v_map_to_screen(&self, xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (self.x_scale.v_compute(xs), self.y_scale.v_compute(ys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> BBox {
        BBox::new(50.0, 10.0, 450.0, 310.0)
    }

    #[test]
    fn linear_round_trip_with_inverted_y() {
        let m = CoordinateMapping::new(
            &ScaleKind::Linear,
            Range1d::new(0.0, 10.0),
            &ScaleKind::Linear,
            Range1d::new(0.0, 10.0),
            &frame(),
        )
        .unwrap();

        let p = m.map_to_screen(0.0, 0.0);
        assert_eq!((p.x, p.y), (50.0, 310.0));
        let p = m.map_to_screen(10.0, 10.0);
        assert_eq!((p.x, p.y), (450.0, 10.0));

        for (sx, sy) in [(51.5, 12.25), (300.0, 200.0), (449.0, 309.9)] {
            let d = m.map_from_screen(sx, sy);
            let s = m.map_to_screen(d.x, d.y);
            assert!((s.x - sx).abs() < 1e-9);
            assert!((s.y - sy).abs() < 1e-9);
        }
    }

    #[test]
    fn log_round_trip_and_non_positive_inputs() {
        let s = ScaleKind::Log
            .build(Range1d::new(1.0, 1000.0), Range1d::new(0.0, 300.0))
            .unwrap();
        assert!((s.compute(10.0) - 100.0).abs() < 1e-9);
        assert!((s.invert(s.compute(42.0)) - 42.0).abs() < 1e-9);
        assert!(s.compute(0.0).is_nan());
        assert!(
            ScaleKind::Log
                .build(Range1d::new(0.0, 10.0), Range1d::new(0.0, 1.0))
                .is_err()
        );
    }

    #[test]
    fn vectorized_forms_match_scalar() {
        let s = ScaleKind::Linear
            .build(Range1d::new(-5.0, 5.0), Range1d::new(100.0, 0.0))
            .unwrap();
        let xs = [-5.0, -1.25, 0.0, 3.5, f64::NAN];
        let v = s.v_compute(&xs);
        for (x, sx) in xs.iter().zip(&v) {
            let scalar = s.compute(*x);
            assert!(scalar.to_bits() == sx.to_bits());
        }
    }

    #[test]
    fn categorical_factors_sit_on_half_offsets() {
        let kind = ScaleKind::Categorical(vec!["a".into(), "b".into(), "c".into()]);
        let Scale::Categorical(s) = kind
            .build(Range1d::new(0.0, 3.0), Range1d::new(0.0, 300.0))
            .unwrap()
        else {
            panic!("expected categorical scale");
        };
        assert_eq!(s.synthetic("b"), Some(1.5));
        assert_eq!(s.compute_factor("c"), Some(250.0));
        assert_eq!(s.factor_at(0.2), Some("a"));
        assert_eq!(s.factor_at(3.2), None);
        assert_eq!(s.synthetic("z"), None);
    }

    #[test]
    fn categorical_ranges_pan_and_zoom() {
        let kind = ScaleKind::Categorical(vec!["a".into(), "b".into(), "c".into()]);
        let Scale::Categorical(s) = kind
            .build(Range1d::new(1.0, 2.0), Range1d::new(0.0, 100.0))
            .unwrap()
        else {
            panic!("expected categorical scale");
        };
        assert_eq!(s.compute_factor("b"), Some(50.0));
        assert_eq!(s.compute_factor("a"), Some(-50.0));

        let Scale::Categorical(s) = kind
            .build(Range1d::new(f64::NAN, 2.0), Range1d::new(0.0, 300.0))
            .unwrap()
        else {
            panic!("expected categorical scale");
        };
        assert_eq!(s.compute_factor("c"), Some(250.0));
    }
}
