//! Data-driven property specs and their per-row resolution.
//!
//! A spec is either a literal (`{"value": 2}` or a bare `2`) or a column reference
//! (`{"field": "width"}`). Distance specs additionally carry `units`: `data` values are scaled
//! through the plot scales, `screen` values are pixels.

use crate::Result;
use crate::context::{FillStyle, LineStyle, TextAlign, TextAttrs, TextBaseline};
use narwhal_core::ColumnDataSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[serde(from = "RawSpec<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub enum Spec<T> {
    Field(String),
    Value(T),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec<T> {
    Field { field: String },
    Value { value: T },
    Bare(T),
}

impl<T> From<RawSpec<T>> for Spec<T> {
    fn from(raw: RawSpec<T>) -> Self {
        match raw {
            RawSpec::Field { field } => Spec::Field(field),
            RawSpec::Value { value } | RawSpec::Bare(value) => Spec::Value(value),
        }
    }
}

impl<T> Spec<T> {
    pub fn field(name: impl Into<String>) -> Self {
        Spec::Field(name.into())
    }
}

/// A resolved spec: one constant for every row, or one value per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Const(T),
    Array(Vec<T>),
}

impl<T> Resolved<T> {
    pub fn get(&self, index: usize) -> Option<&T> {
        match self {
            Resolved::Const(v) => Some(v),
            Resolved::Array(values) => values.get(index),
        }
    }

    fn row(&self, index: usize) -> Option<Resolved<T>>
    where
        T: Clone,
    {
        self.get(index).cloned().map(Resolved::Const)
    }
}

impl Resolved<f64> {
    pub fn at(&self, index: usize) -> f64 {
        self.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn to_vec(&self, len: usize) -> Vec<f64> {
        (0..len).map(|i| self.at(i)).collect()
    }

    /// Largest finite value, ignoring NaN rows.
    pub fn max(&self) -> f64 {
        match self {
            Resolved::Const(v) if v.is_finite() => *v,
            Resolved::Const(_) => 0.0,
            Resolved::Array(values) => values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(0.0, f64::max),
        }
    }
}

impl Spec<f64> {
    pub fn resolve(&self, source: &ColumnDataSource) -> Result<Resolved<f64>> {
        Ok(match self {
            Spec::Field(name) => Resolved::Array(source.numbers(name)?.to_vec()),
            Spec::Value(v) => Resolved::Const(*v),
        })
    }
}

impl Spec<String> {
    pub fn resolve(&self, source: &ColumnDataSource) -> Result<Resolved<String>> {
        Ok(match self {
            Spec::Field(name) => Resolved::Array(source.texts(name)?.to_vec()),
            Spec::Value(v) => Resolved::Const(v.clone()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialUnits {
    #[default]
    Data,
    Screen,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDistance")]
pub struct DistanceSpec {
    pub spec: Spec<f64>,
    pub units: SpatialUnits,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDistance {
    Bare(f64),
    Object {
        field: Option<String>,
        value: Option<f64>,
        #[serde(default)]
        units: SpatialUnits,
    },
}

impl TryFrom<RawDistance> for DistanceSpec {
    type Error = String;

    fn try_from(raw: RawDistance) -> std::result::Result<Self, String> {
        match raw {
            RawDistance::Bare(v) => Ok(DistanceSpec::data(v)),
            RawDistance::Object {
                field: Some(field),
                value: None,
                units,
            } => Ok(DistanceSpec {
                spec: Spec::Field(field),
                units,
            }),
            RawDistance::Object {
                field: None,
                value: Some(value),
                units,
            } => Ok(DistanceSpec {
                spec: Spec::Value(value),
                units,
            }),
            RawDistance::Object { .. } => {
                Err("distance spec needs exactly one of `field` or `value`".to_string())
            }
        }
    }
}

impl DistanceSpec {
    pub fn data(value: f64) -> Self {
        Self {
            spec: Spec::Value(value),
            units: SpatialUnits::Data,
        }
    }

    pub fn screen(value: f64) -> Self {
        Self {
            spec: Spec::Value(value),
            units: SpatialUnits::Screen,
        }
    }

    pub fn field(name: impl Into<String>, units: SpatialUnits) -> Self {
        Self {
            spec: Spec::Field(name.into()),
            units,
        }
    }

    pub fn resolve(&self, source: &ColumnDataSource) -> Result<Resolved<f64>> {
        self.spec.resolve(source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineProps {
    pub line_color: Option<Spec<String>>,
    pub line_width: Spec<f64>,
    pub line_alpha: Spec<f64>,
    pub line_dash: Vec<f64>,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            line_color: Some(Spec::Value("black".to_string())),
            line_width: Spec::Value(1.0),
            line_alpha: Spec::Value(1.0),
            line_dash: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillProps {
    pub fill_color: Option<Spec<String>>,
    pub fill_alpha: Spec<f64>,
}

impl Default for FillProps {
    fn default() -> Self {
        Self {
            fill_color: Some(Spec::Value("gray".to_string())),
            fill_alpha: Spec::Value(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    pub text_color: Spec<String>,
    pub text_alpha: Spec<f64>,
    pub text_font: String,
    pub text_font_size: f64,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
}

impl Default for TextProps {
    fn default() -> Self {
        let attrs = TextAttrs::default();
        Self {
            text_color: Spec::Value(attrs.color),
            text_alpha: Spec::Value(attrs.alpha),
            text_font: attrs.font,
            text_font_size: attrs.font_size,
            text_align: attrs.align,
            text_baseline: attrs.baseline,
        }
    }
}

/// Line, fill and text properties of one renderer. A glyph uses the groups it draws with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Visuals {
    #[serde(flatten)]
    pub line: LineProps,
    #[serde(flatten)]
    pub fill: FillProps,
    #[serde(flatten)]
    pub text: TextProps,
}

impl Visuals {
    pub fn resolve(&self, source: &ColumnDataSource) -> Result<ResolvedVisuals> {
        let line_color = match &self.line.line_color {
            Some(spec) => Some(spec.resolve(source)?),
            None => None,
        };
        let fill_color = match &self.fill.fill_color {
            Some(spec) => Some(spec.resolve(source)?),
            None => None,
        };
        Ok(ResolvedVisuals {
            line_color,
            line_width: self.line.line_width.resolve(source)?,
            line_alpha: self.line.line_alpha.resolve(source)?,
            line_dash: self.line.line_dash.clone(),
            fill_color,
            fill_alpha: self.fill.fill_alpha.resolve(source)?,
            text_color: self.text.text_color.resolve(source)?,
            text_alpha: self.text.text_alpha.resolve(source)?,
            text_font: self.text.text_font.clone(),
            text_font_size: self.text.text_font_size,
            text_align: self.text.text_align,
            text_baseline: self.text.text_baseline,
            alpha_scale: 1.0,
        })
    }
}

/// Visual properties resolved against one data source, queried per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVisuals {
    line_color: Option<Resolved<String>>,
    line_width: Resolved<f64>,
    line_alpha: Resolved<f64>,
    line_dash: Vec<f64>,
    fill_color: Option<Resolved<String>>,
    fill_alpha: Resolved<f64>,
    text_color: Resolved<String>,
    text_alpha: Resolved<f64>,
    text_font: String,
    text_font_size: f64,
    text_align: TextAlign,
    text_baseline: TextBaseline,
    alpha_scale: f64,
}

impl ResolvedVisuals {
    /// Multiplies every alpha by `scale` (used for non-selected rows).
    pub fn with_alpha_scale(mut self, scale: f64) -> Self {
        self.alpha_scale *= scale;
        self
    }

    /// Stroke style of a row; `None` when the row draws no outline.
    pub fn line(&self, index: usize) -> Option<LineStyle> {
        let color = self.line_color.as_ref()?.get(index)?;
        let width = self.line_width.at(index);
        let alpha = self.line_alpha.at(index) * self.alpha_scale;
        if !(width > 0.0) || !(alpha > 0.0) {
            return None;
        }
        Some(LineStyle {
            color: color.clone(),
            alpha,
            width,
            dash: self.line_dash.clone(),
        })
    }

    pub fn fill(&self, index: usize) -> Option<FillStyle> {
        let color = self.fill_color.as_ref()?.get(index)?;
        let alpha = self.fill_alpha.at(index) * self.alpha_scale;
        if !(alpha > 0.0) {
            return None;
        }
        Some(FillStyle {
            color: color.clone(),
            alpha,
        })
    }

    pub fn text(&self, index: usize) -> TextAttrs {
        TextAttrs {
            color: self
                .text_color
                .get(index)
                .cloned()
                .unwrap_or_else(|| TextAttrs::default().color),
            alpha: self.text_alpha.at(index) * self.alpha_scale,
            font: self.text_font.clone(),
            font_size: self.text_font_size,
            align: self.text_align,
            baseline: self.text_baseline,
        }
    }

    /// Line width of a row, 0 when unresolved. Drives line hit tolerances.
    pub fn line_width(&self, index: usize) -> f64 {
        let w = self.line_width.at(index);
        if w.is_finite() { w } else { 0.0 }
    }

    pub fn max_line_width(&self) -> f64 {
        self.line_width.max()
    }

    /// The visuals of row `index` alone, as a one-row set (row 0).
    pub fn single_row(&self, index: usize) -> Self {
        let nan = Resolved::Const(f64::NAN);
        Self {
            line_color: self.line_color.as_ref().and_then(|c| c.row(index)),
            line_width: self.line_width.row(index).unwrap_or(nan.clone()),
            line_alpha: self.line_alpha.row(index).unwrap_or(nan.clone()),
            line_dash: self.line_dash.clone(),
            fill_color: self.fill_color.as_ref().and_then(|c| c.row(index)),
            fill_alpha: self.fill_alpha.row(index).unwrap_or(nan.clone()),
            text_color: self
                .text_color
                .row(index)
                .unwrap_or(Resolved::Const(TextAttrs::default().color)),
            text_alpha: self.text_alpha.row(index).unwrap_or(nan),
            text_font: self.text_font.clone(),
            text_font_size: self.text_font_size,
            text_align: self.text_align,
            text_baseline: self.text_baseline,
            alpha_scale: self.alpha_scale,
        }
    }
}
