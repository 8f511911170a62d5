//! Tooltip field templates.
//!
//! `$name` placeholders read the hover variables (`$index`, `$x`, `$sx`, `$data_x`,
//! `$segment_index`, ...), `@column` / `@{column name}` read the hovered row. Either may carry
//! a printf-style format suffix such as `@price{%0.2f}`. A `$color[hex,swatch]:column` value
//! renders the row's color instead of the whole template.

use narwhal_core::{Column, ColumnDataSource};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\$(\w+)|@(\w+)|@\{([^{}]+)\})(?:\{([^{}]+)\})?").expect("placeholder regex")
});

static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$color(\[[^\]]*\])?:(\w+)").expect("color regex"));

/// Hover variables of one tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TooltipVars {
    pub index: usize,
    pub segment_index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub sx: f64,
    pub sy: f64,
    pub data_x: f64,
    pub data_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
    /// Color of a `$color[swatch]` block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swatch: Option<String>,
}

/// Renders one `(label, template)` pair for row `vars.index` of `source`.
pub fn render_row(
    label: &str,
    template: &str,
    source: &ColumnDataSource,
    vars: &TooltipVars,
) -> TooltipRow {
    if template.contains("$color") {
        if let Some(caps) = COLOR.captures(template) {
            let opts = caps.get(1).map_or("", |m| m.as_str());
            let column = &caps[2];
            let (value, swatch) = color_value(source, column, vars.index, opts);
            return TooltipRow {
                label: label.to_string(),
                value,
                swatch,
            };
        }
    }
    TooltipRow {
        label: label.to_string(),
        value: replace_placeholders(template, source, vars),
        swatch: None,
    }
}

pub fn replace_placeholders(
    template: &str,
    source: &ColumnDataSource,
    vars: &TooltipVars,
) -> String {
    let template = template.replace("$~", "$data_");
    PLACEHOLDER
        .replace_all(&template, |caps: &regex::Captures<'_>| {
            let format = caps.get(4).map(|m| m.as_str());
            if let Some(var) = caps.get(1) {
                return special_var(var.as_str(), vars, format);
            }
            let column = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            column_value(source, column, vars.index, format)
        })
        .into_owned()
}

fn special_var(name: &str, vars: &TooltipVars, format: Option<&str>) -> String {
    let value = match name {
        "index" => return vars.index.to_string(),
        "segment_index" => {
            return vars
                .segment_index
                .map_or_else(|| "???".to_string(), |j| j.to_string());
        }
        "x" => vars.x,
        "y" => vars.y,
        "sx" => vars.sx,
        "sy" => vars.sy,
        "data_x" => vars.data_x,
        "data_y" => vars.data_y,
        _ => return "???".to_string(),
    };
    format_number(value, format)
}

fn column_value(
    source: &ColumnDataSource,
    name: &str,
    index: usize,
    format: Option<&str>,
) -> String {
    let Ok(column) = source.column(name) else {
        return format!("{name} unknown");
    };
    let value = match column {
        Column::Number(v) => v.get(index).map(|x| format_number(*x, format)),
        Column::Text(v) => v.get(index).cloned(),
        Column::NumberList(v) => v.get(index).map(|row| {
            let items: Vec<String> = row.iter().map(|x| format_number(*x, format)).collect();
            format!("[{}]", items.join(", "))
        }),
    };
    value.unwrap_or_else(|| "???".to_string())
}

/// `(text, swatch)` for a `$color` field.
fn color_value(
    source: &ColumnDataSource,
    name: &str,
    index: usize,
    opts: &str,
) -> (String, Option<String>) {
    let Ok(colors) = source.texts(name) else {
        return (format!("{name} unknown"), None);
    };
    let color = match colors.get(index) {
        Some(c) if !c.is_empty() => c.clone(),
        _ => return ("(null)".to_string(), None),
    };
    let color = if opts.contains("hex") {
        to_hex(&color).unwrap_or(color)
    } else {
        color
    };
    let swatch = opts.contains("swatch").then(|| color.clone());
    (color, swatch)
}

fn to_hex(color: &str) -> Option<String> {
    let c: svgtypes::Color = color.parse().ok()?;
    Some(format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue))
}

/// Integers print plainly, magnitudes in (0.1, 1000) with three decimals, the rest in
/// scientific notation. `%d`, `%.Nf` and `%.Ne` formats override the default.
pub fn format_number(value: f64, format: Option<&str>) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    if let Some(spec) = format.and_then(parse_format) {
        return match spec {
            NumberFormat::Integer => format!("{}", value.round() as i64),
            NumberFormat::Fixed(digits) => format!("{value:.digits$}"),
            NumberFormat::Exponent(digits) => format!("{value:.digits$e}"),
        };
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.abs() > 0.1 && value.abs() < 1000.0 {
        format!("{value:.3}")
    } else {
        format!("{value:.3e}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberFormat {
    Integer,
    Fixed(usize),
    Exponent(usize),
}

fn parse_format(spec: &str) -> Option<NumberFormat> {
    let body = spec.strip_prefix('%')?;
    if body == "d" || body == "i" {
        return Some(NumberFormat::Integer);
    }
    let kind = body.chars().last()?;
    let digits = &body[..body.len() - kind.len_utf8()];
    let digits = digits.trim_start_matches('0').strip_prefix('.')?;
    let digits = digits.parse().ok()?;
    match kind {
        'f' => Some(NumberFormat::Fixed(digits)),
        'e' => Some(NumberFormat::Exponent(digits)),
        _ => {
            tracing::warn!(format = spec, "unsupported number format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ColumnDataSource {
        ColumnDataSource::from_columns([
            ("price", Column::Number(vec![12.5, 3.0])),
            ("unit price", Column::Number(vec![0.01234, 1.0])),
            ("name", Column::Text(vec!["alpha".into(), "beta".into()])),
            ("color", Column::Text(vec!["tomato".into(), String::new()])),
        ])
    }

    fn vars() -> TooltipVars {
        TooltipVars {
            index: 0,
            segment_index: None,
            x: 1.5,
            y: 2.0,
            sx: 150.0,
            sy: 42.25,
            data_x: 1.0,
            data_y: 2.0,
        }
    }

    #[test]
    fn special_vars_and_columns_expand() {
        let s = source();
        let v = vars();
        assert_eq!(replace_placeholders("$index: ($x, $y)", &s, &v), "0: (1.500, 2)");
        assert_eq!(replace_placeholders("($sx, $sy)", &s, &v), "(150, 42.250)");
        assert_eq!(replace_placeholders("$~x/$data_y", &s, &v), "1/2");
        assert_eq!(replace_placeholders("@name costs @price", &s, &v), "alpha costs 12.500");
        assert_eq!(replace_placeholders("@{unit price}", &s, &v), "1.234e-2");
        assert_eq!(replace_placeholders("@price{%0.1f} / @price{%d}", &s, &v), "12.5 / 13");
        assert_eq!(replace_placeholders("$segment_index $bogus", &s, &v), "??? ???");
        assert_eq!(replace_placeholders("@missing", &s, &v), "missing unknown");
    }

    #[test]
    fn color_fields_render_alone() {
        let s = source();
        let mut v = vars();
        let row = render_row("c", "$color[hex,swatch]:color", &s, &v);
        assert_eq!(row.value, "#ff6347");
        assert_eq!(row.swatch.as_deref(), Some("#ff6347"));

        let row = render_row("c", "$color:color", &s, &v);
        assert_eq!((row.value.as_str(), row.swatch), ("tomato", None));

        v.index = 1;
        assert_eq!(render_row("c", "$color:color", &s, &v).value, "(null)");
        assert_eq!(render_row("c", "$color:hue", &s, &v).value, "hue unknown");
    }
}
