use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 13.0,
            font_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free measurement: every terminal column is `char_width_factor * font_size` wide and
/// every line `line_height_factor * font_size` tall. Wide (CJK) characters count as two columns.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let font_size = style.font_size.max(1.0);
        let mut line_count = 0usize;
        let mut max_columns = 0usize;
        for line in text.split('\n') {
            line_count += 1;
            max_columns = max_columns.max(line.width());
        }

        TextMetrics {
            width: max_columns as f64 * font_size * char_width_factor,
            height: line_count as f64 * font_size * line_height_factor,
            line_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_characters_take_two_columns() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle {
            font_size: 10.0,
            ..TextStyle::default()
        };
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        let ascii = m.measure("ab", &style);
        let wide = m.measure("日本", &style);
        assert!(close(ascii.width, 12.0));
        assert!(close(wide.width, 24.0));

        let two_lines = m.measure("a\nbcd", &style);
        assert_eq!(two_lines.line_count, 2);
        assert!(close(two_lines.width, 18.0));
        assert!(close(two_lines.height, 24.0));
    }
}
