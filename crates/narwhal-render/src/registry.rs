use crate::glyph::{Ellipse, Glyph, MultiLine, Rect, Text};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub type GlyphFactory = fn(&Value) -> Result<Glyph>;

/// Type tag -> glyph factory. Built explicitly and owned by whoever loads scenes.
#[derive(Debug, Clone)]
pub struct GlyphRegistry {
    factories: FxHashMap<String, GlyphFactory>,
}

impl Default for GlyphRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl GlyphRegistry {
    pub fn empty() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// `Ellipse`, `Rect`, `Text` and `MultiLine`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("Ellipse", |v| Ok(Glyph::Ellipse(parse::<Ellipse>("Ellipse", v)?)));
        registry.register("Rect", |v| Ok(Glyph::Rect(parse::<Rect>("Rect", v)?)));
        registry.register("Text", |v| Ok(Glyph::Text(parse::<Text>("Text", v)?)));
        registry.register("MultiLine", |v| {
            Ok(Glyph::MultiLine(parse::<MultiLine>("MultiLine", v)?))
        });
        registry
    }

    pub fn register(
        &mut self,
        tag: impl Into<String>,
        factory: GlyphFactory,
    ) -> Option<GlyphFactory> {
        self.factories.insert(tag.into(), factory)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Builds a glyph from `{"type": "<tag>", ...fields}`.
    pub fn build(&self, spec: &Value) -> Result<Glyph> {
        let tag = spec
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidGlyph {
                glyph_type: "<untyped>".to_string(),
                message: "missing string field `type`".to_string(),
            })?;
        let factory = self.factories.get(tag).ok_or_else(|| Error::UnknownGlyph {
            glyph_type: tag.to_string(),
        })?;
        factory(spec)
    }
}

fn parse<T: DeserializeOwned>(glyph_type: &str, spec: &Value) -> Result<T> {
    T::deserialize(spec).map_err(|err| Error::InvalidGlyph {
        glyph_type: glyph_type.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visuals::{SpatialUnits, Spec};
    use serde_json::json;

    #[test]
    fn builds_builtin_glyphs_from_tagged_json() {
        let registry = GlyphRegistry::default();
        assert_eq!(registry.tags(), vec!["Ellipse", "MultiLine", "Rect", "Text"]);

        let glyph = registry
            .build(&json!({
                "type": "Ellipse",
                "x": {"field": "x"},
                "y": {"field": "y"},
                "width": {"value": 12, "units": "screen"},
                "height": 0.5,
            }))
            .unwrap();
        let Glyph::Ellipse(ellipse) = glyph else {
            panic!("expected an ellipse");
        };
        assert_eq!(ellipse.width.units, SpatialUnits::Screen);
        assert_eq!(ellipse.height.units, SpatialUnits::Data);
        assert_eq!(ellipse.angle, Spec::Value(0.0));
    }

    #[test]
    fn reports_unknown_and_malformed_specs() {
        let registry = GlyphRegistry::default();
        let unknown = registry.build(&json!({"type": "Wedge"})).unwrap_err();
        assert!(matches!(unknown, Error::UnknownGlyph { glyph_type } if glyph_type == "Wedge"));

        let malformed = registry.build(&json!({"type": "Rect", "x": 1})).unwrap_err();
        assert!(matches!(
            malformed,
            Error::InvalidGlyph { glyph_type, .. } if glyph_type == "Rect"
        ));

        let mut empty = GlyphRegistry::empty();
        assert!(!empty.contains("Text"));
        empty.register("Text", |v| Ok(Glyph::Text(parse::<Text>("Text", v)?)));
        assert!(empty.build(&json!({"type": "Text", "x": 1, "y": 2, "text": "hi"})).is_ok());
    }
}
