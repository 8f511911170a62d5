use crate::hover::{HoverOptions, HoverTool};
use crate::manager::Tool;
use crate::poly_draw::{PolyDrawOptions, PolyDrawTool};
use crate::poly_edit::{PolyEditOptions, PolyEditTool};
use crate::{Error, Result};
use narwhal_render::{Plot, RendererId};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub type ToolFactory = fn(&Value, &Plot) -> Result<Tool>;

/// Type tag -> tool factory, owned by whoever loads tool scripts.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    factories: FxHashMap<String, ToolFactory>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// `poly_draw`, `poly_edit` and `hover`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("poly_draw", |spec, plot| {
            let mut options: PolyDrawOptions = parse("poly_draw", spec)?;
            options.renderers = known_renderers(plot, options.renderers);
            Ok(Tool::PolyDraw(PolyDrawTool::new(plot, options)?))
        });
        registry.register("poly_edit", |spec, plot| {
            let mut options: PolyEditOptions = parse("poly_edit", spec)?;
            options.renderers = known_renderers(plot, options.renderers);
            Ok(Tool::PolyEdit(PolyEditTool::new(plot, options)?))
        });
        registry.register("hover", |spec, plot| {
            let mut options: HoverOptions = parse("hover", spec)?;
            options.renderers = known_renderers(plot, options.renderers);
            Ok(Tool::Hover(HoverTool::new(options)))
        });
        registry
    }

    pub fn register(
        &mut self,
        tag: impl Into<String>,
        factory: ToolFactory,
    ) -> Option<ToolFactory> {
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

    /// Builds a tool from `{"type": "<tag>", ...options}` against `plot`.
    pub fn build(&self, spec: &Value, plot: &Plot) -> Result<Tool> {
        let tag = spec
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidTool {
                tool_type: "<untyped>".to_string(),
                message: "missing string field `type`".to_string(),
            })?;
        let factory = self.factories.get(tag).ok_or_else(|| Error::UnknownTool {
            tool_type: tag.to_string(),
        })?;
        factory(spec, plot)
    }
}

fn parse<T: DeserializeOwned>(tool_type: &str, spec: &Value) -> Result<T> {
    T::deserialize(spec).map_err(|err| Error::InvalidTool {
        tool_type: tool_type.to_string(),
        message: err.to_string(),
    })
}

/// Drops (with a warning) renderer ids the plot does not have.
fn known_renderers(plot: &Plot, ids: Vec<RendererId>) -> Vec<RendererId> {
    ids.into_iter()
        .filter(|&id| {
            let known = plot.renderer(id).is_ok();
            if !known {
                tracing::warn!(renderer = id, "tool spec names an unknown renderer");
            }
            known
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_core::{Column, ColumnDataSource};
    use narwhal_render::{Glyph, GlyphRenderer, MultiLine, Visuals};
    use serde_json::json;

    fn plot() -> Plot {
        let mut plot = Plot::new(100.0, 100.0, Default::default()).unwrap();
        plot.add_source(
            "lines",
            ColumnDataSource::from_columns([
                ("xs", Column::NumberList(Vec::new())),
                ("ys", Column::NumberList(Vec::new())),
            ]),
        );
        plot.add_renderer(GlyphRenderer::new(
            "lines",
            "lines",
            Glyph::MultiLine(MultiLine::new("xs", "ys")),
            Visuals::default(),
        ))
        .unwrap();
        plot
    }

    #[test]
    fn builds_tools_and_drops_unknown_renderers() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.tags(), vec!["hover", "poly_draw", "poly_edit"]);
        let plot = plot();

        let tool = registry
            .build(&json!({"type": "poly_draw", "renderers": [0, 7], "num_objects": 3}), &plot)
            .unwrap();
        let Tool::PolyDraw(draw) = tool else {
            panic!("expected poly draw");
        };
        assert_eq!(draw.options().renderers, vec![0]);
        assert_eq!(draw.options().num_objects, 3);
        assert!(draw.options().drag);

        let hover = registry.build(&json!({"type": "hover", "mode": "vline"}), &plot).unwrap();
        assert!(!hover.is_gesture());
    }

    #[test]
    fn rejects_bad_specs() {
        let registry = ToolRegistry::default();
        let plot = plot();
        assert!(matches!(
            registry.build(&json!({"type": "lasso"}), &plot),
            Err(Error::UnknownTool { .. })
        ));
        assert!(matches!(
            registry.build(&json!({"type": "poly_draw", "renderers": [9]}), &plot),
            Err(Error::InvalidTool { .. })
        ));
        // The vertex renderer must be a point glyph.
        assert!(matches!(
            registry.build(
                &json!({"type": "poly_edit", "renderers": [0], "vertex_renderer": 0}),
                &plot
            ),
            Err(Error::NotEditable { .. })
        ));
    }
}
