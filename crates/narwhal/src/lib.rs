#![forbid(unsafe_code)]

//! `narwhal` is a headless 2D glyph plotting core with interactive vertex edit tools.
//!
//! Scenes are JSON files describing data sources and glyph renderers ([`render::PlotSpec`]).
//! A loaded [`Plot`] renders to SVG, answers hit-tests, and is edited in place by the tools in
//! [`tools`] through a [`ToolManager`]. [`Headless`] bundles the glyph and tool registries for
//! the common load / replay / render round-trip.
//!
//! # Features
//!
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use beluga as layout;
pub use narwhal_core as model;
pub use narwhal_render as render;
pub use narwhal_tools as tools;

pub use narwhal_render::{GlyphRegistry, Plot};
pub use narwhal_tools::{Tool, ToolManager, ToolRegistry, Tooltip, UiEvent};

#[cfg(feature = "raster")]
pub mod raster;

use narwhal_core::{ColumnData, Selection};
use narwhal_tools::ToolId;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Render(#[from] narwhal_render::Error),
    #[error(transparent)]
    Tools(#[from] narwhal_tools::Error),
    #[error("tool script error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HeadlessError>;

/// A recorded interaction: tools to build, the gesture tool to activate and the events to feed.
///
/// Inspectors (hover tools) are always activated; `active` names the gesture tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolScript {
    /// `{"type": "<tool tag>", ...options}` specs, resolved through a [`ToolRegistry`].
    pub tools: Vec<serde_json::Value>,
    pub active: Option<ToolId>,
    pub events: Vec<UiEvent>,
}

impl ToolScript {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Serialize)]
struct SourceSnapshot<'a> {
    data: &'a ColumnData,
    selected: &'a Selection,
}

/// A plot together with the tools driving it.
#[derive(Debug)]
pub struct Session {
    pub plot: Plot,
    pub manager: ToolManager,
}

impl Session {
    pub fn handle(&mut self, event: &UiEvent) -> Result<()> {
        Ok(self.manager.handle(&mut self.plot, event)?)
    }

    pub fn tooltips(&self) -> Vec<&Tooltip> {
        self.manager.tooltips()
    }

    /// Columns and selection of every data source, in declaration order.
    pub fn sources_json(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (name, source) in self.plot.sources() {
            let snapshot = SourceSnapshot {
                data: source.data(),
                selected: &source.selected,
            };
            out.insert(name.to_string(), serde_json::to_value(snapshot)?);
        }
        Ok(serde_json::Value::Object(out))
    }
}

/// Glyph and tool registries plus the convenience entry points built on them.
#[derive(Debug, Clone, Default)]
pub struct Headless {
    pub glyphs: GlyphRegistry,
    pub tools: ToolRegistry,
}

impl Headless {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_scene(&self, text: &str) -> Result<Plot> {
        Ok(Plot::from_json(text, &self.glyphs)?)
    }

    pub fn render_svg_sync(&self, scene: &str) -> Result<String> {
        Ok(self.load_scene(scene)?.render_svg()?)
    }

    /// Builds the script's tools against `plot` and activates them, without feeding events.
    pub fn session(&self, mut plot: Plot, script: &ToolScript) -> Result<Session> {
        let mut manager = ToolManager::new();
        for spec in &script.tools {
            let tool = self.tools.build(spec, &plot)?;
            manager.add(tool);
        }
        for id in 0..manager.tools().len() {
            if !manager.tool(id)?.is_gesture() {
                manager.activate(&mut plot, id)?;
            }
        }
        if let Some(id) = script.active {
            manager.activate(&mut plot, id)?;
        }
        Ok(Session { plot, manager })
    }

    /// Loads `scene`, then replays `script` against it.
    pub fn replay_sync(&self, scene: &str, script: &ToolScript) -> Result<Session> {
        let plot = self.load_scene(scene)?;
        let mut session = self.session(plot, script)?;
        for event in &script.events {
            session.handle(event)?;
        }
        tracing::debug!(
            tools = script.tools.len(),
            events = script.events.len(),
            "replayed tool script"
        );
        Ok(session)
    }

    #[cfg(feature = "raster")]
    pub fn render_png_sync(
        &self,
        scene: &str,
        raster: &raster::RasterOptions,
    ) -> raster::Result<Vec<u8>> {
        raster::render_png_sync(&self.load_scene(scene)?, raster)
    }

    #[cfg(feature = "raster")]
    pub fn render_jpeg_sync(
        &self,
        scene: &str,
        raster: &raster::RasterOptions,
    ) -> raster::Result<Vec<u8>> {
        raster::render_jpeg_sync(&self.load_scene(scene)?, raster)
    }

    #[cfg(feature = "raster")]
    pub fn render_pdf_sync(&self, scene: &str) -> raster::Result<Vec<u8>> {
        raster::render_pdf_sync(&self.load_scene(scene)?)
    }
}
