use crate::event::UiEvent;
use crate::hover::{HoverTool, Tooltip};
use crate::poly_draw::PolyDrawTool;
use crate::poly_edit::PolyEditTool;
use crate::{Error, Result};
use narwhal_render::Plot;

pub type ToolId = usize;

#[derive(Debug)]
pub enum Tool {
    PolyDraw(PolyDrawTool),
    PolyEdit(PolyEditTool),
    Hover(HoverTool),
}

impl Tool {
    pub fn type_name(&self) -> &'static str {
        match self {
            Tool::PolyDraw(_) => "poly_draw",
            Tool::PolyEdit(_) => "poly_edit",
            Tool::Hover(_) => "hover",
        }
    }

    /// Gesture tools take taps, pans and keys; only one is active at a time.
    pub fn is_gesture(&self) -> bool {
        !matches!(self, Tool::Hover(_))
    }

    pub fn is_active(&self) -> bool {
        match self {
            Tool::PolyDraw(t) => t.is_active(),
            Tool::PolyEdit(t) => t.is_active(),
            Tool::Hover(t) => t.is_active(),
        }
    }

    pub fn activate(&mut self, plot: &mut Plot) -> Result<()> {
        match self {
            Tool::PolyDraw(t) => t.activate(plot),
            Tool::PolyEdit(t) => t.activate(plot),
            Tool::Hover(t) => t.activate(plot),
        }
    }

    pub fn deactivate(&mut self, plot: &mut Plot) -> Result<()> {
        match self {
            Tool::PolyDraw(t) => t.deactivate(plot),
            Tool::PolyEdit(t) => t.deactivate(plot),
            Tool::Hover(t) => t.deactivate(plot),
        }
    }

    pub fn handle(&mut self, plot: &mut Plot, event: &UiEvent) -> Result<()> {
        match self {
            Tool::PolyDraw(t) => t.handle(plot, event),
            Tool::PolyEdit(t) => t.handle(plot, event),
            Tool::Hover(t) => t.handle(plot, event),
        }
    }
}

/// Owns the tools of one plot and routes events to them.
#[derive(Debug, Default)]
pub struct ToolManager {
    tools: Vec<Tool>,
    gesture: Option<ToolId>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tool: Tool) -> ToolId {
        self.tools.push(tool);
        self.tools.len() - 1
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn tool(&self, id: ToolId) -> Result<&Tool> {
        self.tools.get(id).ok_or(Error::UnknownToolId { index: id })
    }

    pub fn tool_mut(&mut self, id: ToolId) -> Result<&mut Tool> {
        self.tools.get_mut(id).ok_or(Error::UnknownToolId { index: id })
    }

    /// The active gesture tool, if any.
    pub fn active_gesture(&self) -> Option<ToolId> {
        self.gesture
    }

    /// Activates `id`. Activating a gesture tool first deactivates the current one.
    pub fn activate(&mut self, plot: &mut Plot, id: ToolId) -> Result<()> {
        if self.tool(id)?.is_gesture() {
            if self.gesture == Some(id) {
                return Ok(());
            }
            if let Some(previous) = self.gesture.take() {
                self.tool_mut(previous)?.deactivate(plot)?;
            }
            self.gesture = Some(id);
        }
        let tool = self.tool_mut(id)?;
        tracing::debug!(tool = tool.type_name(), id, "activating tool");
        tool.activate(plot)
    }

    pub fn deactivate(&mut self, plot: &mut Plot, id: ToolId) -> Result<()> {
        if self.gesture == Some(id) {
            self.gesture = None;
        }
        let tool = self.tool_mut(id)?;
        tracing::debug!(tool = tool.type_name(), id, "deactivating tool");
        tool.deactivate(plot)
    }

    /// Sends gesture and key events to the active gesture tool; moves also reach every
    /// inspector.
    pub fn handle(&mut self, plot: &mut Plot, event: &UiEvent) -> Result<()> {
        tracing::trace!(event = event.name(), "dispatching");
        if let Some(id) = self.gesture {
            self.tool_mut(id)?.handle(plot, event)?;
        }
        if event.is_move() {
            for tool in self.tools.iter_mut().filter(|t| !t.is_gesture()) {
                tool.handle(plot, event)?;
            }
        }
        Ok(())
    }

    /// Tooltips of every active hover tool.
    pub fn tooltips(&self) -> Vec<&Tooltip> {
        self.tools
            .iter()
            .filter_map(|t| match t {
                Tool::Hover(h) if h.is_active() => Some(h.tooltips()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
