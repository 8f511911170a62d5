#![forbid(unsafe_code)]

//! Interactive tools for narwhal plots.
//!
//! Tools receive [`event::UiEvent`]s together with `&mut Plot` and edit the plot's data sources
//! in place: [`poly_draw::PolyDrawTool`] draws new multi-line rows, [`poly_edit::PolyEditTool`]
//! edits the vertices of an existing row and [`hover::HoverTool`] builds tooltips for the rows
//! under the pointer. [`manager::ToolManager`] routes events between them and
//! [`registry::ToolRegistry`] builds them from JSON tool specs.

pub mod edit;
pub mod error;
pub mod event;
pub mod hover;
pub mod manager;
pub mod poly_draw;
pub mod poly_edit;
pub mod registry;
pub mod template;

pub use error::{Error, Result};
pub use event::{Key, UiEvent};
pub use hover::{HoverMode, HoverOptions, HoverTool, LinePolicy, PointPolicy, Tooltip};
pub use manager::{Tool, ToolId, ToolManager};
pub use poly_draw::{PolyDrawOptions, PolyDrawTool};
pub use poly_edit::{EditTarget, PolyEditOptions, PolyEditTool};
pub use registry::{ToolFactory, ToolRegistry};
pub use template::{TooltipRow, TooltipVars};
