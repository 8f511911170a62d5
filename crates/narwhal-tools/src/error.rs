#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] narwhal_core::Error),
    #[error(transparent)]
    Render(#[from] narwhal_render::Error),
    #[error("tool spec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported tool type: {tool_type}")]
    UnknownTool { tool_type: String },
    #[error("invalid {tool_type} tool: {message}")]
    InvalidTool { tool_type: String, message: String },
    #[error("renderer {renderer} cannot be edited: {reason}")]
    NotEditable { renderer: String, reason: String },
    #[error("unknown tool: {index}")]
    UnknownToolId { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
