#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] narwhal_core::Error),
    #[error(transparent)]
    Layout(#[from] beluga::Error),
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported glyph type: {glyph_type}")]
    UnknownGlyph { glyph_type: String },
    #[error("invalid {glyph_type} glyph: {message}")]
    InvalidGlyph { glyph_type: String, message: String },
    #[error("unknown data source: {name}")]
    UnknownSource { name: String },
    #[error("unknown renderer: {index}")]
    UnknownRenderer { index: usize },
    #[error("cannot auto-range {axis}: no renderer has finite bounds")]
    EmptyBounds { axis: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
