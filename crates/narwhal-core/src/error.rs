use crate::source::ColumnKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("column not found: {name}")]
    MissingColumn { name: String },

    #[error("column {name} holds {actual} values, expected {expected}")]
    ColumnType {
        name: String,
        expected: ColumnKind,
        actual: ColumnKind,
    },

    #[error("index {index} out of bounds for {name} (len {len})")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("column {name} has length {actual}, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid scale: {message}")]
    InvalidScale { message: String },
}
