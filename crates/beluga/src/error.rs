#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("constraint references an unknown variable: {index}")]
    UnknownVariable { index: usize },
    #[error("unknown constraint id: {id}")]
    UnknownConstraint { id: usize },
    #[error("variable {name} is already an edit variable")]
    DuplicateEditVariable { name: String },
    #[error("variable {name} is not an edit variable")]
    UnknownEditVariable { name: String },
    #[error("edit variables cannot use the required strength")]
    RequiredEditStrength,
    #[error("required constraints cannot be satisfied (residual {residual})")]
    Unsatisfiable { residual: f64 },
    #[error("linear solve failed: {message}")]
    Numerical { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
