use thiserror::Error;
use tyrel_model::ModelError;
use tyrel_solver::AnalysisError;

/// Failures of member-path resolution and compiled access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("invalid member path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{ty} has no {kind} member '{member}'")]
    MemberNotFound {
        ty: String,
        member: String,
        kind: &'static str,
    },

    #[error("member '{0}' cannot be read")]
    NotReadable(String),

    #[error("member '{0}' cannot be written")]
    NotWritable(String),

    #[error("{0} is not indexable")]
    NotIndexable(String),

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("null target while evaluating '{0}'")]
    NullTarget(String),

    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("no overload of '{method}' accepts ({arguments})")]
    NoMatchingOverload { method: String, arguments: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AccessError {
    /// Host failures that are really bounds failures keep their own kind.
    pub(crate) fn from_host(err: ModelError) -> Self {
        match err {
            ModelError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
            other => Self::Model(other),
        }
    }
}
