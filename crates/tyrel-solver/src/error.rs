use thiserror::Error;
use tyrel_model::ModelError;

/// Failures of analyzer operations.
///
/// Validation-category errors are raised at the API boundary and propagate
/// unchanged through recursive helpers. Predicate operations
/// (`satisfies_constraints`, `is_implements_generic_definition`, ...) never
/// return these; they answer `false` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Wrong type category, empty input, or arity mismatch.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{candidate} does not satisfy the constraints of {parameter}")]
    ConstraintViolation { parameter: String, candidate: String },

    #[error("{ty} has no ancestor constructed from {definition}")]
    NoSuchAncestor { ty: String, definition: String },

    #[error("argument mismatch in {context}: expected {expected}, found {actual}")]
    ArgumentMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Array rank mismatch, unreachable element type, runaway nesting.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    #[error(transparent)]
    Model(ModelError),
}

impl From<ModelError> for AnalysisError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ArityMismatch { .. }
            | ModelError::NotGenericDefinition(_)
            | ModelError::NotGenericParameter(_) => Self::InvalidArgument(err.to_string()),
            ModelError::InvalidRank { .. } | ModelError::InstantiationTooDeep { .. } => {
                Self::UnsupportedShape(err.to_string())
            }
            other => Self::Model(other),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
