use crate::types::TypeId;
use thiserror::Error;

/// Failures reported by the reference host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown type {0}")]
    UnknownType(TypeId),

    #[error("{0} is not a generic type definition")]
    NotGenericDefinition(String),

    #[error("{definition} expects {expected} type arguments, got {actual}")]
    ArityMismatch {
        definition: String,
        expected: usize,
        actual: usize,
    },

    #[error("array rank must be between 1 and {max}, got {rank}")]
    InvalidRank { rank: u32, max: u8 },

    #[error("{0} is not a generic parameter")]
    NotGenericParameter(String),

    #[error("type instantiation exceeded depth {limit}")]
    InstantiationTooDeep { limit: u32 },

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A member body (property getter, method) failed inside the host.
    #[error("host member failed: {0}")]
    Host(String),
}
