//! Entitlement editing errors

use thiserror::Error;

/// Reasons an edit is rejected. A rejected edit never touches the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("No entry with id {0}")]
    NotFound(String),

    #[error("Feature {feature_id} is {actual}, edit requires {expected}")]
    TypeMismatch {
        feature_id: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Value already present: {0}")]
    DuplicateValue(String),

    #[error("Index {index} out of range for {len} values")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type EditResult<T> = Result<T, EditError>;
