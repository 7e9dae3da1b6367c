//! Error types for the model bridge.

use thiserror::Error;

use crate::types::SpecialType;

/// Model bridge errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A submitted date or date-time could not be read.
    #[error("invalid {kind} value for {field}: {value}")]
    InvalidDate {
        field: String,
        kind: SpecialType,
        value: String,
    },

    /// No free slug was found for a unique-slug field.
    #[error("no unique slug available for {0}")]
    SlugExhausted(String),

    /// Declared field types could not be parsed.
    #[error("invalid field types: {0}")]
    Types(#[from] serde_json::Error),

    /// The backing store reported a failure.
    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias for model bridge operations.
pub type Result<T> = std::result::Result<T, ModelError>;
