//! Error types for Compositional Grammar parsing.

use thiserror::Error;

/// Errors that can occur while parsing a Compositional Grammar expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Parse error at a specific byte position in the input.
    #[error("parse error at position {position}: {message}")]
    ParseError {
        /// Position in the input where the error occurred.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// Input was empty or all whitespace.
    #[error("empty expression")]
    EmptyExpression,

    /// A concept reference's id failed SCTID validation.
    #[error("invalid concept id: {0}")]
    InvalidConceptId(String),
}

/// Result type for this crate's operations.
pub type ExprResult<T> = std::result::Result<T, ExprError>;
