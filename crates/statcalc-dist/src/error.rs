//! Distribution evaluator errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistError {
    /// Parameters outside the distribution's support.
    #[error("parameter error: {0}")]
    Parameter(String),

    /// A probability or significance level outside its range.
    #[error("domain error: {0}")]
    Domain(String),

    /// A mode or tail name that is not recognized.
    #[error("invalid {kind} '{value}' (expected one of: {expected})")]
    InvalidChoice {
        kind: &'static str,
        value: String,
        expected: String,
    },
}

/// A specialized `Result` type for distribution operations.
pub type Result<T> = std::result::Result<T, DistError>;
