//! Inference errors.

use statcalc_dist::DistError;
use statcalc_formula::FormulaError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferError {
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Dist(#[from] DistError),

    /// A required argument was not given.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Inputs that are individually valid but cannot be combined.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A combination of unknowns this calculator cannot solve for.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// A specialized `Result` type for inference operations.
pub type Result<T> = std::result::Result<T, InferError>;
