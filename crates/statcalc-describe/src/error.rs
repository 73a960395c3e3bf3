//! Errors for descriptive and correlation measures.

use statcalc_dist::DistError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescribeError {
    #[error("data list must not be empty")]
    Empty,

    #[error("{what} needs at least {needed} values (got {got})")]
    TooFew {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("x and y must have the same length (got {x} and {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("invalid contingency table: {0}")]
    InvalidTable(String),

    #[error("value must be finite (got {0})")]
    NotFinite(f64),

    #[error(transparent)]
    Dist(#[from] DistError),
}

pub type Result<T> = std::result::Result<T, DescribeError>;
