//! Descriptive statistics for a data list, Pearson and Spearman correlation
//! of paired lists, and the contingency coefficient of a frequency table.

pub mod contingency;
pub mod correlation;
pub mod descriptive;
pub mod error;

pub use contingency::{ContingencyReport, ContingencyStrength, contingency};
pub use correlation::{
    Coefficient, CorrelationReport, Direction, Strength, correlate, pearson, rank, spearman,
};
pub use descriptive::{Summary, VarianceKind, quartiles, summarize};
pub use error::{DescribeError, Result};
