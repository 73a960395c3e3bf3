//! Inferential statistics on top of the formula solver and distributions:
//! hypothesis tests with decisions, confidence intervals, power, effect
//! sizes and the registry-driven z-score and k-sigma calculators.

pub mod decision;
pub mod effect;
pub mod error;
pub mod hypothesis;
pub mod input;
pub mod interval;
pub mod power;
pub mod score;

pub use decision::{Critical, Decision, critical_values, decide};
pub use effect::{CohensReport, EffectSize, cohens_d};
pub use error::{InferError, Result};
pub use hypothesis::{HypothesisInput, HypothesisReport, TestKind};
pub use interval::{Bounds, IntervalInput, IntervalKind, IntervalReport};
pub use power::{PowerInput, PowerKind, PowerLabel, PowerReport, Target};
pub use score::{FormulaReport, evaluate, k_sigma, z_score};

use statcalc_dist::Tail;

/// Configured fallbacks for arguments a calculator needs but the user left out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defaults {
    pub alpha: f64,
    pub tail: Tail,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            tail: Tail::TwoSided,
        }
    }
}
