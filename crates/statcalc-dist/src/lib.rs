//! Probability distributions used by the statcalc calculators.
//!
//! Counting distributions are evaluated under a [`Comparison`] mode
//! (`P(X <= k)`, `P(X >= k)`, ...). The continuous references (standard
//! normal, Student-t, chi-squared) supply critical values and p-values per
//! [`Tail`], and [`noncentral_t_cdf`] backs small-sample power.

pub mod continuous;
pub mod discrete;
pub mod enums;
pub mod error;
pub mod noncentral;

pub use continuous::{Reference, check_alpha, normal_cdf, normal_ppf};
pub use discrete::{
    BinomialModel, CountProbability, CountingDistribution, HypergeometricModel, PoissonModel,
    count, probability,
};
pub use enums::{Comparison, Tail};
pub use error::{DistError, Result};
pub use noncentral::noncentral_t_cdf;
