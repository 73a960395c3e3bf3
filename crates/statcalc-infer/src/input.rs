//! Argument keys shared by the inference calculators.

use statcalc_dist::Tail;
use statcalc_formula::{Assignments, Bindings, Entry};

use crate::error::{InferError, Result};

pub const ALPHA: &[&str] = &[
    "alpha",
    "α",
    "signifikanzniveau",
    "signifikanz",
    "irrtumswahrscheinlichkeit",
];
pub const TAIL: &[&str] = &["test", "testart", "art", "tail", "seite", "side"];
pub const SIGMA: &[&str] = &["sigma", "σ", "std_pop", "standardabweichung_population"];
pub const SAMPLE_SD: &[&str] = &["s", "std", "standardabweichung_stichprobe"];
pub const VARIANCE: &[&str] = &["shoch2", "s^2", "s2", "var", "varianz", "variance"];
pub const P_VALUE: &[&str] = &["p", "p_wert", "pwert", "p-value", "pvalue", "p_value"];

/// Significance level, if given.
pub fn alpha(args: &mut Assignments) -> Result<Option<f64>> {
    Ok(args.number(ALPHA)?.value())
}

/// Alternative hypothesis, if given.
pub fn tail(args: &mut Assignments) -> Result<Option<Tail>> {
    args.take(TAIL)
        .filter(|raw| !raw.trim().is_empty() && raw.trim() != "-")
        .map(|raw| raw.parse::<Tail>().map_err(InferError::from))
        .transpose()
}

/// A probability that may be written as a percentage: values above 1 are
/// divided by 100.
pub fn percent(value: f64) -> f64 {
    if value > 1.0 { value / 100.0 } else { value }
}

/// Record an entry in `bindings` under `name` if it was given at all.
pub fn bind(bindings: &mut Bindings, name: &str, entry: Entry) {
    if entry.is_given() {
        bindings.set(name, entry.value());
    }
}

/// Require a value that has no sensible default.
pub fn require(value: Option<f64>, what: &str) -> Result<f64> {
    value.ok_or_else(|| InferError::MissingInput(what.to_string()))
}
