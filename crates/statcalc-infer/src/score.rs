//! Registry-driven calculators: z-scores, k-sigma intervals and free-form
//! resolution of any formula system.

use serde::Serialize;
use statcalc_formula::{Assignments, Bindings, FormulaRegistry, Resolution, resolve};
use tracing::debug;

use crate::error::Result;
use crate::input;

const CONF: &[&str] = &["conf", "konfidenzniveau", "wahrscheinlichkeit", "prob", "p"];

/// Result of resolving a formula system from command-line values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaReport {
    /// Formula ids in resolution order.
    pub system: Vec<String>,
    /// Every value known after resolution.
    pub values: Bindings,
    pub resolution: Resolution,
}

impl FormulaReport {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name)
    }
}

/// Bind `args` to the variables of the formulas `ids` and resolve them.
pub fn evaluate(
    registry: &FormulaRegistry,
    ids: &[&str],
    args: &mut Assignments,
    tolerance: f64,
) -> Result<FormulaReport> {
    let mut bindings = Bindings::new();
    evaluate_with(registry, ids, args, &mut bindings, tolerance)
}

/// Like [`evaluate`], starting from values bound by the caller.
pub fn evaluate_with(
    registry: &FormulaRegistry,
    ids: &[&str],
    args: &mut Assignments,
    bindings: &mut Bindings,
    tolerance: f64,
) -> Result<FormulaReport> {
    let system = registry.system(ids)?;
    args.bind_formulas(&system, bindings)?;
    let resolution = resolve(&system, bindings, tolerance)?;
    debug!(
        system = ?ids,
        solved = resolution.derivation.steps().len(),
        verified = resolution.verifications.len(),
        "resolved formula system"
    );
    Ok(FormulaReport {
        system: ids.iter().map(|id| id.to_string()).collect(),
        values: bindings.clone(),
        resolution,
    })
}

/// Z-score calculator over `z = (x - mu) / sigma` and `p = Phi(z)`.
///
/// A variance `var` stands in for `sigma`; when both are given they are
/// cross-checked and `sigma` is used.
pub fn z_score(
    registry: &FormulaRegistry,
    args: &mut Assignments,
    tolerance: f64,
) -> Result<FormulaReport> {
    let mut bindings = Bindings::new();
    let var = args.number(&["var", "varianz", "variance"])?;
    input::bind(&mut bindings, "var", var);

    let ids: &[&str] = if var.is_given() {
        &["variance", "normal-cdf", "z-score"]
    } else {
        &["normal-cdf", "z-score"]
    };
    evaluate_with(registry, ids, args, &mut bindings, tolerance)
}

/// k-sigma interval `[mu - k*sigma, mu + k*sigma]` with its coverage
/// `Phi(k) - Phi(-k)`. A coverage `conf` above 1 is read as a percentage.
pub fn k_sigma(
    registry: &FormulaRegistry,
    args: &mut Assignments,
    tolerance: f64,
) -> Result<FormulaReport> {
    let mut bindings = Bindings::new();
    let conf = args.number(CONF)?;
    if conf.is_given() {
        bindings.set("conf", conf.value().map(input::percent));
    }
    evaluate_with(
        registry,
        &["k-sigma-coverage", "k-sigma-lower", "k-sigma-upper"],
        args,
        &mut bindings,
        tolerance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use statcalc_formula::FormulaError;

    use crate::error::InferError;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn args(list: &[&str]) -> Assignments {
        Assignments::parse(list).unwrap()
    }

    #[test]
    fn z_score_from_probability() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["p=0.95", "mu=100", "sigma=15", "x=-"]);
        let r = z_score(&reg, &mut a, 1e-4).unwrap();
        a.finish().unwrap();
        assert!(approx(r.value("z").unwrap(), 1.644854, 1e-6));
        assert!(approx(r.value("x").unwrap(), 124.672804, 1e-5));
        let order: Vec<&str> = r.resolution.derivation.steps().iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(order, vec!["z", "x"]);
    }

    #[test]
    fn z_score_from_variance() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["x=130", "mu=100", "var=225"]);
        let r = z_score(&reg, &mut a, 1e-4).unwrap();
        assert_eq!(r.value("sigma"), Some(15.0));
        assert_eq!(r.value("z"), Some(2.0));
        assert!(approx(r.value("p").unwrap(), 0.977250, 1e-6));
    }

    #[test]
    fn z_score_fully_bound_is_verified() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["x=130", "mu=100", "sigma=15", "z=2.5", "p=0.5"]);
        let r = z_score(&reg, &mut a, 1e-4).unwrap();
        assert!(r.resolution.derivation.is_empty());
        assert_eq!(r.resolution.verifications.len(), 2);
        assert!(r.resolution.has_inconsistency());
    }

    #[test]
    fn z_score_needs_enough_values() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["mu=100"]);
        let err = z_score(&reg, &mut a, 1e-4).unwrap_err();
        assert!(matches!(err, InferError::Formula(FormulaError::InsufficientInput { .. })));
    }

    #[test]
    fn k_sigma_from_percent() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["mu=100", "sigma=15", "conf=95"]);
        let r = k_sigma(&reg, &mut a, 1e-4).unwrap();
        assert!(approx(r.value("k").unwrap(), 1.959964, 1e-6));
        assert!(approx(r.value("lower").unwrap(), 70.600540, 1e-5));
        assert!(approx(r.value("upper").unwrap(), 129.399460, 1e-5));
    }

    #[test]
    fn k_sigma_from_z() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["mu=0", "sigma=1", "z=2"]);
        let r = k_sigma(&reg, &mut a, 1e-4).unwrap();
        assert!(approx(r.value("conf").unwrap(), 0.954500, 1e-6));
        assert_eq!(r.value("lower"), Some(-2.0));
    }

    #[test]
    fn k_sigma_rejects_non_positive_sigma() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["mu=0", "sigma=0", "k=2"]);
        assert!(matches!(
            k_sigma(&reg, &mut a, 1e-4),
            Err(InferError::Formula(FormulaError::Domain(_)))
        ));
    }

    #[test]
    fn evaluate_arbitrary_system() {
        let reg = FormulaRegistry::builtin();
        let mut a = args(&["z=1.5", "mu=100", "sigma=15"]);
        let r = evaluate(&reg, &["z-score"], &mut a, 1e-4).unwrap();
        assert_eq!(r.value("x"), Some(122.5));
        assert_eq!(r.system, vec!["z-score".to_string()]);
    }
}
