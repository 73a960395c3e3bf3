//! Built-in formula registry keyed by formula name.

use std::collections::BTreeMap;

use statrs::function::erf::{erfc, erfc_inv};

use crate::engine::validate_formula;
use crate::types::{Bindings, Domain, Formula, FormulaError, Variable};

/// Formulas keyed by id.
#[derive(Debug, Default)]
pub struct FormulaRegistry {
    formulas: BTreeMap<&'static str, Formula>,
}

impl FormulaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in formula.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for formula in [
            normal_cdf(),
            variance(),
            z_score(),
            cohens_d(),
            z_test(),
            t_test(),
            k_sigma_coverage(),
            k_sigma_bound("k-sigma-lower", "lower", -1.0),
            k_sigma_bound("k-sigma-upper", "upper", 1.0),
        ] {
            reg.formulas.insert(formula.id, formula);
        }
        reg
    }

    /// Add a formula after checking its expression templates.
    pub fn register(&mut self, formula: Formula) -> Result<(), FormulaError> {
        validate_formula(&formula)?;
        self.formulas.insert(formula.id, formula);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Formula, FormulaError> {
        self.formulas
            .get(id)
            .ok_or_else(|| FormulaError::UnknownFormula(id.to_string()))
    }

    /// Look up several formulas, preserving order.
    pub fn system(&self, ids: &[&str]) -> Result<Vec<&Formula>, FormulaError> {
        ids.iter().map(|id| self.get(id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.formulas.values()
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Formula definitions
// ---------------------------------------------------------------------------

fn var(
    name: &'static str,
    description: &'static str,
    aliases: &'static [&'static str],
    domain: Domain,
    expression: &'static str,
    solve: impl Fn(&Bindings) -> Result<f64, FormulaError> + Send + Sync + 'static,
) -> Variable {
    Variable {
        name,
        description,
        aliases,
        domain,
        expression,
        solve: Box::new(solve),
    }
}

fn normal_cdf() -> Formula {
    Formula {
        id: "normal-cdf",
        description: "Standard normal probability p = Phi(z)",
        verifiable: true,
        variables: vec![
            var("z", "standard score", &["z-score", "zscore"], Domain::Real,
                "Phi^-1({{p}})", |b| phi_inv(b.require("p")?)),
            var("p", "cumulative probability P(Z <= z)",
                &["prob", "probability", "phi", "wahrscheinlichkeit"], Domain::Probability,
                "Phi({{z}})", |b| Ok(phi(b.require("z")?))),
        ],
    }
}

fn variance() -> Formula {
    Formula {
        id: "variance",
        description: "Standard deviation from variance, sigma = sqrt(var)",
        verifiable: true,
        variables: vec![
            var("var", "variance", &["varianz", "variance"], Domain::NonNegative,
                "{{sigma}}^2", |b| Ok(b.require("sigma")?.powi(2))),
            var("sigma", "standard deviation", &["std", "σ", "standardabweichung"], Domain::Positive,
                "sqrt({{var}})", |b| Ok(b.require("var")?.sqrt())),
        ],
    }
}

fn z_score() -> Formula {
    Formula {
        id: "z-score",
        description: "Standard score z = (x - mu) / sigma",
        verifiable: true,
        variables: vec![
            var("z", "standard score", &["z-score", "zscore"], Domain::Real,
                "({{x}} - {{mu}}) / {{sigma}}",
                |b| divide(b.require("x")? - b.require("mu")?, b.require("sigma")?, "sigma")),
            var("x", "observed value", &["x_bar", "xbar"], Domain::Real,
                "{{mu}} + {{z}} * {{sigma}}",
                |b| Ok(b.require("mu")? + b.require("z")? * b.require("sigma")?)),
            var("mu", "population mean", &["μ", "mittelwert", "mean", "mu0"], Domain::Real,
                "{{x}} - {{z}} * {{sigma}}",
                |b| Ok(b.require("x")? - b.require("z")? * b.require("sigma")?)),
            var("sigma", "population standard deviation", &["σ", "std", "standardabweichung"],
                Domain::Positive, "({{x}} - {{mu}}) / {{z}}",
                |b| divide(b.require("x")? - b.require("mu")?, b.require("z")?, "z")),
        ],
    }
}

fn cohens_d() -> Formula {
    Formula {
        id: "cohens-d",
        description: "Effect size d = (x_bar - mu0) / sigma",
        verifiable: true,
        variables: vec![
            var("d", "effect size", &["cohens_d", "cohensd", "cohen"], Domain::Real,
                "({{x_bar}} - {{mu0}}) / {{sigma}}",
                |b| divide(b.require("x_bar")? - b.require("mu0")?, b.require("sigma")?, "sigma")),
            var("x_bar", "sample mean",
                &["xbar", "x", "stichprobenmittelwert", "sample_mean"], Domain::Real,
                "{{mu0}} + {{d}} * {{sigma}}",
                |b| Ok(b.require("mu0")? + b.require("d")? * b.require("sigma")?)),
            var("mu0", "population mean under H0",
                &["μ0", "mu_0", "mu_null", "populationsmittelwert", "population_mean", "mu"],
                Domain::Real, "{{x_bar}} - {{d}} * {{sigma}}",
                |b| Ok(b.require("x_bar")? - b.require("d")? * b.require("sigma")?)),
            var("sigma", "standard deviation",
                &["σ", "std", "standardabweichung", "standard_deviation"], Domain::Positive,
                "({{x_bar}} - {{mu0}}) / {{d}}",
                |b| divide(b.require("x_bar")? - b.require("mu0")?, b.require("d")?, "d")),
        ],
    }
}

fn z_test() -> Formula {
    mean_test("z-test", "z", "sigma", "One-sample Z statistic z = (x_bar - mu0) / (sigma / sqrt(n))",
        &["std_pop", "standardabweichung_population"])
}

fn t_test() -> Formula {
    mean_test("t-test", "t", "s", "One-sample t statistic t = (x_bar - mu0) / (s / sqrt(n))",
        &["std", "standardabweichung_stichprobe"])
}

/// Shared shape of the Z and t statistics; they differ only in names.
fn mean_test(
    id: &'static str,
    stat: &'static str,
    sd: &'static str,
    description: &'static str,
    sd_aliases: &'static [&'static str],
) -> Formula {
    // Templates need the literal names, so the two tests get their own tables.
    let (stat_expr, xbar_expr, mu0_expr, sd_expr, n_expr) = if stat == "z" {
        (
            "({{x_bar}} - {{mu0}}) / ({{sigma}} / sqrt({{n}}))",
            "{{mu0}} + {{z}} * {{sigma}} / sqrt({{n}})",
            "{{x_bar}} - {{z}} * {{sigma}} / sqrt({{n}})",
            "({{x_bar}} - {{mu0}}) * sqrt({{n}}) / {{z}}",
            "({{z}} * {{sigma}} / ({{x_bar}} - {{mu0}}))^2",
        )
    } else {
        (
            "({{x_bar}} - {{mu0}}) / ({{s}} / sqrt({{n}}))",
            "{{mu0}} + {{t}} * {{s}} / sqrt({{n}})",
            "{{x_bar}} - {{t}} * {{s}} / sqrt({{n}})",
            "({{x_bar}} - {{mu0}}) * sqrt({{n}}) / {{t}}",
            "({{t}} * {{s}} / ({{x_bar}} - {{mu0}}))^2",
        )
    };

    Formula {
        id,
        description,
        verifiable: true,
        variables: vec![
            var(stat, "test statistic", &[], Domain::Real, stat_expr, move |b| {
                let se = b.require(sd)? / b.require("n")?.sqrt();
                divide(b.require("x_bar")? - b.require("mu0")?, se, "standard error")
            }),
            var("x_bar", "sample mean", &["xbar", "x", "stichprobenmittelwert"], Domain::Real,
                xbar_expr, move |b| {
                    Ok(b.require("mu0")? + b.require(stat)? * b.require(sd)? / b.require("n")?.sqrt())
                }),
            var("mu0", "population mean under H0",
                &["μ0", "mu_0", "mu_null", "populationsmittelwert"], Domain::Real,
                mu0_expr, move |b| {
                    Ok(b.require("x_bar")? - b.require(stat)? * b.require(sd)? / b.require("n")?.sqrt())
                }),
            var(sd, "standard deviation", sd_aliases, Domain::Positive, sd_expr, move |b| {
                divide(
                    (b.require("x_bar")? - b.require("mu0")?) * b.require("n")?.sqrt(),
                    b.require(stat)?,
                    stat,
                )
            }),
            var("n", "sample size", &[], Domain::SampleSize, n_expr, move |b| {
                let ratio = divide(
                    b.require(stat)? * b.require(sd)?,
                    b.require("x_bar")? - b.require("mu0")?,
                    "x_bar - mu0",
                )?;
                Ok(ratio * ratio)
            }),
        ],
    }
}

fn k_sigma_coverage() -> Formula {
    Formula {
        id: "k-sigma-coverage",
        description: "Probability mass within mu +/- k*sigma, conf = Phi(k) - Phi(-k)",
        verifiable: true,
        variables: vec![
            var("k", "interval half-width in standard deviations", &["z"], Domain::Positive,
                "Phi^-1((1 + {{conf}}) / 2)", |b| phi_inv((1.0 + b.require("conf")?) / 2.0)),
            var("conf", "coverage probability",
                &["konfidenzniveau", "wahrscheinlichkeit", "prob", "p"], Domain::Probability,
                "Phi({{k}}) - Phi(-{{k}})", |b| {
                    let k = b.require("k")?;
                    Ok(phi(k) - phi(-k))
                }),
        ],
    }
}

/// `bound = mu + sign * k * sigma`.
fn k_sigma_bound(id: &'static str, bound: &'static str, sign: f64) -> Formula {
    let (bound_expr, mu_expr, k_expr, sigma_expr) = if sign < 0.0 {
        (
            "{{mu}} - {{k}} * {{sigma}}",
            "{{lower}} + {{k}} * {{sigma}}",
            "({{mu}} - {{lower}}) / {{sigma}}",
            "({{mu}} - {{lower}}) / {{k}}",
        )
    } else {
        (
            "{{mu}} + {{k}} * {{sigma}}",
            "{{upper}} - {{k}} * {{sigma}}",
            "({{upper}} - {{mu}}) / {{sigma}}",
            "({{upper}} - {{mu}}) / {{k}}",
        )
    };
    Formula {
        id,
        description: if sign < 0.0 {
            "Lower bound of the k-sigma interval"
        } else {
            "Upper bound of the k-sigma interval"
        },
        verifiable: true,
        variables: vec![
            var(bound, "interval bound", &[], Domain::Real, bound_expr, move |b| {
                Ok(b.require("mu")? + sign * b.require("k")? * b.require("sigma")?)
            }),
            var("mu", "mean", &["mittelwert", "mean"], Domain::Real, mu_expr, move |b| {
                Ok(b.require(bound)? - sign * b.require("k")? * b.require("sigma")?)
            }),
            var("k", "interval half-width in standard deviations", &["z"], Domain::Positive,
                k_expr, move |b| {
                    divide(sign * (b.require(bound)? - b.require("mu")?), b.require("sigma")?, "sigma")
                }),
            var("sigma", "standard deviation", &["std", "standardabweichung"], Domain::Positive,
                sigma_expr, move |b| {
                    divide(sign * (b.require(bound)? - b.require("mu")?), b.require("k")?, "k")
                }),
        ],
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Standard normal CDF.
pub fn phi(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Standard normal quantile; undefined at 0 and 1.
pub fn phi_inv(p: f64) -> Result<f64, FormulaError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(FormulaError::Domain(format!(
            "cannot invert Phi at p = {p}: p must lie strictly between 0 and 1"
        )));
    }
    Ok(-std::f64::consts::SQRT_2 * erfc_inv(2.0 * p))
}

fn divide(numerator: f64, denominator: f64, what: &str) -> Result<f64, FormulaError> {
    if denominator == 0.0 {
        return Err(FormulaError::Domain(format!("division by zero: {what} = 0")));
    }
    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formulas_are_well_formed() {
        let reg = FormulaRegistry::builtin();
        assert_eq!(reg.len(), 9);
        for f in reg.iter() {
            validate_formula(f).unwrap_or_else(|e| panic!("{}: {e}", f.id));
        }
    }

    #[test]
    fn register_rejects_undeclared_reference() {
        let mut reg = FormulaRegistry::new();
        let broken = Formula {
            id: "broken",
            description: "",
            verifiable: false,
            variables: vec![
                var("a", "", &[], Domain::Real, "{{b}} + {{c}}", |_| Ok(0.0)),
                var("b", "", &[], Domain::Real, "{{a}}", |_| Ok(0.0)),
            ],
        };
        assert!(matches!(reg.register(broken), Err(FormulaError::Parse(_))));
        assert!(reg.is_empty());
    }

    #[test]
    fn unknown_formula() {
        let reg = FormulaRegistry::builtin();
        assert_eq!(
            reg.get("anova").unwrap_err(),
            FormulaError::UnknownFormula("anova".into())
        );
    }

    #[test]
    fn canonical_names_resolve_aliases() {
        let reg = FormulaRegistry::builtin();
        let d = reg.get("cohens-d").unwrap();
        assert_eq!(d.canonical_name("XBAR"), Some("x_bar"));
        assert_eq!(d.canonical_name("mu"), Some("mu0"));
        assert_eq!(d.canonical_name("foo"), None);
    }

    #[test]
    fn phi_matches_known_values() {
        assert!((phi(0.0) - 0.5).abs() < 1e-15);
        assert!((phi(1.959964) - 0.975).abs() < 1e-6);
        assert!((phi_inv(0.975).unwrap() - 1.959964).abs() < 1e-6);
        assert!(phi_inv(1.0).is_err());
    }
}
