//! One-sample Z- and t-tests for a mean.
//!
//! The test kind follows from the spread argument: `sigma` (population
//! standard deviation) selects the Z-test, `s` or `shoch2` (sample standard
//! deviation or variance) the t-test. Exactly one of statistic, `x_bar`,
//! `mu0`, standard deviation and `n` may be unknown; the statistic may also
//! be recovered from a p-value once the tail is known.

use serde::Serialize;
use statcalc_dist::{Reference, Tail};
use statcalc_formula::types::format_value;
use statcalc_formula::{
    Assignments, Bindings, Derivation, FormulaRegistry, Outcome, Step, Verification, solve,
};
use tracing::debug;

use crate::decision::{Critical, Decision, critical_values, decide};
use crate::error::{InferError, Result};
use crate::input;

/// Which statistic the test uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Population standard deviation known.
    Z,
    /// Only the sample standard deviation is known.
    T,
}

impl TestKind {
    pub fn formula_id(self) -> &'static str {
        match self {
            TestKind::Z => "z-test",
            TestKind::T => "t-test",
        }
    }

    /// Name of the test statistic variable.
    pub fn statistic(self) -> &'static str {
        match self {
            TestKind::Z => "z",
            TestKind::T => "t",
        }
    }

    /// Name of the standard deviation variable.
    pub fn spread(self) -> &'static str {
        match self {
            TestKind::Z => "sigma",
            TestKind::T => "s",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestKind::Z => "Z-test",
            TestKind::T => "t-test",
        }
    }

    /// Null distribution; the t-test needs `n` for its degrees of freedom.
    pub fn reference(self, n: Option<f64>) -> Result<Reference> {
        match self {
            TestKind::Z => Ok(Reference::Normal),
            TestKind::T => {
                let n = n.ok_or_else(|| {
                    InferError::MissingInput("n is needed for the t-test degrees of freedom".into())
                })?;
                Ok(Reference::student_t(n - 1.0)?)
            }
        }
    }
}

/// Parsed arguments of a hypothesis test.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisInput {
    pub kind: TestKind,
    /// Values for the variables of the kind's formula.
    pub bindings: Bindings,
    /// Sample variance, converted to `s` when `s` itself is absent.
    pub variance: Option<f64>,
    pub p_value: Option<f64>,
    pub alpha: Option<f64>,
    pub tail: Option<Tail>,
}

impl HypothesisInput {
    pub fn from_assignments(args: &mut Assignments, registry: &FormulaRegistry) -> Result<Self> {
        let sigma = args.number(input::SIGMA)?;
        let s = args.number(input::SAMPLE_SD)?;
        let variance = args.number(input::VARIANCE)?;

        let kind = if sigma.is_given() {
            TestKind::Z
        } else if s.is_given() || variance.is_given() {
            TestKind::T
        } else {
            return Err(InferError::MissingInput(
                "either sigma (Z-test) or s / shoch2 (t-test) must be given".into(),
            ));
        };

        let mut bindings = Bindings::new();
        match kind {
            TestKind::Z => input::bind(&mut bindings, "sigma", sigma),
            TestKind::T => input::bind(&mut bindings, "s", s),
        }
        let formula = registry.get(kind.formula_id())?;
        args.bind_formulas(&[formula], &mut bindings)?;

        let p_value = args.number(input::P_VALUE)?.value().map(input::percent);
        let alpha = input::alpha(args)?;
        let tail = input::tail(args)?;

        Ok(Self {
            kind,
            bindings,
            variance: variance.value(),
            p_value,
            alpha,
            tail,
        })
    }
}

/// Everything a hypothesis test produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisReport {
    pub kind: TestKind,
    pub tail: Option<Tail>,
    /// Final values of every formula variable.
    pub values: Bindings,
    pub derivation: Derivation,
    /// Degrees of freedom of the t-test.
    pub df: Option<f64>,
    pub standard_error: f64,
    pub p_value: f64,
    /// Tail the p-value refers to; two-sided when none was given.
    pub p_value_tail: Tail,
    pub p_value_given: bool,
    pub critical: Vec<Critical>,
    pub decision: Option<Decision>,
    /// Present when every variable was given.
    pub verification: Option<Verification>,
}

impl HypothesisReport {
    pub fn statistic(&self) -> Option<f64> {
        self.values.get(self.kind.statistic())
    }
}

/// Run the test: fill the missing variable, then derive the p-value,
/// critical values and, when `alpha` is known, the decision.
pub fn run(
    registry: &FormulaRegistry,
    input: HypothesisInput,
    tolerance: f64,
) -> Result<HypothesisReport> {
    let HypothesisInput { kind, mut bindings, variance, p_value, alpha, tail } = input;
    let formula = registry.get(kind.formula_id())?;
    let stat = kind.statistic();
    let mut derivation = Derivation::new();

    if kind == TestKind::T && !bindings.is_bound("s") {
        if let Some(var) = variance {
            if var < 0.0 {
                return Err(InferError::InvalidInput(format!(
                    "variance must not be negative, got {}",
                    format_value(var)
                )));
            }
            let s = var.sqrt();
            derivation.push(Step::new("s", "sqrt(shoch2)", format!("sqrt({})", format_value(var)), s));
            bindings.bind("s", s);
        }
    } else if kind == TestKind::T && variance.is_some() {
        debug!("both s and shoch2 given; using s");
    }

    if !bindings.is_bound(stat) {
        if let (Some(p), Some(tail)) = (p_value, tail) {
            if kind == TestKind::Z || bindings.is_bound("n") {
                let reference = kind.reference(bindings.get("n"))?;
                let value = tail.statistic_from_p(&reference, p)?;
                let inverse = match kind {
                    TestKind::Z => "Phi^-1",
                    TestKind::T => "t^-1",
                };
                let level = match tail {
                    Tail::TwoSided => "1 - p/2",
                    Tail::Left => "p",
                    Tail::Right => "1 - p",
                };
                derivation.note(stat, format!("{inverse}({level}) with p = {}", format_value(p)), value);
                bindings.bind(stat, value);
            }
        }
    }

    let mut verification = None;
    match solve(formula, &bindings, tolerance)? {
        Outcome::Solved(step) => {
            let name = step.variable.clone();
            let mut value = step.value;
            derivation.push(step);
            if name == "n" {
                let rounded = value.ceil();
                derivation.note("n", format!("ceil({})", format_value(value)), rounded);
                value = rounded;
            }
            bindings.bind(&name, value);
        }
        Outcome::Overdetermined(report) => verification = Some(report),
    }

    let n = bindings.require("n")?;
    if kind == TestKind::T && n <= 1.0 {
        return Err(InferError::InvalidInput(format!(
            "the t-test needs n > 1, got {}",
            format_value(n)
        )));
    }
    let reference = kind.reference(Some(n))?;
    let df = match reference {
        Reference::StudentT { df } => {
            derivation.note("df", format!("n - 1 = {} - 1", format_value(n)), df);
            Some(df)
        }
        _ => None,
    };

    let sd = bindings.require(kind.spread())?;
    let standard_error = sd / n.sqrt();
    let statistic = bindings.require(stat)?;

    let p_value_tail = tail.unwrap_or_default();
    let (p_value, p_value_given) = match p_value {
        Some(p) => (p, true),
        None => {
            let p = p_value_tail.p_value(&reference, statistic)?;
            derivation.note("p", format!("{} p-value of {stat} = {}", p_value_tail.label(), format_value(statistic)), p);
            (p, false)
        }
    };

    let (critical, decision) = match alpha {
        Some(alpha) => (
            critical_values(&reference, tail, alpha)?,
            Some(decide(&reference, p_value_tail, statistic, p_value, alpha)?),
        ),
        None => (Vec::new(), None),
    };

    debug!(kind = kind.label(), statistic, p_value, "hypothesis test complete");
    Ok(HypothesisReport {
        kind,
        tail,
        values: bindings,
        derivation,
        df,
        standard_error,
        p_value,
        p_value_tail,
        p_value_given,
        critical,
        decision,
        verification,
    })
}
