//! Formula data model: variables with inversion closures, bindings,
//! derivation steps and verification reports.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Computes one variable of a formula from the others.
///
/// The closure is only invoked once every other variable of the formula is
/// bound, so `Bindings::require` never fails for declared names.
pub type Inversion = Box<dyn Fn(&Bindings) -> Result<f64, FormulaError> + Send + Sync>;

/// A named statistical formula: an ordered list of variables, each with a
/// closed-form expression computing it from the rest.
pub struct Formula {
    /// Registry key, e.g. `"z-score"`.
    pub id: &'static str,

    /// Human-readable description.
    pub description: &'static str,

    /// Variables in display order.
    pub variables: Vec<Variable>,

    /// Whether a fully bound formula may be checked for consistency.
    pub verifiable: bool,
}

/// One variable slot of a formula.
pub struct Variable {
    /// Canonical name used in bindings and templates.
    pub name: &'static str,

    /// What the variable means.
    pub description: &'static str,

    /// Alternative argument keys (matched case-insensitively).
    pub aliases: &'static [&'static str],

    /// Admissible range for bound and solved values.
    pub domain: Domain,

    /// Right-hand side of the inversion, with `{{var}}` placeholders.
    pub expression: &'static str,

    /// Evaluates `expression`.
    pub solve: Inversion,
}

impl Formula {
    /// Look up a variable by canonical name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Canonical variable names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.variables.iter().map(|v| v.name).collect()
    }

    /// Names of the variables that are not bound.
    pub fn unknowns(&self, bindings: &Bindings) -> Vec<&'static str> {
        self.variables
            .iter()
            .filter(|v| !bindings.is_bound(v.name))
            .map(|v| v.name)
            .collect()
    }

    /// Map an argument key (canonical name or alias) to the canonical name.
    pub fn canonical_name(&self, key: &str) -> Option<&'static str> {
        let key = key.trim().to_lowercase();
        self.variables
            .iter()
            .find(|v| v.name == key || v.aliases.iter().any(|a| *a == key))
            .map(|v| v.name)
    }

    /// Serializable view for listings.
    pub fn summary(&self) -> FormulaSummary {
        FormulaSummary {
            id: self.id.to_string(),
            description: self.description.to_string(),
            verifiable: self.verifiable,
            variables: self
                .variables
                .iter()
                .map(|v| VariableSummary {
                    name: v.name.to_string(),
                    description: v.description.to_string(),
                    aliases: v.aliases.iter().map(|a| a.to_string()).collect(),
                    domain: v.domain,
                    expression: format!("{} = {}", v.name, symbolic(v.expression)),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("id", &self.id)
            .field("variables", &self.names())
            .field("verifiable", &self.verifiable)
            .finish()
    }
}

/// Listing view of a [`Formula`].
#[derive(Debug, Clone, Serialize)]
pub struct FormulaSummary {
    pub id: String,
    pub description: String,
    pub verifiable: bool,
    pub variables: Vec<VariableSummary>,
}

/// Listing view of a [`Variable`].
#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub domain: Domain,
    pub expression: String,
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// Admissible range of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Any finite real number.
    Real,
    /// Strictly greater than zero.
    Positive,
    /// Zero or greater.
    NonNegative,
    /// Within `[0, 1]`.
    Probability,
    /// A sample size, strictly greater than zero.
    SampleSize,
}

impl Domain {
    /// Check `value` for the variable `name`.
    pub fn check(self, name: &str, value: f64) -> Result<(), FormulaError> {
        if !value.is_finite() {
            return Err(FormulaError::Domain(format!("{name} must be finite, got {value}")));
        }
        let ok = match self {
            Domain::Real => true,
            Domain::Positive | Domain::SampleSize => value > 0.0,
            Domain::NonNegative => value >= 0.0,
            Domain::Probability => (0.0..=1.0).contains(&value),
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Domain(format!(
                "{name} = {} is out of range ({})",
                format_value(value),
                self.requirement()
            )))
        }
    }

    /// Short description of the constraint.
    pub fn requirement(self) -> &'static str {
        match self {
            Domain::Real => "any real number",
            Domain::Positive => "must be > 0",
            Domain::NonNegative => "must be >= 0",
            Domain::Probability => "must be between 0 and 1",
            Domain::SampleSize => "sample size must be > 0",
        }
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Variable name to optional value. Absent and `None` both mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bindings {
    values: BTreeMap<String, Option<f64>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a known value.
    pub fn bind(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), Some(value));
    }

    /// Record `name` as explicitly unknown.
    pub fn unknown(&mut self, name: &str) {
        self.values.insert(name.to_string(), None);
    }

    /// Bind or mark unknown.
    pub fn set(&mut self, name: &str, value: Option<f64>) {
        self.values.insert(name.to_string(), value);
    }

    /// Builder form of [`Bindings::set`].
    pub fn with(mut self, name: &str, value: Option<f64>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` was mentioned at all, bound or not.
    pub fn mentions(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Value of a bound variable, or an error naming it.
    pub fn require(&self, name: &str) -> Result<f64, FormulaError> {
        self.get(name)
            .ok_or_else(|| FormulaError::MissingValue(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// One line of a worked derivation, e.g. `x = mu + z * sigma = 100 + 1.5 * 15 = 122.5`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Left-hand side.
    pub variable: String,
    /// Symbolic right-hand side.
    pub expression: String,
    /// Right-hand side with known values substituted (may be empty).
    pub substituted: String,
    pub value: f64,
}

impl Step {
    pub fn new(
        variable: impl Into<String>,
        expression: impl Into<String>,
        substituted: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            variable: variable.into(),
            expression: expression.into(),
            substituted: substituted.into(),
            value,
        }
    }

    /// Expression text with the value formatted to `precision` decimals.
    pub fn render(&self, precision: usize) -> String {
        let value = format_fixed(self.value, precision);
        let mut out = format!("{} = {}", self.variable, self.expression);
        if !self.substituted.is_empty() && self.substituted != self.expression {
            out.push_str(" = ");
            out.push_str(&self.substituted);
        }
        if self.expression != value {
            out.push_str(" = ");
            out.push_str(&value);
        }
        out
    }
}

/// Ordered list of derivation steps, for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Derivation {
    steps: Vec<Step>,
}

impl Derivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Record a step whose expression is already fully written out.
    pub fn note(&mut self, variable: &str, expression: impl Into<String>, value: f64) {
        self.steps.push(Step::new(variable, expression, "", value));
    }

    pub fn extend(&mut self, other: Derivation) {
        self.steps.extend(other.steps);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Consistency check of one variable of a fully bound formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub variable: String,
    pub given: f64,
    /// `None` when the inversion is undefined for these inputs.
    pub computed: Option<f64>,
    pub consistent: bool,
}

/// Result of the verification pass over an overdetermined formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub formula: String,
    pub tolerance: f64,
    pub checks: Vec<Check>,
}

impl Verification {
    /// Whether every computable check agrees within tolerance.
    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(|c| c.consistent)
    }
}

/// What [`crate::engine::solve`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Exactly one variable was unknown and has been computed.
    Solved(Step),
    /// Every variable was bound; the values were cross-checked instead.
    Overdetermined(Verification),
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing input and resolving formulas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown formula: {0}")]
    UnknownFormula(String),

    #[error("unrecognized key '{0}'")]
    UnknownKey(String),

    #[error("no value bound for {0}")]
    MissingValue(String),

    #[error("insufficient input for {formula}: {} unknowns ({})", missing.len(), missing.join(", "))]
    InsufficientInput {
        formula: String,
        missing: Vec<String>,
    },

    #[error("domain error: {0}")]
    Domain(String),
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Compact rendering used inside substituted expressions: integers without
/// a fraction, everything else rounded to six decimals with trailing zeros
/// dropped.
pub fn format_value(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if value == 0.0 {
        return "0".into();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.6}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".into()
    } else {
        trimmed.to_string()
    }
}

/// Fixed-precision rendering of a result value.
pub fn format_fixed(value: f64, precision: usize) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }
    format!("{value:.precision$}")
}

/// Strip `{{` and `}}` from an expression template.
pub fn symbolic(template: &str) -> String {
    template.replace("{{", "").replace("}}", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_distinguish_unknown_and_absent() {
        let mut b = Bindings::new();
        b.bind("mu", 100.0);
        b.unknown("x");
        assert_eq!(b.get("mu"), Some(100.0));
        assert!(b.mentions("x"));
        assert!(!b.is_bound("x"));
        assert!(!b.mentions("sigma"));
        assert_eq!(
            b.require("sigma"),
            Err(FormulaError::MissingValue("sigma".into()))
        );
    }

    #[test]
    fn domain_checks() {
        assert!(Domain::Probability.check("p", 1.0).is_ok());
        assert!(Domain::Probability.check("p", 1.2).is_err());
        assert!(Domain::Positive.check("sigma", 0.0).is_err());
        assert!(Domain::NonNegative.check("var", 0.0).is_ok());
        assert!(Domain::Real.check("z", f64::NAN).is_err());
    }

    #[test]
    fn format_value_compact() {
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(1.5), "1.5");
        assert_eq!(format_value(2.0 / 3.0), "0.666667");
        assert_eq!(format_value(-0.0000001), "0");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn step_render_skips_redundant_parts() {
        let step = Step::new("x", "mu + z * sigma", "100 + 1.5 * 15", 122.5);
        assert_eq!(step.render(2), "x = mu + z * sigma = 100 + 1.5 * 15 = 122.50");
        let given = Step::new("s", "sqrt(shoch2)", "", 3.0);
        assert_eq!(given.render(1), "s = sqrt(shoch2) = 3.0");
    }

    #[test]
    fn symbolic_strips_braces() {
        assert_eq!(symbolic("{{mu}} + {{z}} * {{sigma}}"), "mu + z * sigma");
    }
}
