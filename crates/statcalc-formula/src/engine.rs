//! Variable resolution: solve a formula for its single unknown, verify a
//! fully bound formula, and resolve chains of formulas sharing bindings.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::types::{
    Bindings, Check, Derivation, Formula, FormulaError, Outcome, Step, Verification,
    format_value, symbolic,
};

/// Absolute tolerance of the verification pass.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Substitute `{{variable}}` patterns in a string with provided values.
/// Unresolved variables are left as-is.
pub fn substitute_vars(text: &str, vars: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        if i + 4 <= len && bytes[i] == b'{' && bytes[i + 1] == b'{' {
            let start = i + 2;
            if start < len && is_var_start(bytes[start]) {
                let mut end = start + 1;
                while end < len && is_var_cont(bytes[end]) {
                    end += 1;
                }
                if end + 1 < len && bytes[end] == b'}' && bytes[end + 1] == b'}' {
                    let name = &text[start..end];
                    if let Some(val) = vars.get(name) {
                        result.push_str(val);
                    } else {
                        result.push_str(&text[i..end + 2]);
                    }
                    i = end + 2;
                    continue;
                }
            }
        }
        let ch = text[i..].chars().next().unwrap_or(' ');
        result.push(ch);
        i += ch.len_utf8();
    }
    result
}

/// Variable names referenced by an expression template, sorted.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut vars: HashSet<String> = HashSet::new();
    scan_vars(template, &mut vars);
    let mut result: Vec<String> = vars.into_iter().collect();
    result.sort();
    result
}

/// Check that every variable of `formula` referenced by another slot's
/// expression is declared, and that no slot references itself.
pub fn validate_formula(formula: &Formula) -> Result<(), FormulaError> {
    let declared: HashSet<&str> = formula.variables.iter().map(|v| v.name).collect();
    for var in &formula.variables {
        for name in extract_variables(var.expression) {
            if name == var.name {
                return Err(FormulaError::Parse(format!(
                    "{}: expression for {} references itself",
                    formula.id, var.name
                )));
            }
            if !declared.contains(name.as_str()) {
                return Err(FormulaError::Parse(format!(
                    "{}: expression for {} references undeclared variable {}",
                    formula.id, var.name, name
                )));
            }
        }
    }
    Ok(())
}

/// Check every bound variable of `formula` against its domain.
pub fn validate_bindings(formula: &Formula, bindings: &Bindings) -> Result<(), FormulaError> {
    for var in &formula.variables {
        if let Some(value) = bindings.get(var.name) {
            var.domain.check(var.name, value)?;
        }
    }
    Ok(())
}

/// Solve `formula` for its single unknown.
///
/// With zero unknowns the formula is overdetermined: instead of failing, a
/// verification pass recomputes every variable from the others and the
/// report is returned. More than one unknown is an error.
pub fn solve(
    formula: &Formula,
    bindings: &Bindings,
    tolerance: f64,
) -> Result<Outcome, FormulaError> {
    validate_bindings(formula, bindings)?;

    let unknowns = formula.unknowns(bindings);
    match unknowns.as_slice() {
        [] => Ok(Outcome::Overdetermined(verify(formula, bindings, tolerance))),
        [name] => solve_for(formula, name, bindings).map(Outcome::Solved),
        _ => Err(FormulaError::InsufficientInput {
            formula: formula.id.to_string(),
            missing: unknowns.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// Recompute every variable of a fully bound formula from the others.
pub fn verify(formula: &Formula, bindings: &Bindings, tolerance: f64) -> Verification {
    let mut checks = Vec::with_capacity(formula.variables.len());
    for var in &formula.variables {
        let Some(given) = bindings.get(var.name) else {
            continue;
        };
        let computed = (var.solve)(bindings).ok().filter(|v| v.is_finite());
        let consistent = match computed {
            Some(c) => (c - given).abs() <= tolerance,
            None => true,
        };
        checks.push(Check {
            variable: var.name.to_string(),
            given,
            computed,
            consistent,
        });
    }
    debug!(formula = formula.id, checks = checks.len(), "verified overdetermined formula");
    Verification {
        formula: formula.id.to_string(),
        tolerance,
        checks,
    }
}

/// A formula left with two or more unknowns after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unresolved {
    pub formula: String,
    pub missing: Vec<String>,
}

/// Everything [`resolve`] found out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub derivation: Derivation,
    pub verifications: Vec<Verification>,
    pub unresolved: Vec<Unresolved>,
}

impl Resolution {
    /// Whether any verification found a mismatch.
    pub fn has_inconsistency(&self) -> bool {
        self.verifications.iter().any(|v| !v.is_consistent())
    }
}

/// Dependency-directed resolution over formulas that share one binding
/// namespace.
///
/// Formulas with exactly one unknown are solved repeatedly until no further
/// progress is possible; each solved value is written back into `bindings`
/// and may unlock later formulas. Formulas that were fully bound on input
/// are verified. Fails with `InsufficientInput` only when nothing at all
/// could be solved or verified.
pub fn resolve(
    system: &[&Formula],
    bindings: &mut Bindings,
    tolerance: f64,
) -> Result<Resolution, FormulaError> {
    for formula in system {
        validate_bindings(formula, bindings)?;
    }

    let mut resolution = Resolution::default();
    let mut touched: HashSet<&str> = HashSet::new();

    loop {
        let mut progressed = false;
        for formula in system {
            if touched.contains(formula.id) {
                continue;
            }
            let unknowns = formula.unknowns(bindings);
            if let [name] = unknowns.as_slice() {
                let step = solve_for(formula, name, bindings)?;
                debug!(formula = formula.id, variable = *name, value = step.value, "solved");
                bindings.bind(name, step.value);
                resolution.derivation.push(step);
                touched.insert(formula.id);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    for formula in system {
        if touched.contains(formula.id) {
            continue;
        }
        let unknowns = formula.unknowns(bindings);
        if unknowns.is_empty() {
            if formula.verifiable {
                resolution.verifications.push(verify(formula, bindings, tolerance));
            }
        } else {
            resolution.unresolved.push(Unresolved {
                formula: formula.id.to_string(),
                missing: unknowns.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    if resolution.derivation.is_empty() && resolution.verifications.is_empty() {
        let missing = resolution
            .unresolved
            .iter()
            .flat_map(|u| u.missing.iter().cloned())
            .fold(Vec::new(), |mut acc: Vec<String>, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });
        let formula = system
            .iter()
            .map(|f| f.id)
            .collect::<Vec<_>>()
            .join(" + ");
        return Err(FormulaError::InsufficientInput { formula, missing });
    }

    Ok(resolution)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Evaluate the inversion for `name` and build its derivation step.
fn solve_for(formula: &Formula, name: &str, bindings: &Bindings) -> Result<Step, FormulaError> {
    let var = formula
        .variable(name)
        .ok_or_else(|| FormulaError::MissingValue(name.to_string()))?;
    let value = (var.solve)(bindings)?;
    var.domain.check(var.name, value)?;

    let vars: HashMap<String, String> = bindings
        .iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), display_operand(v))))
        .collect();
    Ok(Step::new(
        var.name,
        symbolic(var.expression),
        substitute_vars(var.expression, &vars),
        value,
    ))
}

/// Negative operands are parenthesized so `a - -b` reads as `a - (-b)`.
fn display_operand(value: f64) -> String {
    let text = format_value(value);
    if text.starts_with('-') {
        format!("({text})")
    } else {
        text
    }
}

fn is_var_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_var_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan a string for `{{name}}` patterns and insert variable names into the set.
fn scan_vars(text: &str, vars: &mut HashSet<String>) {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i + 4 <= len {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            let start = i + 2;
            if start < len && is_var_start(bytes[start]) {
                let mut end = start + 1;
                while end < len && is_var_cont(bytes[end]) {
                    end += 1;
                }
                if end + 1 < len && bytes[end] == b'}' && bytes[end + 1] == b'}' {
                    vars.insert(text[start..end].to_string());
                    i = end + 2;
                    continue;
                }
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormulaRegistry;

    fn make_vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn bind(pairs: &[(&str, Option<f64>)]) -> Bindings {
        pairs
            .iter()
            .fold(Bindings::new(), |b, (k, v)| b.with(k, *v))
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    // -- substitute_vars ---------------------------------------------------

    #[test]
    fn substitute_simple() {
        let vars = make_vars(&[("mu", "100")]);
        assert_eq!(substitute_vars("{{mu}} + 1", &vars), "100 + 1");
    }

    #[test]
    fn substitute_missing_left_alone() {
        let vars = make_vars(&[("a", "1")]);
        assert_eq!(substitute_vars("{{a}} * {{b}}", &vars), "1 * {{b}}");
    }

    #[test]
    fn substitute_keeps_non_ascii() {
        let vars = make_vars(&[("x", "2")]);
        assert_eq!(substitute_vars("√{{x}}", &vars), "√2");
    }

    // -- extract_variables -------------------------------------------------

    #[test]
    fn extract_vars_sorted_and_unique() {
        assert_eq!(
            extract_variables("({{x}} - {{mu}}) / {{sigma}} + {{x}}"),
            vec!["mu", "sigma", "x"]
        );
    }

    // -- solve -------------------------------------------------------------

    #[test]
    fn solve_single_unknown() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let b = bind(&[("z", None), ("x", Some(130.0)), ("mu", Some(100.0)), ("sigma", Some(15.0))]);
        match solve(f, &b, DEFAULT_TOLERANCE).unwrap() {
            Outcome::Solved(step) => {
                assert_eq!(step.variable, "z");
                assert_eq!(step.expression, "(x - mu) / sigma");
                assert_eq!(step.substituted, "(130 - 100) / 15");
                assert!(approx(step.value, 2.0, 1e-12));
            }
            other => panic!("expected solved, got {other:?}"),
        }
    }

    #[test]
    fn solve_rejects_two_unknowns() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let b = bind(&[("mu", Some(100.0)), ("sigma", Some(15.0))]);
        let err = solve(f, &b, DEFAULT_TOLERANCE).unwrap_err();
        assert_eq!(
            err,
            FormulaError::InsufficientInput {
                formula: "z-score".into(),
                missing: vec!["z".into(), "x".into()],
            }
        );
    }

    #[test]
    fn solve_overdetermined_verifies() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let good = bind(&[("z", Some(2.0)), ("x", Some(130.0)), ("mu", Some(100.0)), ("sigma", Some(15.0))]);
        match solve(f, &good, DEFAULT_TOLERANCE).unwrap() {
            Outcome::Overdetermined(v) => assert!(v.is_consistent()),
            other => panic!("expected verification, got {other:?}"),
        }

        let bad = good.clone().with("z", Some(1.0));
        match solve(f, &bad, DEFAULT_TOLERANCE).unwrap() {
            Outcome::Overdetermined(v) => {
                assert!(!v.is_consistent());
                let z = v.checks.iter().find(|c| c.variable == "z").unwrap();
                assert!(approx(z.computed.unwrap(), 2.0, 1e-12));
            }
            other => panic!("expected verification, got {other:?}"),
        }
    }

    #[test]
    fn solve_domain_error_on_input() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let b = bind(&[("x", Some(1.0)), ("mu", Some(0.0)), ("sigma", Some(-2.0))]);
        assert!(matches!(solve(f, &b, DEFAULT_TOLERANCE), Err(FormulaError::Domain(_))));
    }

    #[test]
    fn solve_division_by_zero_is_domain_error() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let b = bind(&[("z", Some(0.0)), ("x", Some(5.0)), ("mu", Some(5.0))]);
        assert!(matches!(solve(f, &b, DEFAULT_TOLERANCE), Err(FormulaError::Domain(_))));
    }

    #[test]
    fn negative_operands_parenthesized() {
        let reg = FormulaRegistry::builtin();
        let f = reg.get("z-score").unwrap();
        let b = bind(&[("z", Some(-1.0)), ("mu", Some(10.0)), ("sigma", Some(2.0))]);
        let Outcome::Solved(step) = solve(f, &b, DEFAULT_TOLERANCE).unwrap() else {
            panic!("expected solved");
        };
        assert_eq!(step.substituted, "10 + (-1) * 2");
        assert!(approx(step.value, 8.0, 1e-12));
    }

    // -- round trip --------------------------------------------------------

    #[test]
    fn every_slot_round_trips() {
        let reg = FormulaRegistry::builtin();
        let cases: &[(&str, &[(&str, f64)])] = &[
            ("z-score", &[("x", 122.5), ("mu", 100.0), ("sigma", 15.0)]),
            ("cohens-d", &[("x_bar", 104.0), ("mu0", 100.0), ("sigma", 8.0)]),
            ("z-test", &[("x_bar", 105.0), ("mu0", 100.0), ("sigma", 15.0), ("n", 25.0)]),
            ("t-test", &[("x_bar", 98.0), ("mu0", 100.0), ("s", 4.0), ("n", 16.0)]),
            ("normal-cdf", &[("z", 1.2)]),
            ("variance", &[("sigma", 3.0)]),
            ("k-sigma-coverage", &[("k", 1.5)]),
            ("k-sigma-upper", &[("mu", 50.0), ("k", 2.0), ("sigma", 4.0)]),
            ("k-sigma-lower", &[("mu", 50.0), ("k", 2.0), ("sigma", 4.0)]),
        ];
        for (id, knowns) in cases {
            let f = reg.get(id).unwrap();
            // complete the bindings by solving the one remaining slot
            let mut full = knowns.iter().fold(Bindings::new(), |b, (k, v)| b.with(k, Some(*v)));
            let Outcome::Solved(first) = solve(f, &full, DEFAULT_TOLERANCE).unwrap() else {
                panic!("{id}: expected a solvable slot");
            };
            full.bind(&first.variable, first.value);

            for var in &f.variables {
                let mut partial = full.clone();
                partial.unknown(var.name);
                let Outcome::Solved(step) = solve(f, &partial, DEFAULT_TOLERANCE).unwrap() else {
                    panic!("{id}: expected {} to be solved", var.name);
                };
                let original = full.get(var.name).unwrap();
                assert!(
                    approx(step.value, original, 1e-6 * original.abs().max(1.0)),
                    "{id}.{}: {} != {}",
                    var.name,
                    step.value,
                    original
                );
            }
        }
    }

    // -- resolve -----------------------------------------------------------

    #[test]
    fn resolve_chains_formulas() {
        let reg = FormulaRegistry::builtin();
        let system = reg.system(&["variance", "normal-cdf", "z-score"]).unwrap();
        let mut b = bind(&[("p", Some(0.975)), ("mu", Some(100.0)), ("var", Some(225.0))]);
        let res = resolve(&system, &mut b, DEFAULT_TOLERANCE).unwrap();
        assert!(approx(b.get("sigma").unwrap(), 15.0, 1e-12));
        assert!(approx(b.get("z").unwrap(), 1.959964, 1e-5));
        assert!(approx(b.get("x").unwrap(), 100.0 + 1.959964 * 15.0, 1e-3));
        let solved: Vec<&str> = res.derivation.steps().iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(solved, vec!["sigma", "z", "x"]);
        assert!(res.unresolved.is_empty());
    }

    #[test]
    fn resolve_keeps_partial_progress() {
        let reg = FormulaRegistry::builtin();
        let system = reg.system(&["normal-cdf", "z-score"]).unwrap();
        let mut b = bind(&[("z", Some(1.0))]);
        let res = resolve(&system, &mut b, DEFAULT_TOLERANCE).unwrap();
        assert!(approx(b.get("p").unwrap(), 0.841345, 1e-6));
        assert_eq!(res.unresolved.len(), 1);
        assert_eq!(res.unresolved[0].missing, vec!["x", "mu", "sigma"]);
    }

    #[test]
    fn resolve_verifies_fully_bound() {
        let reg = FormulaRegistry::builtin();
        let system = reg.system(&["normal-cdf", "z-score"]).unwrap();
        let mut b = bind(&[("z", Some(1.0)), ("x", Some(115.0)), ("mu", Some(100.0)), ("sigma", Some(15.0))]);
        let res = resolve(&system, &mut b, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(res.derivation.steps().len(), 1);
        assert_eq!(res.verifications.len(), 1);
        assert!(!res.has_inconsistency());
    }

    #[test]
    fn resolve_nothing_solvable_is_insufficient() {
        let reg = FormulaRegistry::builtin();
        let system = reg.system(&["normal-cdf", "z-score"]).unwrap();
        let mut b = bind(&[("mu", Some(100.0))]);
        let err = resolve(&system, &mut b, DEFAULT_TOLERANCE).unwrap_err();
        match err {
            FormulaError::InsufficientInput { formula, missing } => {
                assert_eq!(formula, "normal-cdf + z-score");
                assert_eq!(missing, vec!["z", "p", "x", "sigma"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
