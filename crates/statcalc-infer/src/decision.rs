//! Reject / fail-to-reject classification of a test statistic.

use serde::Serialize;
use statcalc_dist::{Reference, Tail, check_alpha};
use tracing::debug;

use crate::error::Result;

/// Critical value of one tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Critical {
    pub tail: Tail,
    pub value: f64,
    /// Quantile level the value was taken at, e.g. `0.975`.
    pub level: f64,
}

impl Critical {
    pub fn new(reference: &Reference, tail: Tail, alpha: f64) -> Result<Self> {
        let value = tail.critical_value(reference, alpha)?;
        let level = match tail {
            Tail::TwoSided => 1.0 - alpha / 2.0,
            Tail::Left => alpha,
            Tail::Right => 1.0 - alpha,
        };
        Ok(Self { tail, value, level })
    }
}

/// Critical values for `tail`, or for every tail when none is given.
pub fn critical_values(
    reference: &Reference,
    tail: Option<Tail>,
    alpha: f64,
) -> Result<Vec<Critical>> {
    match tail {
        Some(tail) => Ok(vec![Critical::new(reference, tail, alpha)?]),
        None => [Tail::TwoSided, Tail::Right, Tail::Left]
            .into_iter()
            .map(|t| Critical::new(reference, t, alpha))
            .collect(),
    }
}

/// Outcome of a significance test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub tail: Tail,
    pub statistic: f64,
    pub critical: f64,
    pub p_value: f64,
    pub alpha: f64,
    /// The statistic falls into the rejection region.
    pub reject_by_critical: bool,
    /// `p < alpha`.
    pub reject_by_p: bool,
    /// Comparison text, e.g. `|z| = 2.1 > 1.96`.
    pub comparison: String,
}

impl Decision {
    /// H0 is rejected when the statistic lies in the rejection region.
    pub fn reject(&self) -> bool {
        self.reject_by_critical
    }

    /// Whether both criteria agree. They can disagree only at the boundary
    /// or when a p-value was supplied that does not match the statistic.
    pub fn criteria_agree(&self) -> bool {
        self.reject_by_critical == self.reject_by_p
    }

    /// Alternative hypothesis relative to `mu0`, e.g. `mu != 100`.
    pub fn alternative(&self, mu0: &str) -> String {
        let op = match self.tail {
            Tail::TwoSided => "!=",
            Tail::Left => "<",
            Tail::Right => ">",
        };
        format!("mu {op} {mu0}")
    }
}

/// Classify `statistic` against the critical value of `tail` at `alpha`.
///
/// Two-sided compares `|stat| > |crit|`, left `stat < crit`, right
/// `stat > crit`. The p-value is compared with `alpha` alongside.
pub fn decide(
    reference: &Reference,
    tail: Tail,
    statistic: f64,
    p_value: f64,
    alpha: f64,
) -> Result<Decision> {
    check_alpha(alpha)?;
    let critical = tail.critical_value(reference, alpha)?;
    let symbol = reference.symbol();

    let (reject, comparison) = match tail {
        Tail::TwoSided => {
            let reject = statistic.abs() > critical.abs();
            let op = if reject { ">" } else { "<=" };
            (
                reject,
                format!("|{symbol}| = {:.6} {op} |{symbol}_crit| = {:.6}", statistic.abs(), critical.abs()),
            )
        }
        Tail::Left => {
            let reject = statistic < critical;
            let op = if reject { "<" } else { ">=" };
            (reject, format!("{symbol} = {statistic:.6} {op} {symbol}_crit = {critical:.6}"))
        }
        Tail::Right => {
            let reject = statistic > critical;
            let op = if reject { ">" } else { "<=" };
            (reject, format!("{symbol} = {statistic:.6} {op} {symbol}_crit = {critical:.6}"))
        }
    };

    debug!(tail = tail.as_str(), statistic, critical, p_value, alpha, reject, "decision");
    Ok(Decision {
        tail,
        statistic,
        critical,
        p_value,
        alpha,
        reject_by_critical: reject,
        reject_by_p: p_value < alpha,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sided_uses_absolute_value() {
        let d = decide(&Reference::Normal, Tail::TwoSided, -2.5, 0.0124, 0.05).unwrap();
        assert!(d.reject());
        assert!(d.reject_by_p);
        assert!(d.criteria_agree());
        assert!(d.comparison.starts_with("|z| = 2.500000 >"));
    }

    #[test]
    fn left_tail_is_directional() {
        let d = decide(&Reference::Normal, Tail::Left, 2.5, 0.99, 0.05).unwrap();
        assert!(!d.reject());
        let d = decide(&Reference::Normal, Tail::Left, -2.5, 0.006, 0.05).unwrap();
        assert!(d.reject());
    }

    #[test]
    fn right_tail_with_student_t() {
        let t = Reference::student_t(24.0).unwrap();
        let d = decide(&t, Tail::Right, 1.666667, 0.054, 0.05).unwrap();
        assert!(!d.reject());
        assert!((d.critical - 1.710882).abs() < 1e-5);
        assert_eq!(d.alternative("100"), "mu > 100");
    }

    #[test]
    fn all_tails_when_unset() {
        let crits = critical_values(&Reference::Normal, None, 0.05).unwrap();
        assert_eq!(crits.len(), 3);
        assert_eq!(crits[0].tail, Tail::TwoSided);
        assert!((crits[0].level - 0.975).abs() < 1e-12);
        assert!((crits[2].value + 1.644854).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_alpha() {
        assert!(decide(&Reference::Normal, Tail::Right, 1.0, 0.1, 0.0).is_err());
    }
}
