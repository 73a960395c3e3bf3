//! Continuous reference distributions: standard normal, Student-t and
//! chi-squared, with critical values and p-values per tail.

use serde::Serialize;
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF, Normal, StudentsT};
use tracing::debug;

use crate::enums::Tail;
use crate::error::{DistError, Result};

/// Null distribution of a test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Reference {
    Normal,
    StudentT { df: f64 },
    ChiSquared { df: f64 },
}

impl Reference {
    /// Student-t with `df` degrees of freedom.
    pub fn student_t(df: f64) -> Result<Self> {
        check_df(df)?;
        Ok(Reference::StudentT { df })
    }

    /// Chi-squared with `df` degrees of freedom.
    pub fn chi_squared(df: f64) -> Result<Self> {
        check_df(df)?;
        Ok(Reference::ChiSquared { df })
    }

    /// Symbol of the statistic: `z`, `t` or `chi2`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Reference::Normal => "z",
            Reference::StudentT { .. } => "t",
            Reference::ChiSquared { .. } => "chi2",
        }
    }

    pub fn cdf(&self, x: f64) -> Result<f64> {
        Ok(match self {
            Reference::Normal => standard_normal()?.cdf(x),
            Reference::StudentT { df } => student(*df)?.cdf(x),
            Reference::ChiSquared { df } => {
                if x <= 0.0 {
                    0.0
                } else {
                    chi2(*df)?.cdf(x)
                }
            }
        })
    }

    pub fn pdf(&self, x: f64) -> Result<f64> {
        Ok(match self {
            Reference::Normal => standard_normal()?.pdf(x),
            Reference::StudentT { df } => student(*df)?.pdf(x),
            Reference::ChiSquared { df } => {
                if x <= 0.0 {
                    0.0
                } else {
                    chi2(*df)?.pdf(x)
                }
            }
        })
    }

    /// Quantile function. `p` must lie strictly inside (0, 1).
    pub fn ppf(&self, p: f64) -> Result<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(DistError::Domain(format!(
                "quantile probability must lie strictly between 0 and 1, got {p}"
            )));
        }
        match self {
            Reference::Normal => Ok(standard_normal()?.inverse_cdf(p)),
            Reference::StudentT { df } => {
                let dist = student(*df)?;
                let guess = standard_normal()?.inverse_cdf(p);
                Ok(invert_cdf(|x| dist.cdf(x), |x| dist.pdf(x), p, guess, f64::NEG_INFINITY))
            }
            Reference::ChiSquared { df } => {
                let dist = chi2(*df)?;
                Ok(invert_cdf(|x| dist.cdf(x), |x| dist.pdf(x), p, df.max(1.0), 0.0))
            }
        }
    }
}

impl Tail {
    /// Critical value at significance `alpha`:
    /// two-sided `ppf(1 - alpha/2)`, left `ppf(alpha)`, right `ppf(1 - alpha)`.
    pub fn critical_value(&self, reference: &Reference, alpha: f64) -> Result<f64> {
        check_alpha(alpha)?;
        let q = match self {
            Tail::TwoSided => reference.ppf(1.0 - alpha / 2.0)?,
            Tail::Left => reference.ppf(alpha)?,
            Tail::Right => reference.ppf(1.0 - alpha)?,
        };
        debug!(tail = self.as_str(), alpha, critical = q, "critical value");
        Ok(q)
    }

    /// p-value of `stat`: two-sided `2(1 - cdf(|x|))`, left `cdf(x)`,
    /// right `1 - cdf(x)`.
    pub fn p_value(&self, reference: &Reference, stat: f64) -> Result<f64> {
        let p = match self {
            Tail::TwoSided => 2.0 * (1.0 - reference.cdf(stat.abs())?),
            Tail::Left => reference.cdf(stat)?,
            Tail::Right => 1.0 - reference.cdf(stat)?,
        };
        Ok(p.clamp(0.0, 1.0))
    }

    /// Statistic whose p-value is `p`. Two-sided yields the positive root.
    pub fn statistic_from_p(&self, reference: &Reference, p: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(DistError::Domain(format!("p-value must lie in [0, 1], got {p}")));
        }
        match self {
            Tail::TwoSided => reference.ppf(1.0 - p / 2.0),
            Tail::Left => reference.ppf(p),
            Tail::Right => reference.ppf(1.0 - p),
        }
    }
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> Result<f64> {
    Reference::Normal.cdf(x)
}

/// Standard normal quantile.
pub fn normal_ppf(p: f64) -> Result<f64> {
    Reference::Normal.ppf(p)
}

/// Reject significance levels outside (0, 1).
pub fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(DistError::Domain(format!(
            "significance level alpha must lie strictly between 0 and 1, got {alpha}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_df(df: f64) -> Result<()> {
    if df > 0.0 && df.is_finite() {
        Ok(())
    } else {
        Err(DistError::Parameter(format!(
            "degrees of freedom must be > 0, got {df}"
        )))
    }
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| DistError::Parameter(e.to_string()))
}

fn student(df: f64) -> Result<StudentsT> {
    check_df(df)?;
    StudentsT::new(0.0, 1.0, df).map_err(|e| DistError::Parameter(e.to_string()))
}

fn chi2(df: f64) -> Result<ChiSquared> {
    check_df(df)?;
    ChiSquared::new(df).map_err(|e| DistError::Parameter(e.to_string()))
}

/// Solve `cdf(x) = p` by safeguarded Newton iteration.
///
/// A bracket is grown outward from `guess` (never below `floor`), then
/// Newton steps are taken while they stay inside the bracket; otherwise the
/// bracket is bisected.
fn invert_cdf(
    cdf: impl Fn(f64) -> f64,
    pdf: impl Fn(f64) -> f64,
    p: f64,
    guess: f64,
    floor: f64,
) -> f64 {
    let mut lo = if floor.is_finite() { floor } else { guess - 1.0 };
    let mut hi = guess.max(lo) + 1.0;
    let mut step = 1.0;
    while cdf(lo) > p && !floor.is_finite() {
        step *= 2.0;
        lo -= step;
    }
    step = 1.0;
    while cdf(hi) < p {
        step *= 2.0;
        hi += step;
    }

    let mut x = guess.clamp(lo, hi);
    for _ in 0..200 {
        let fx = cdf(x) - p;
        if fx.abs() < 1e-14 {
            break;
        }
        if fx < 0.0 {
            lo = x;
        } else {
            hi = x;
        }
        let density = pdf(x);
        let newton = if density > 1e-300 { x - fx / density } else { f64::NAN };
        x = if newton.is_finite() && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        if hi - lo < 1e-13 * x.abs().max(1.0) {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn normal_quantiles() {
        assert!(approx(normal_ppf(0.975).unwrap(), 1.959964, 1e-6));
        assert!(approx(normal_cdf(1.644854).unwrap(), 0.95, 1e-6));
    }

    #[test]
    fn student_t_quantiles() {
        let t = Reference::student_t(24.0).unwrap();
        assert!(approx(t.ppf(0.975).unwrap(), 2.063899, 1e-5));
        assert!(approx(t.ppf(0.025).unwrap(), -2.063899, 1e-5));
        let t1 = Reference::student_t(1.0).unwrap();
        assert!(approx(t1.ppf(0.995).unwrap(), 63.656741, 1e-3));
    }

    #[test]
    fn chi_squared_quantiles() {
        let c = Reference::chi_squared(9.0).unwrap();
        assert!(approx(c.ppf(0.975).unwrap(), 19.022768, 1e-4));
        assert!(approx(c.ppf(0.025).unwrap(), 2.700389, 1e-4));
        let c1 = Reference::chi_squared(1.0).unwrap();
        assert!(approx(c1.ppf(0.95).unwrap(), 3.841459, 1e-4));
    }

    #[test]
    fn critical_values_per_tail() {
        let z = Reference::Normal;
        assert!(approx(Tail::TwoSided.critical_value(&z, 0.05).unwrap(), 1.959964, 1e-6));
        assert!(approx(Tail::Left.critical_value(&z, 0.05).unwrap(), -1.644854, 1e-6));
        assert!(approx(Tail::Right.critical_value(&z, 0.05).unwrap(), 1.644854, 1e-6));
        assert!(Tail::Right.critical_value(&z, 1.5).is_err());
    }

    #[test]
    fn p_values_per_tail() {
        let z = Reference::Normal;
        assert!(approx(Tail::TwoSided.p_value(&z, -1.959964).unwrap(), 0.05, 1e-6));
        assert!(approx(Tail::Left.p_value(&z, -1.644854).unwrap(), 0.05, 1e-6));
        assert!(approx(Tail::Right.p_value(&z, 1.644854).unwrap(), 0.05, 1e-6));
    }

    #[test]
    fn statistic_from_p_inverts_p_value() {
        let t = Reference::student_t(10.0).unwrap();
        for tail in Tail::ALL {
            let stat = tail.statistic_from_p(&t, 0.03).unwrap();
            assert!(approx(tail.p_value(&t, stat).unwrap(), 0.03, 1e-9), "{tail}");
        }
    }

    #[test]
    fn invalid_degrees_of_freedom() {
        assert!(matches!(Reference::student_t(0.0), Err(DistError::Parameter(_))));
        assert!(matches!(Reference::chi_squared(-1.0), Err(DistError::Parameter(_))));
    }
}
