//! Counting distributions (binomial, hypergeometric, Poisson) evaluated
//! under a [`Comparison`] mode.

use serde::Serialize;
use statrs::distribution::{Binomial, Discrete, DiscreteCDF, Hypergeometric, Poisson};
use tracing::debug;

use crate::enums::Comparison;
use crate::error::{DistError, Result};

/// A distribution over non-negative counts.
pub trait CountingDistribution {
    /// Short name with parameters, e.g. `B(10, 0.4)`.
    fn name(&self) -> String;

    /// P(X = k).
    fn pmf(&self, k: u64) -> f64;

    /// P(X <= k).
    fn cdf(&self, k: u64) -> f64;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;

    /// Largest attainable count, if bounded.
    fn max_count(&self) -> Option<u64>;
}

impl Comparison {
    /// Probability of the event `X op k`:
    /// at_most `F(k)`, at_least `1 - F(k-1)`, exactly `f(k)`,
    /// more_than `1 - F(k)`, less_than `F(k-1)`.
    pub fn evaluate<D: CountingDistribution + ?Sized>(&self, dist: &D, k: u64) -> f64 {
        let value = match self {
            Comparison::AtMost => dist.cdf(k),
            Comparison::AtLeast => match k.checked_sub(1) {
                Some(below) => 1.0 - dist.cdf(below),
                None => 1.0,
            },
            Comparison::Exactly => dist.pmf(k),
            Comparison::MoreThan => 1.0 - dist.cdf(k),
            Comparison::LessThan => match k.checked_sub(1) {
                Some(below) => dist.cdf(below),
                None => 0.0,
            },
        };
        value.clamp(0.0, 1.0)
    }
}

/// Result of evaluating a counting distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountProbability {
    pub distribution: String,
    pub mode: Comparison,
    pub k: u64,
    /// Event text, e.g. `P(X >= 7)`.
    pub event: String,
    /// CDF combinator, e.g. `1 - F(6)`.
    pub combinator: String,
    pub probability: f64,
    pub mean: f64,
    pub variance: f64,
}

/// Evaluate `dist` at `k` under `mode`.
pub fn probability<D: CountingDistribution + ?Sized>(
    dist: &D,
    k: u64,
    mode: Comparison,
) -> CountProbability {
    let probability = mode.evaluate(dist, k);
    debug!(distribution = %dist.name(), k, mode = mode.as_str(), probability, "evaluated");
    CountProbability {
        distribution: dist.name(),
        mode,
        k,
        event: format!("P(X {} {k})", mode.symbol()),
        combinator: mode.combinator(k),
        probability,
        mean: dist.mean(),
        variance: dist.variance(),
    }
}

// ---------------------------------------------------------------------------
// Binomial
// ---------------------------------------------------------------------------

/// Binomial distribution B(n, p).
#[derive(Debug, Clone)]
pub struct BinomialModel {
    n: u64,
    p: f64,
    inner: Binomial,
}

impl BinomialModel {
    pub fn new(n: u64, p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(DistError::Parameter(format!(
                "success probability p must lie in [0, 1], got {p}"
            )));
        }
        let inner = Binomial::new(p, n).map_err(|e| DistError::Parameter(e.to_string()))?;
        Ok(Self { n, p, inner })
    }

    /// Reject counts outside `0..=n`.
    pub fn check_count(&self, k: u64) -> Result<()> {
        if k > self.n {
            return Err(DistError::Parameter(format!(
                "k = {k} exceeds the number of trials n = {}",
                self.n
            )));
        }
        Ok(())
    }
}

impl CountingDistribution for BinomialModel {
    fn name(&self) -> String {
        format!("B({}, {})", self.n, self.p)
    }

    fn pmf(&self, k: u64) -> f64 {
        self.inner.pmf(k)
    }

    fn cdf(&self, k: u64) -> f64 {
        if k >= self.n { 1.0 } else { self.inner.cdf(k) }
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }

    fn max_count(&self) -> Option<u64> {
        Some(self.n)
    }
}

// ---------------------------------------------------------------------------
// Hypergeometric
// ---------------------------------------------------------------------------

/// Hypergeometric distribution: `n` draws without replacement from a
/// population of `big_n` containing `big_m` successes.
#[derive(Debug, Clone)]
pub struct HypergeometricModel {
    big_n: u64,
    big_m: u64,
    n: u64,
    inner: Hypergeometric,
}

impl HypergeometricModel {
    pub fn new(big_n: u64, big_m: u64, n: u64) -> Result<Self> {
        if big_m > big_n {
            return Err(DistError::Parameter(format!(
                "successes in population M = {big_m} exceed population size N = {big_n}"
            )));
        }
        if n > big_n {
            return Err(DistError::Parameter(format!(
                "sample size n = {n} exceeds population size N = {big_n}"
            )));
        }
        let inner = Hypergeometric::new(big_n, big_m, n)
            .map_err(|e| DistError::Parameter(e.to_string()))?;
        Ok(Self { big_n, big_m, n, inner })
    }

    /// Reject counts outside `0..=min(n, M)`.
    pub fn check_count(&self, k: u64) -> Result<()> {
        let max = self.n.min(self.big_m);
        if k > max {
            return Err(DistError::Parameter(format!(
                "k = {k} exceeds min(n, M) = {max}"
            )));
        }
        Ok(())
    }

    fn min_count(&self) -> u64 {
        (self.n + self.big_m).saturating_sub(self.big_n)
    }
}

impl CountingDistribution for HypergeometricModel {
    fn name(&self) -> String {
        format!("H({}, {}, {})", self.big_n, self.big_m, self.n)
    }

    fn pmf(&self, k: u64) -> f64 {
        if k < self.min_count() || k > self.n.min(self.big_m) {
            0.0
        } else {
            self.inner.pmf(k)
        }
    }

    fn cdf(&self, k: u64) -> f64 {
        let upper = k.min(self.n.min(self.big_m));
        let lower = self.min_count();
        if upper < lower {
            return 0.0;
        }
        (lower..=upper).map(|i| self.inner.pmf(i)).sum::<f64>().min(1.0)
    }

    fn mean(&self) -> f64 {
        if self.big_n == 0 {
            return 0.0;
        }
        self.n as f64 * self.big_m as f64 / self.big_n as f64
    }

    fn variance(&self) -> f64 {
        if self.big_n <= 1 {
            return 0.0;
        }
        let (nn, mm, n) = (self.big_n as f64, self.big_m as f64, self.n as f64);
        n * (mm / nn) * (1.0 - mm / nn) * (nn - n) / (nn - 1.0)
    }

    fn max_count(&self) -> Option<u64> {
        Some(self.n.min(self.big_m))
    }
}

// ---------------------------------------------------------------------------
// Poisson
// ---------------------------------------------------------------------------

/// Poisson distribution with rate `lambda`. A zero rate is a point mass at 0.
#[derive(Debug, Clone)]
pub struct PoissonModel {
    lambda: f64,
    inner: Option<Poisson>,
}

impl PoissonModel {
    pub fn new(lambda: f64) -> Result<Self> {
        if !(lambda >= 0.0 && lambda.is_finite()) {
            return Err(DistError::Parameter(format!(
                "rate lambda must be >= 0, got {lambda}"
            )));
        }
        let inner = if lambda == 0.0 {
            None
        } else {
            Some(Poisson::new(lambda).map_err(|e| DistError::Parameter(e.to_string()))?)
        };
        Ok(Self { lambda, inner })
    }
}

impl CountingDistribution for PoissonModel {
    fn name(&self) -> String {
        format!("Po({})", self.lambda)
    }

    fn pmf(&self, k: u64) -> f64 {
        match &self.inner {
            Some(p) => p.pmf(k),
            None => {
                if k == 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn cdf(&self, k: u64) -> f64 {
        match &self.inner {
            Some(p) => p.cdf(k),
            None => 1.0,
        }
    }

    fn mean(&self) -> f64 {
        self.lambda
    }

    fn variance(&self) -> f64 {
        self.lambda
    }

    fn max_count(&self) -> Option<u64> {
        None
    }
}

/// Convert a parsed count to `u64`, rejecting negatives and fractions.
pub fn count(name: &str, value: f64) -> Result<u64> {
    if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
        return Err(DistError::Parameter(format!(
            "{name} must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    // -- binomial ----------------------------------------------------------

    #[test]
    fn binomial_at_least_example() {
        let b = BinomialModel::new(10, 0.4).unwrap();
        let p = Comparison::AtLeast.evaluate(&b, 7);
        assert!(approx(p, 0.054762, 1e-5), "got {p}");
    }

    #[test]
    fn at_least_plus_less_than_is_one() {
        let models: Vec<Box<dyn CountingDistribution>> = vec![
            Box::new(BinomialModel::new(10, 0.4).unwrap()),
            Box::new(BinomialModel::new(7, 1.0).unwrap()),
            Box::new(HypergeometricModel::new(20, 12, 5).unwrap()),
            Box::new(PoissonModel::new(2.5).unwrap()),
        ];
        for m in &models {
            for k in 0..=8 {
                let total =
                    Comparison::AtLeast.evaluate(m.as_ref(), k) + Comparison::LessThan.evaluate(m.as_ref(), k);
                assert!(approx(total, 1.0, 1e-12), "{} k={k}: {total}", m.name());
            }
        }
    }

    #[test]
    fn at_most_plus_more_than_is_one() {
        let b = BinomialModel::new(12, 0.3).unwrap();
        for k in 0..=12 {
            let total = Comparison::AtMost.evaluate(&b, k) + Comparison::MoreThan.evaluate(&b, k);
            assert!(approx(total, 1.0, 1e-12));
        }
    }

    #[test]
    fn binomial_validation() {
        assert!(BinomialModel::new(10, 1.2).is_err());
        let b = BinomialModel::new(10, 0.5).unwrap();
        assert!(b.check_count(11).is_err());
        assert!(b.check_count(10).is_ok());
    }

    // -- hypergeometric ----------------------------------------------------

    #[test]
    fn hypergeometric_exact_example() {
        let h = HypergeometricModel::new(20, 12, 5).unwrap();
        let p = Comparison::Exactly.evaluate(&h, 3);
        // C(12,3) * C(8,2) / C(20,5)
        assert!(approx(p, 0.397317, 1e-5), "got {p}");
        assert!(approx(h.mean(), 3.0, 1e-12));
    }

    #[test]
    fn hypergeometric_support_errors() {
        assert!(matches!(HypergeometricModel::new(10, 12, 5), Err(DistError::Parameter(_))));
        assert!(matches!(HypergeometricModel::new(10, 4, 11), Err(DistError::Parameter(_))));
        let h = HypergeometricModel::new(20, 3, 5).unwrap();
        assert!(h.check_count(4).is_err());
    }

    #[test]
    fn hypergeometric_cdf_respects_lower_support() {
        // N=10, M=8, n=5: at least 3 successes are always drawn
        let h = HypergeometricModel::new(10, 8, 5).unwrap();
        assert_eq!(h.cdf(2), 0.0);
        assert!(approx(h.cdf(5), 1.0, 1e-12));
    }

    // -- poisson -----------------------------------------------------------

    #[test]
    fn poisson_values() {
        let p = PoissonModel::new(2.5).unwrap();
        assert!(approx(Comparison::Exactly.evaluate(&p, 3), 0.213763, 1e-6));
        assert!(approx(Comparison::AtMost.evaluate(&p, 3), 0.757576, 1e-6));
    }

    #[test]
    fn poisson_zero_rate_is_point_mass() {
        let p = PoissonModel::new(0.0).unwrap();
        assert_eq!(Comparison::Exactly.evaluate(&p, 0), 1.0);
        assert_eq!(Comparison::MoreThan.evaluate(&p, 0), 0.0);
        assert!(PoissonModel::new(-1.0).is_err());
    }

    #[test]
    fn count_conversion() {
        assert_eq!(count("k", 3.0).unwrap(), 3);
        assert!(count("k", -1.0).is_err());
        assert!(count("k", 2.5).is_err());
    }

    #[test]
    fn probability_report() {
        let b = BinomialModel::new(10, 0.4).unwrap();
        let r = probability(&b, 7, Comparison::AtLeast);
        assert_eq!(r.event, "P(X >= 7)");
        assert_eq!(r.combinator, "1 - F(6)");
        assert_eq!(r.distribution, "B(10, 0.4)");
        assert!(approx(r.mean, 4.0, 1e-12));
    }
}
