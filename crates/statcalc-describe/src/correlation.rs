//! Pearson and Spearman correlation of paired lists.

use serde::Serialize;
use statcalc_dist::{Reference, Tail};
use tracing::debug;

use crate::error::{DescribeError, Result};

/// Interpretation of |r|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    None,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn classify(r: f64) -> Self {
        let r = r.abs();
        if r < 0.1 {
            Strength::None
        } else if r < 0.3 {
            Strength::Weak
        } else if r < 0.5 {
            Strength::Moderate
        } else if r < 0.7 {
            Strength::Strong
        } else {
            Strength::VeryStrong
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strength::None => "no",
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
            Strength::VeryStrong => "very strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    Zero,
}

impl Direction {
    pub fn of(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else if r < 0.0 {
            Direction::Negative
        } else {
            Direction::Zero
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
            Direction::Zero => "none",
        }
    }
}

/// A correlation coefficient with its two-sided p-value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub value: f64,
    /// t statistic `r * sqrt((n - 2) / (1 - r^2))`, absent when |r| = 1 or n = 2.
    pub t: Option<f64>,
    pub df: usize,
    pub p_value: f64,
    pub strength: Strength,
    pub direction: Direction,
}

impl Coefficient {
    fn new(value: f64, n: usize) -> Result<Self> {
        let df = n - 2;
        let (t, p_value) = if df == 0 {
            (None, 1.0)
        } else if value.abs() >= 1.0 {
            (None, 0.0)
        } else {
            let t = value * (df as f64 / (1.0 - value * value)).sqrt();
            let p = Tail::TwoSided.p_value(&Reference::student_t(df as f64)?, t)?;
            (Some(t), p)
        };
        Ok(Self {
            value,
            t,
            df,
            p_value,
            strength: Strength::classify(value),
            direction: Direction::of(value),
        })
    }

    /// Two-sided `p < alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// "strong positive", "no" and so on.
    pub fn describe(&self) -> String {
        match self.strength {
            Strength::None => "no correlation".to_string(),
            s => format!("{} {} correlation", s.label(), self.direction.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub n: usize,
    pub x_mean: f64,
    pub y_mean: f64,
    pub sxy: f64,
    pub sxx: f64,
    pub syy: f64,
    pub pearson: Coefficient,
    pub x_ranks: Vec<f64>,
    pub y_ranks: Vec<f64>,
    /// Sum of squared rank differences.
    pub d_squared: f64,
    pub spearman: Coefficient,
}

/// Pearson and Spearman coefficients of `x` and `y`.
pub fn correlate(x: &[f64], y: &[f64]) -> Result<CorrelationReport> {
    check_pairs(x, y)?;
    let n = x.len();
    let x_mean = mean(x);
    let y_mean = mean(y);
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - x_mean) * (b - y_mean)).sum();
    let sxx: f64 = x.iter().map(|a| (a - x_mean).powi(2)).sum();
    let syy: f64 = y.iter().map(|b| (b - y_mean).powi(2)).sum();
    let r = ratio(sxy, sxx, syy);

    let x_ranks = rank(x);
    let y_ranks = rank(y);
    let d_squared: f64 = x_ranks.iter().zip(&y_ranks).map(|(a, b)| (a - b).powi(2)).sum();
    let nf = n as f64;
    let rho = 1.0 - 6.0 * d_squared / (nf * (nf * nf - 1.0));

    debug!(n, r, rho, "correlated");
    Ok(CorrelationReport {
        n,
        x_mean,
        y_mean,
        sxy,
        sxx,
        syy,
        pearson: Coefficient::new(r, n)?,
        x_ranks,
        y_ranks,
        d_squared,
        spearman: Coefficient::new(rho, n)?,
    })
}

/// Pearson r = Sxy / sqrt(Sxx * Syy); 0 when either list is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    Ok(correlate(x, y)?.pearson.value)
}

/// Spearman rho = 1 - 6 * sum(d^2) / (n * (n^2 - 1)) on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    Ok(correlate(x, y)?.spearman.value)
}

/// 1-based ranks; tied values share the average of their positions.
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let average = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = average;
        }
        i = j;
    }
    ranks
}

fn check_pairs(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(DescribeError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(DescribeError::TooFew {
            what: "correlation",
            needed: 2,
            got: x.len(),
        });
    }
    if let Some(bad) = x.iter().chain(y).find(|v| !v.is_finite()) {
        return Err(DescribeError::NotFinite(*bad));
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn ratio(sxy: f64, sxx: f64, syy: f64) -> f64 {
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (sxy / denominator).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn pearson_and_spearman_with_ties() {
        let r = correlate(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!(approx(r.pearson.value, 0.774597, 1e-6));
        assert!(approx(r.pearson.p_value, 0.124027, 1e-5));
        assert_eq!(r.pearson.df, 3);
        assert_eq!(r.y_ranks, vec![1.0, 2.5, 4.5, 2.5, 4.5]);
        assert_eq!(r.d_squared, 5.0);
        assert!(approx(r.spearman.value, 0.75, 1e-12));
        assert!(approx(r.spearman.p_value, 0.144294, 1e-5));
        assert_eq!(r.pearson.strength, Strength::VeryStrong);
        assert_eq!(r.spearman.describe(), "very strong positive correlation");
    }

    #[test]
    fn significance_against_alpha() {
        let r = correlate(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        // p = 0.124027
        assert!(!r.pearson.is_significant(0.05));
        assert!(r.pearson.is_significant(0.15));
        let perfect = correlate(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]).unwrap();
        assert!(perfect.spearman.is_significant(0.05));
    }

    #[test]
    fn perfect_negative() {
        let r = correlate(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]).unwrap();
        assert_eq!(r.pearson.value, -1.0);
        assert_eq!(r.pearson.p_value, 0.0);
        assert_eq!(r.pearson.direction, Direction::Negative);
        assert_eq!(r.spearman.value, -1.0);
    }

    #[test]
    fn constant_list_gives_zero() {
        let r = correlate(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(r.pearson.value, 0.0);
        assert_eq!(r.pearson.describe(), "no correlation");
        assert_eq!(r.pearson.direction, Direction::Zero);
    }

    #[test]
    fn two_pairs_have_no_degrees_of_freedom() {
        let r = correlate(&[1.0, 2.0], &[3.0, 1.0]).unwrap();
        assert_eq!(r.pearson.df, 0);
        assert_eq!(r.pearson.p_value, 1.0);
        assert_eq!(r.pearson.t, None);
    }

    #[test]
    fn validation() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(DescribeError::LengthMismatch { x: 2, y: 1 })
        );
        assert!(matches!(
            spearman(&[1.0], &[1.0]),
            Err(DescribeError::TooFew { needed: 2, got: 1, .. })
        ));
    }

    #[test]
    fn strength_boundaries() {
        assert_eq!(Strength::classify(0.09), Strength::None);
        assert_eq!(Strength::classify(-0.1), Strength::Weak);
        assert_eq!(Strength::classify(0.3), Strength::Moderate);
        assert_eq!(Strength::classify(0.5), Strength::Strong);
        assert_eq!(Strength::classify(-0.7), Strength::VeryStrong);
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(rank(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }
}
