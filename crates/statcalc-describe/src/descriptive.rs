//! Location, spread and quartiles of a single data list.

use serde::Serialize;
use tracing::debug;

use crate::error::{DescribeError, Result};

/// Denominator of the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceKind {
    /// `n - 1`.
    #[default]
    Sample,
    /// `n`.
    Population,
}

impl VarianceKind {
    pub fn label(self) -> &'static str {
        match self {
            VarianceKind::Sample => "sample",
            VarianceKind::Population => "population",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub n: usize,
    pub kind: VarianceKind,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// Exclusive-method quartiles, absent for a single value.
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub iqr: Option<f64>,
}

/// Summarize `data`. A sample variance needs at least two values.
pub fn summarize(data: &[f64], kind: VarianceKind) -> Result<Summary> {
    if data.is_empty() {
        return Err(DescribeError::Empty);
    }
    if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
        return Err(DescribeError::NotFinite(*bad));
    }
    let n = data.len();
    if kind == VarianceKind::Sample && n < 2 {
        return Err(DescribeError::TooFew {
            what: "sample variance",
            needed: 2,
            got: n,
        });
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = data.iter().sum::<f64>() / n as f64;
    let ss: f64 = data.iter().map(|v| (v - mean).powi(2)).sum();
    let variance = match kind {
        VarianceKind::Sample => ss / (n - 1) as f64,
        VarianceKind::Population => ss / n as f64,
    };
    let min = sorted[0];
    let max = sorted[n - 1];
    let quarts = quartiles(&sorted).ok();

    debug!(n, mean, variance, kind = kind.label(), "summarized data");
    Ok(Summary {
        n,
        kind,
        mean,
        median: median(&sorted),
        variance,
        sd: variance.sqrt(),
        min,
        max,
        range: max - min,
        q1: quarts.map(|q| q[0]),
        q3: quarts.map(|q| q[2]),
        iqr: quarts.map(|q| q[2] - q[0]),
    })
}

/// Q1, Q2 and Q3 of sorted data by the exclusive method: the j-th quartile
/// sits at 1-based position `(n + 1) * j / 4`, linearly interpolated and
/// extrapolated from the nearest pair when the position falls outside.
pub fn quartiles(sorted: &[f64]) -> Result<[f64; 3]> {
    let n = sorted.len();
    if n < 2 {
        return Err(DescribeError::TooFew {
            what: "quartiles",
            needed: 2,
            got: n,
        });
    }
    let m = n as i64 + 1;
    let mut out = [0.0; 3];
    for (slot, i) in out.iter_mut().zip(1i64..) {
        let j = (i * m / 4).clamp(1, n as i64 - 1);
        let delta = (i * m - j * 4) as f64;
        let j = j as usize;
        *slot = (sorted[j - 1] * (4.0 - delta) + sorted[j] * delta) / 4.0;
    }
    Ok(out)
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
