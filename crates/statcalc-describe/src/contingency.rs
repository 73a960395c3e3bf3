//! Chi-squared test of independence and the contingency coefficient of a
//! frequency table.

use serde::Serialize;
use statcalc_dist::{Reference, Tail};
use tracing::debug;

use crate::error::{DescribeError, Result};

/// Interpretation of the corrected coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContingencyStrength {
    Weak,
    Medium,
    Strong,
}

impl ContingencyStrength {
    pub fn classify(c_corr: f64) -> Self {
        if c_corr < 0.3 {
            ContingencyStrength::Weak
        } else if c_corr < 0.5 {
            ContingencyStrength::Medium
        } else {
            ContingencyStrength::Strong
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContingencyStrength::Weak => "weak",
            ContingencyStrength::Medium => "medium",
            ContingencyStrength::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyReport {
    pub rows: usize,
    pub cols: usize,
    pub n: f64,
    pub expected: Vec<Vec<f64>>,
    pub chi2: f64,
    pub df: usize,
    pub p_value: f64,
    /// Whether Yates' continuity correction was applied (2x2 tables).
    pub yates: bool,
    pub c: f64,
    pub c_max: f64,
    pub c_corr: f64,
    pub strength: ContingencyStrength,
}

/// Contingency coefficient `C = sqrt(chi2 / (chi2 + n))` and
/// `C_corr = C / sqrt((m - 1) / m)` with `m = min(rows, cols)`.
///
/// Expected counts are `row_total * col_total / n`. With one degree of
/// freedom each observed count is first moved up to 0.5 towards its
/// expectation.
pub fn contingency(table: &[Vec<f64>]) -> Result<ContingencyReport> {
    let (rows, cols) = check_table(table)?;
    let row_totals: Vec<f64> = table.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..cols).map(|j| table.iter().map(|r| r[j]).sum()).collect();
    let n: f64 = row_totals.iter().sum();

    if let Some(i) = row_totals.iter().position(|t| *t == 0.0) {
        return Err(DescribeError::InvalidTable(format!("row {} sums to zero", i + 1)));
    }
    if let Some(j) = col_totals.iter().position(|t| *t == 0.0) {
        return Err(DescribeError::InvalidTable(format!("column {} sums to zero", j + 1)));
    }

    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|rt| col_totals.iter().map(|ct| rt * ct / n).collect())
        .collect();

    let df = (rows - 1) * (cols - 1);
    let yates = df == 1;
    let mut chi2 = 0.0;
    for (observed_row, expected_row) in table.iter().zip(&expected) {
        for (&o, &e) in observed_row.iter().zip(expected_row) {
            let o = if yates {
                let diff = e - o;
                o + diff.signum() * diff.abs().min(0.5)
            } else {
                o
            };
            chi2 += (o - e).powi(2) / e;
        }
    }

    let p_value = Tail::Right.p_value(&Reference::chi_squared(df as f64)?, chi2)?;
    let c = (chi2 / (chi2 + n)).sqrt();
    let m = rows.min(cols) as f64;
    let c_max = ((m - 1.0) / m).sqrt();
    let c_corr = c / c_max;

    debug!(rows, cols, chi2, df, c, c_corr, "contingency table evaluated");
    Ok(ContingencyReport {
        rows,
        cols,
        n,
        expected,
        chi2,
        df,
        p_value,
        yates,
        c,
        c_max,
        c_corr,
        strength: ContingencyStrength::classify(c_corr),
    })
}

fn check_table(table: &[Vec<f64>]) -> Result<(usize, usize)> {
    let rows = table.len();
    let cols = table.first().map_or(0, Vec::len);
    if rows < 2 || cols < 2 {
        return Err(DescribeError::InvalidTable(format!(
            "needs at least 2 rows and 2 columns (got {rows}x{cols})"
        )));
    }
    if let Some(i) = table.iter().position(|r| r.len() != cols) {
        return Err(DescribeError::InvalidTable(format!(
            "row {} has {} entries, expected {cols}",
            i + 1,
            table[i].len()
        )));
    }
    if let Some(bad) = table.iter().flatten().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(DescribeError::InvalidTable(format!(
            "counts must be non-negative (got {bad})"
        )));
    }
    Ok((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn two_by_two_uses_yates() {
        let r = contingency(&[vec![10.0, 20.0], vec![15.0, 25.0]]).unwrap();
        assert!(r.yates);
        assert_eq!(r.df, 1);
        assert_eq!(r.n, 70.0);
        assert!(approx(r.expected[0][0], 10.714286, 1e-6));
        assert!(approx(r.chi2, 0.011667, 1e-6));
        assert!(approx(r.p_value, 0.913986, 1e-5));
        assert_eq!(r.strength, ContingencyStrength::Weak);
    }

    #[test]
    fn two_by_three() {
        let r = contingency(&[vec![20.0, 10.0, 5.0], vec![5.0, 15.0, 25.0]]).unwrap();
        assert!(!r.yates);
        assert_eq!(r.df, 2);
        assert!(approx(r.chi2, 22.433862, 1e-6));
        assert!(approx(r.p_value, 1.344462e-5, 1e-9));
        assert!(approx(r.c, 0.467983, 1e-6));
        assert!(approx(r.c_corr, 0.661828, 1e-6));
        assert_eq!(r.strength.label(), "strong");
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(matches!(
            contingency(&[vec![1.0, 2.0]]),
            Err(DescribeError::InvalidTable(_))
        ));
        assert!(matches!(
            contingency(&[vec![1.0, 2.0], vec![3.0]]),
            Err(DescribeError::InvalidTable(_))
        ));
        assert!(matches!(
            contingency(&[vec![0.0, 0.0], vec![3.0, 4.0]]),
            Err(DescribeError::InvalidTable(_))
        ));
        assert!(matches!(
            contingency(&[vec![-1.0, 2.0], vec![3.0, 4.0]]),
            Err(DescribeError::InvalidTable(_))
        ));
    }

    #[test]
    fn strength_boundaries() {
        assert_eq!(ContingencyStrength::classify(0.29), ContingencyStrength::Weak);
        assert_eq!(ContingencyStrength::classify(0.3), ContingencyStrength::Medium);
        assert_eq!(ContingencyStrength::classify(0.5), ContingencyStrength::Strong);
    }
}
