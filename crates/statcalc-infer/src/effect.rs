//! Cohen's d effect size and its conventional interpretation.

use serde::Serialize;
use statcalc_formula::{Assignments, FormulaRegistry};

use crate::error::Result;
use crate::score::{FormulaReport, evaluate};

/// Conventional magnitude of an effect size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSize {
    /// |d| below 0.2 negligible, below 0.5 small, below 0.8 medium,
    /// otherwise large.
    pub fn classify(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            EffectSize::Negligible
        } else if d < 0.5 {
            EffectSize::Small
        } else if d < 0.8 {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectSize::Negligible => "negligible",
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
        }
    }
}

/// Cohen's d calculation with its interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohensReport {
    #[serde(flatten)]
    pub formula: FormulaReport,
    pub d: Option<f64>,
    pub effect: Option<EffectSize>,
}

/// Solve `d = (x_bar - mu0) / sigma` for its missing variable and classify d.
pub fn cohens_d(
    registry: &FormulaRegistry,
    args: &mut Assignments,
    tolerance: f64,
) -> Result<CohensReport> {
    let formula = evaluate(registry, &["cohens-d"], args, tolerance)?;
    let d = formula.value("d");
    Ok(CohensReport {
        d,
        effect: d.map(EffectSize::classify),
        formula,
    })
}
