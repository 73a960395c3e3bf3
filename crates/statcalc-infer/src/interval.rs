//! Confidence intervals for a mean (Z or t) and for a variance (chi-squared).

use serde::Serialize;
use statcalc_dist::{Reference, Tail, check_alpha};
use statcalc_formula::types::format_value;
use statcalc_formula::{Assignments, Derivation, Step};
use tracing::debug;

use crate::Defaults;
use crate::error::{InferError, Result};
use crate::input;

const X_BAR: &[&str] = &["x_bar", "xbar", "x", "stichprobenmittelwert"];
const FOR_VARIANCE: &[&str] = &["fuer_varianz", "fuervarianz", "fuer_variance", "for_variance", "typ", "type"];

/// What the interval covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Mean with known population standard deviation.
    MeanZ,
    /// Mean with sample standard deviation, `df = n - 1`.
    MeanT,
    /// Population variance via chi-squared, `df = n - 1`.
    Variance,
}

impl IntervalKind {
    pub fn label(self) -> &'static str {
        match self {
            IntervalKind::MeanZ => "mean (Z)",
            IntervalKind::MeanT => "mean (t)",
            IntervalKind::Variance => "variance (chi-squared)",
        }
    }
}

/// A closed interval; either end may be infinite for one-sided intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    fn sqrt(&self) -> Bounds {
        Bounds {
            lower: self.lower.max(0.0).sqrt(),
            upper: self.upper.sqrt(),
        }
    }
}

/// A quantile used for the bounds, e.g. `z_(0.975) = 1.96`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantile {
    pub level: f64,
    pub value: f64,
}

/// Result of an interval calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalReport {
    pub kind: IntervalKind,
    pub tail: Tail,
    pub alpha: f64,
    pub confidence: f64,
    pub n: f64,
    pub df: Option<f64>,
    /// `x_bar` for mean intervals, `s^2` for the variance interval.
    pub estimate: f64,
    pub standard_error: Option<f64>,
    pub quantiles: Vec<Quantile>,
    pub bounds: Bounds,
    /// Standard deviation bounds, for the variance interval.
    pub sd_bounds: Option<Bounds>,
    pub derivation: Derivation,
}

/// Parsed arguments of the interval calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalInput {
    pub x_bar: Option<f64>,
    pub n: Option<f64>,
    pub alpha: Option<f64>,
    pub tail: Option<Tail>,
    pub sigma: Option<f64>,
    pub s: Option<f64>,
    pub variance: Option<f64>,
    pub for_variance: bool,
}

impl IntervalInput {
    pub fn from_assignments(args: &mut Assignments) -> Result<Self> {
        let for_variance = match args.take(FOR_VARIANCE) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "varianz" | "variance" | "sigma2" => true,
                other => statcalc_formula::parser::parse_flag(other)?,
            },
            None => false,
        };
        Ok(Self {
            x_bar: args.number(X_BAR)?.value(),
            n: args.number(&["n"])?.value(),
            alpha: input::alpha(args)?,
            tail: input::tail(args)?,
            sigma: args.number(input::SIGMA)?.value(),
            s: args.number(input::SAMPLE_SD)?.value(),
            variance: args.number(input::VARIANCE)?.value(),
            for_variance,
        })
    }
}

/// Pick the interval kind from the given arguments and compute it.
///
/// The variance interval is chosen when requested or when only a sample
/// spread without `x_bar` is given; otherwise `sigma` selects the Z and `s`
/// the t interval.
pub fn compute(input: IntervalInput, defaults: &Defaults) -> Result<IntervalReport> {
    let mut prelude = Derivation::new();
    let mut s = input.s;
    if let Some(var) = input.variance {
        if var < 0.0 {
            return Err(InferError::InvalidInput(format!(
                "variance must not be negative, got {}",
                format_value(var)
            )));
        }
        if s.is_none() {
            let value = var.sqrt();
            prelude.push(Step::new("s", "sqrt(shoch2)", format!("sqrt({})", format_value(var)), value));
            s = Some(value);
        }
    }

    let n = input::require(input.n, "n must be given")?;
    let alpha = input.alpha.unwrap_or(defaults.alpha);
    let tail = input.tail.unwrap_or(defaults.tail);

    let mut report = if input.for_variance || (input.x_bar.is_none() && s.is_some()) {
        let s = input::require(s, "s or shoch2 must be given for the variance interval")?;
        variance_interval(s, n, alpha, tail)?
    } else {
        let x_bar = input::require(input.x_bar, "x_bar must be given for the mean interval")?;
        match (input.sigma, s) {
            (Some(sigma), _) => mean_interval(x_bar, sigma, n, alpha, tail, IntervalKind::MeanZ)?,
            (None, Some(s)) => mean_interval(x_bar, s, n, alpha, tail, IntervalKind::MeanT)?,
            (None, None) => {
                return Err(InferError::MissingInput(
                    "either sigma (Z) or s / shoch2 (t) must be given".into(),
                ));
            }
        }
    };

    prelude.extend(report.derivation);
    report.derivation = prelude;
    Ok(report)
}

/// Interval for a mean: two-sided `x_bar +/- q * SE` with `q` at
/// `1 - alpha/2`; left-sided `[x_bar - q * SE, inf)` and right-sided
/// `(-inf, x_bar + q * SE]` with `q` at `1 - alpha`.
pub fn mean_interval(
    x_bar: f64,
    sd: f64,
    n: f64,
    alpha: f64,
    tail: Tail,
    kind: IntervalKind,
) -> Result<IntervalReport> {
    check_alpha(alpha)?;
    let (reference, sd_name) = match kind {
        IntervalKind::MeanZ => {
            check_n(n, 0.0)?;
            (Reference::Normal, "sigma")
        }
        IntervalKind::MeanT => {
            check_n(n, 1.0)?;
            (Reference::student_t(n - 1.0)?, "s")
        }
        IntervalKind::Variance => {
            return Err(InferError::InvalidInput("use variance_interval for variances".into()));
        }
    };
    check_sd(sd_name, sd)?;

    let mut derivation = Derivation::new();
    let se = sd / n.sqrt();
    derivation.push(Step::new(
        "SE",
        format!("{sd_name} / sqrt(n)"),
        format!("{} / sqrt({})", format_value(sd), format_value(n)),
        se,
    ));

    let level = match tail {
        Tail::TwoSided => 1.0 - alpha / 2.0,
        Tail::Left | Tail::Right => 1.0 - alpha,
    };
    let q = reference.ppf(level)?;
    let symbol = reference.symbol();
    derivation.note(symbol, format!("{symbol}_({})", format_value(level)), q);

    let margin = q * se;
    let bounds = match tail {
        Tail::TwoSided => Bounds { lower: x_bar - margin, upper: x_bar + margin },
        Tail::Left => Bounds { lower: x_bar - margin, upper: f64::INFINITY },
        Tail::Right => Bounds { lower: f64::NEG_INFINITY, upper: x_bar + margin },
    };
    if bounds.lower.is_finite() {
        derivation.push(Step::new(
            "lower",
            format!("x_bar - {symbol} * SE"),
            format!("{} - {} * {}", format_value(x_bar), format_value(q), format_value(se)),
            bounds.lower,
        ));
    }
    if bounds.upper.is_finite() {
        derivation.push(Step::new(
            "upper",
            format!("x_bar + {symbol} * SE"),
            format!("{} + {} * {}", format_value(x_bar), format_value(q), format_value(se)),
            bounds.upper,
        ));
    }

    debug!(kind = kind.label(), tail = tail.as_str(), lower = bounds.lower, upper = bounds.upper, "mean interval");
    Ok(IntervalReport {
        kind,
        tail,
        alpha,
        confidence: 1.0 - alpha,
        n,
        df: match reference {
            Reference::StudentT { df } => Some(df),
            _ => None,
        },
        estimate: x_bar,
        standard_error: Some(se),
        quantiles: vec![Quantile { level, value: q }],
        bounds,
        sd_bounds: None,
        derivation,
    })
}

/// Interval for a variance from sample standard deviation `s`:
/// two-sided `[(n-1)s^2 / chi2_(1-alpha/2), (n-1)s^2 / chi2_(alpha/2)]`,
/// left-sided `[0, (n-1)s^2 / chi2_(1-alpha)]`, right-sided
/// `[(n-1)s^2 / chi2_(alpha), inf)`. Standard deviation bounds are the
/// square roots.
pub fn variance_interval(s: f64, n: f64, alpha: f64, tail: Tail) -> Result<IntervalReport> {
    check_alpha(alpha)?;
    check_n(n, 1.0)?;
    check_sd("s", s)?;

    let df = n - 1.0;
    let reference = Reference::chi_squared(df)?;
    let s2 = s * s;
    let scaled = df * s2;

    let mut derivation = Derivation::new();
    derivation.note("df", format!("n - 1 = {} - 1", format_value(n)), df);
    derivation.push(Step::new(
        "(n-1)s^2",
        "df * s^2",
        format!("{} * {}^2", format_value(df), format_value(s)),
        scaled,
    ));

    let mut quantiles = Vec::new();
    let mut quantile = |level: f64, derivation: &mut Derivation| -> Result<f64> {
        let value = reference.ppf(level)?;
        derivation.note("chi2", format!("chi2_({}; df={})", format_value(level), format_value(df)), value);
        quantiles.push(Quantile { level, value });
        Ok(value)
    };

    let bounds = match tail {
        Tail::TwoSided => {
            let low_q = quantile(alpha / 2.0, &mut derivation)?;
            let high_q = quantile(1.0 - alpha / 2.0, &mut derivation)?;
            Bounds { lower: scaled / high_q, upper: scaled / low_q }
        }
        Tail::Left => {
            let high_q = quantile(1.0 - alpha, &mut derivation)?;
            Bounds { lower: 0.0, upper: scaled / high_q }
        }
        Tail::Right => {
            let low_q = quantile(alpha, &mut derivation)?;
            Bounds { lower: scaled / low_q, upper: f64::INFINITY }
        }
    };
    derivation.note("lower", "(n-1)s^2 / chi2_upper", bounds.lower);
    derivation.note("upper", "(n-1)s^2 / chi2_lower", bounds.upper);

    debug!(tail = tail.as_str(), lower = bounds.lower, upper = bounds.upper, "variance interval");
    Ok(IntervalReport {
        kind: IntervalKind::Variance,
        tail,
        alpha,
        confidence: 1.0 - alpha,
        n,
        df: Some(df),
        estimate: s2,
        standard_error: None,
        quantiles,
        bounds,
        sd_bounds: Some(bounds.sqrt()),
        derivation,
    })
}

fn check_n(n: f64, above: f64) -> Result<()> {
    if n > above && n.is_finite() {
        Ok(())
    } else {
        Err(InferError::InvalidInput(format!(
            "sample size n must be > {}, got {}",
            format_value(above),
            format_value(n)
        )))
    }
}

fn check_sd(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(InferError::InvalidInput(format!(
            "standard deviation {name} must be > 0, got {}",
            format_value(value)
        )))
    }
}
