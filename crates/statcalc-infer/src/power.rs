//! Statistical power (1 - beta) of mean tests.
//!
//! One-sample Z power is exact under normality. The one-sample t-test uses
//! the noncentral t distribution below 30 observations and the normal
//! approximation above; the pooled two-sample t-test switches at 60
//! combined observations. Sample size and the alternative mean can be
//! solved from a target power for the Z-test.

use serde::Serialize;
use statcalc_dist::{Reference, Tail, check_alpha, noncentral_t_cdf, normal_cdf, normal_ppf};
use statcalc_formula::types::format_value;
use statcalc_formula::{Assignments, Derivation, Step};
use tracing::debug;

use crate::Defaults;
use crate::error::{InferError, Result};
use crate::input;

/// Below this `n` the one-sample t power uses the noncentral t.
pub const EXACT_T_BELOW: f64 = 30.0;
/// Below this `n1 + n2` the two-sample power uses the noncentral t.
pub const EXACT_TWO_SAMPLE_BELOW: f64 = 60.0;

const MU0: &[&str] = &["mu0", "mu_0", "mu_null", "populationsmittelwert_h0"];
const MU1: &[&str] = &["mu1", "mu_1", "mu_eins", "populationsmittelwert_h1", "x_bar1", "xbar1"];
const MU2: &[&str] = &["mu2", "mu_2", "mu_zwei", "populationsmittelwert_h2", "x_bar2", "xbar2"];
const POWER: &[&str] = &["power", "trennschaerfe", "trennschärfe", "1-beta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    /// One-sample Z-test.
    Z,
    /// One-sample t-test.
    T,
    /// Pooled two-sample t-test.
    TwoSampleT,
}

impl PowerKind {
    pub fn label(self) -> &'static str {
        match self {
            PowerKind::Z => "one-sample Z-test",
            PowerKind::T => "one-sample t-test",
            PowerKind::TwoSampleT => "two-sample t-test (pooled)",
        }
    }
}

/// How the alternative distribution was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Normal,
    NoncentralT,
}

/// What was computed from the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Power,
    SampleSize,
    AlternativeMean,
}

impl Target {
    pub fn label(self) -> &'static str {
        match self {
            Target::Power => "power",
            Target::SampleSize => "required sample size",
            Target::AlternativeMean => "detectable mean",
        }
    }
}

/// Verbal rating of a power value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerLabel {
    Low,
    Moderate,
    Sufficient,
}

impl PowerLabel {
    /// Below 0.5 low, below 0.8 moderate, otherwise sufficient.
    pub fn from_power(power: f64) -> Self {
        if power < 0.5 {
            PowerLabel::Low
        } else if power < 0.8 {
            PowerLabel::Moderate
        } else {
            PowerLabel::Sufficient
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            PowerLabel::Low => "low (< 50%)",
            PowerLabel::Moderate => "moderate (50% - 80%)",
            PowerLabel::Sufficient => "sufficient (>= 80%)",
        }
    }
}

/// Result of a power calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerReport {
    pub kind: PowerKind,
    pub tail: Tail,
    pub alpha: f64,
    pub target: Target,
    pub method: Method,
    pub power: f64,
    pub beta: f64,
    pub label: PowerLabel,
    /// Target power when solving for `n` or `mu1`.
    pub requested_power: Option<f64>,
    pub n: Option<f64>,
    pub mu1: Option<f64>,
    pub effect: f64,
    pub standard_error: f64,
    pub critical: f64,
    /// Effect in standard errors, also the noncentrality.
    pub standardized: f64,
    pub df: Option<f64>,
    pub pooled_sd: Option<f64>,
    pub derivation: Derivation,
}

/// Parsed arguments of the power calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerInput {
    pub mu0: Option<f64>,
    pub mu1: Option<f64>,
    pub mu2: Option<f64>,
    pub n: Option<f64>,
    pub n1: Option<f64>,
    pub n2: Option<f64>,
    pub alpha: Option<f64>,
    pub tail: Option<Tail>,
    pub sigma: Option<f64>,
    pub s: Option<f64>,
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub variance: Option<f64>,
    pub power: Option<f64>,
}

impl PowerInput {
    pub fn from_assignments(args: &mut Assignments) -> Result<Self> {
        // s1 / s2 before the variance aliases, which include `s2`.
        let s1 = args.number(&["s1"])?.value();
        let s2 = args.number(&["s2"])?.value();
        Ok(Self {
            s1,
            s2,
            mu0: args.number(MU0)?.value(),
            mu1: args.number(MU1)?.value(),
            mu2: args.number(MU2)?.value(),
            n: args.number(&["n"])?.value(),
            n1: args.number(&["n1"])?.value(),
            n2: args.number(&["n2"])?.value(),
            alpha: input::alpha(args)?,
            tail: input::tail(args)?,
            sigma: args.number(input::SIGMA)?.value(),
            s: args.number(input::SAMPLE_SD)?.value(),
            variance: args.number(input::VARIANCE)?.value(),
            power: args.number(POWER)?.value().map(input::percent),
        })
    }

    /// Any of the two-sample keys selects the two-sample test.
    fn is_two_sample(&self) -> bool {
        [self.n1, self.n2, self.s1, self.s2, self.mu2]
            .iter()
            .any(Option::is_some)
    }
}

/// Dispatch on the given arguments: two-sample when any of `n1 n2 s1 s2
/// mu2` is given (all of them are then required), otherwise Z with `sigma` and t with `s` / `shoch2`. With a target
/// `power`, the Z-test solves for whichever of `n` and `mu1` is missing.
pub fn compute(input: PowerInput, defaults: &Defaults) -> Result<PowerReport> {
    let alpha = input.alpha.unwrap_or(defaults.alpha);
    let tail = input.tail.unwrap_or(defaults.tail);

    if input.is_two_sample() {
        let mu1 = input::require(input.mu1, "mu1 must be given for the two-sample test")?;
        let mu2 = input::require(input.mu2, "mu2 must be given for the two-sample test")?;
        let s1 = input::require(input.s1, "s1 must be given for the two-sample test")?;
        let s2 = input::require(input.s2, "s2 must be given for the two-sample test")?;
        let n1 = input::require(input.n1, "n1 must be given for the two-sample test")?;
        let n2 = input::require(input.n2, "n2 must be given for the two-sample test")?;
        return two_sample_t(mu1, mu2, s1, s2, n1, n2, alpha, tail);
    }

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

    let mu0 = input::require(input.mu0, "mu0 must be given")?;
    let mut report = match (input.sigma, s) {
        (Some(sigma), _) => match (input.power, input.n, input.mu1) {
            (None, Some(n), Some(mu1)) => one_sample_z(mu0, mu1, sigma, n, alpha, tail)?,
            (Some(power), None, Some(mu1)) => sample_size_z(mu0, mu1, sigma, alpha, power, tail)?,
            (Some(power), Some(n), None) => alternative_mean_z(mu0, sigma, n, alpha, power, tail)?,
            (None, _, _) => {
                return Err(InferError::MissingInput(
                    "mu1 and n are needed to compute the power".into(),
                ));
            }
            (Some(_), Some(_), Some(_)) => {
                return Err(InferError::InvalidInput(
                    "power, n and mu1 are all given; leave one of them unknown".into(),
                ));
            }
            (Some(_), None, None) => {
                return Err(InferError::MissingInput(
                    "one of n and mu1 must be given with a target power".into(),
                ));
            }
        },
        (None, Some(s)) => {
            if input.power.is_some() {
                return Err(InferError::Unsupported(
                    "solving for n or mu1 from a target power is available for the Z-test only".into(),
                ));
            }
            let mu1 = input::require(input.mu1, "mu1 must be given")?;
            let n = input::require(input.n, "n must be given")?;
            one_sample_t(mu0, mu1, s, n, alpha, tail)?
        }
        (None, None) => {
            return Err(InferError::MissingInput(
                "sigma (Z-test), s / shoch2 (t-test) or n1 n2 s1 s2 (two-sample) must be given".into(),
            ));
        }
    };

    prelude.extend(report.derivation);
    report.derivation = prelude;
    Ok(report)
}

/// Power of the one-sample Z-test against the alternative mean `mu1`.
pub fn one_sample_z(
    mu0: f64,
    mu1: f64,
    sigma: f64,
    n: f64,
    alpha: f64,
    tail: Tail,
) -> Result<PowerReport> {
    check_common(alpha, n, 0.0, "sigma", sigma)?;
    let se = sigma / n.sqrt();
    let effect = mu1 - mu0;
    let delta = effect / se;
    let critical = tail.critical_value(&Reference::Normal, alpha)?;
    let power = rejection_probability(tail, critical, |x| normal_cdf(x - delta))?;

    let mut derivation = Derivation::new();
    derivation.push(Step::new(
        "effect",
        "mu1 - mu0",
        format!("{} - {}", format_value(mu1), format_value(mu0)),
        effect,
    ));
    derivation.push(Step::new(
        "SE",
        "sigma / sqrt(n)",
        format!("{} / sqrt({})", format_value(sigma), format_value(n)),
        se,
    ));
    note_core(&mut derivation, "z", tail, critical, effect, se, delta, power);

    Ok(finish(PowerReport {
        kind: PowerKind::Z,
        tail,
        alpha,
        target: Target::Power,
        method: Method::Normal,
        power,
        beta: 1.0 - power,
        label: PowerLabel::from_power(power),
        requested_power: None,
        n: Some(n),
        mu1: Some(mu1),
        effect,
        standard_error: se,
        critical,
        standardized: delta,
        df: None,
        pooled_sd: None,
        derivation,
    }))
}

/// Power of the one-sample t-test; `df = n - 1`.
pub fn one_sample_t(
    mu0: f64,
    mu1: f64,
    s: f64,
    n: f64,
    alpha: f64,
    tail: Tail,
) -> Result<PowerReport> {
    check_common(alpha, n, 1.0, "s", s)?;
    let df = n - 1.0;
    let se = s / n.sqrt();
    let effect = mu1 - mu0;
    let delta = effect / se;
    let critical = tail.critical_value(&Reference::student_t(df)?, alpha)?;
    let method = if n >= EXACT_T_BELOW { Method::Normal } else { Method::NoncentralT };
    let power = t_power(tail, critical, df, delta, method)?;

    let mut derivation = Derivation::new();
    derivation.note("df", format!("n - 1 = {} - 1", format_value(n)), df);
    derivation.push(Step::new(
        "effect",
        "mu1 - mu0",
        format!("{} - {}", format_value(mu1), format_value(mu0)),
        effect,
    ));
    derivation.push(Step::new(
        "SE",
        "s / sqrt(n)",
        format!("{} / sqrt({})", format_value(s), format_value(n)),
        se,
    ));
    note_core(&mut derivation, "t", tail, critical, effect, se, delta, power);

    Ok(finish(PowerReport {
        kind: PowerKind::T,
        tail,
        alpha,
        target: Target::Power,
        method,
        power,
        beta: 1.0 - power,
        label: PowerLabel::from_power(power),
        requested_power: None,
        n: Some(n),
        mu1: Some(mu1),
        effect,
        standard_error: se,
        critical,
        standardized: delta,
        df: Some(df),
        pooled_sd: None,
        derivation,
    }))
}

/// Power of the pooled two-sample t-test for the mean difference
/// `mu1 - mu2`; `df = n1 + n2 - 2`.
#[allow(clippy::too_many_arguments)]
pub fn two_sample_t(
    mu1: f64,
    mu2: f64,
    s1: f64,
    s2: f64,
    n1: f64,
    n2: f64,
    alpha: f64,
    tail: Tail,
) -> Result<PowerReport> {
    check_common(alpha, n1, 1.0, "s1", s1)?;
    check_common(alpha, n2, 1.0, "s2", s2)?;
    let df = n1 + n2 - 2.0;
    let pooled_var = ((n1 - 1.0) * s1 * s1 + (n2 - 1.0) * s2 * s2) / df;
    let pooled_sd = pooled_var.sqrt();
    let se = pooled_sd * (1.0 / n1 + 1.0 / n2).sqrt();
    let effect = mu1 - mu2;
    let delta = effect / se;
    let critical = tail.critical_value(&Reference::student_t(df)?, alpha)?;
    let method = if n1 + n2 >= EXACT_TWO_SAMPLE_BELOW {
        Method::Normal
    } else {
        Method::NoncentralT
    };
    let power = t_power(tail, critical, df, delta, method)?;

    let mut derivation = Derivation::new();
    derivation.note(
        "df",
        format!("n1 + n2 - 2 = {} + {} - 2", format_value(n1), format_value(n2)),
        df,
    );
    derivation.push(Step::new(
        "s_pooled^2",
        "((n1-1)*s1^2 + (n2-1)*s2^2) / (n1+n2-2)",
        format!(
            "(({}-1)*{}^2 + ({}-1)*{}^2) / {}",
            format_value(n1),
            format_value(s1),
            format_value(n2),
            format_value(s2),
            format_value(df)
        ),
        pooled_var,
    ));
    derivation.push(Step::new("s_pooled", "sqrt(s_pooled^2)", "", pooled_sd));
    derivation.push(Step::new(
        "SE",
        "s_pooled * sqrt(1/n1 + 1/n2)",
        format!(
            "{} * sqrt(1/{} + 1/{})",
            format_value(pooled_sd),
            format_value(n1),
            format_value(n2)
        ),
        se,
    ));
    derivation.push(Step::new(
        "effect",
        "mu1 - mu2",
        format!("{} - {}", format_value(mu1), format_value(mu2)),
        effect,
    ));
    note_core(&mut derivation, "t", tail, critical, effect, se, delta, power);

    Ok(finish(PowerReport {
        kind: PowerKind::TwoSampleT,
        tail,
        alpha,
        target: Target::Power,
        method,
        power,
        beta: 1.0 - power,
        label: PowerLabel::from_power(power),
        requested_power: None,
        n: None,
        mu1: Some(mu1),
        effect,
        standard_error: se,
        critical,
        standardized: delta,
        df: Some(df),
        pooled_sd: Some(pooled_sd),
        derivation,
    }))
}

/// Smallest `n` reaching `power` in the Z-test:
/// `n = ceil(((z_crit + z_power) * sigma / effect)^2)`, with
/// `z_crit - z_power` for the left tail. The report carries the power
/// actually achieved at that `n`.
pub fn sample_size_z(
    mu0: f64,
    mu1: f64,
    sigma: f64,
    alpha: f64,
    power: f64,
    tail: Tail,
) -> Result<PowerReport> {
    check_target(power)?;
    check_common(alpha, 1.0, 0.0, "sigma", sigma)?;
    let effect = mu1 - mu0;
    if effect == 0.0 {
        return Err(InferError::InvalidInput(
            "mu1 equals mu0: no sample size detects a zero effect".into(),
        ));
    }
    let (critical, z_power, shift) = target_shift(tail, alpha, power)?;
    let raw = (shift * sigma / effect).powi(2);
    let n = raw.ceil();
    debug!(raw, n, "sample size from power");

    let mut report = one_sample_z(mu0, mu1, sigma, n, alpha, tail)?;
    let mut derivation = Derivation::new();
    derivation.note("z_crit", critical_label(tail, alpha), critical);
    derivation.note("z_power", format!("Phi^-1({})", format_value(power)), z_power);
    derivation.push(Step::new(
        "n",
        format!("ceil((({}) * sigma / (mu1 - mu0))^2)", shift_expression(tail)),
        format!(
            "ceil(({} * {} / {})^2) = ceil({})",
            format_value(shift),
            format_value(sigma),
            format_value(effect),
            format_value(raw)
        ),
        n,
    ));
    derivation.extend(report.derivation);
    report.derivation = derivation;
    report.target = Target::SampleSize;
    report.requested_power = Some(power);
    Ok(report)
}

/// Alternative mean at which the Z-test reaches `power`:
/// `mu1 = mu0 + (z_crit + z_power) * SE`, with `z_crit - z_power` for the
/// left tail.
pub fn alternative_mean_z(
    mu0: f64,
    sigma: f64,
    n: f64,
    alpha: f64,
    power: f64,
    tail: Tail,
) -> Result<PowerReport> {
    check_target(power)?;
    check_common(alpha, n, 0.0, "sigma", sigma)?;
    let se = sigma / n.sqrt();
    let (critical, z_power, shift) = target_shift(tail, alpha, power)?;
    let mu1 = mu0 + shift * se;

    let mut report = one_sample_z(mu0, mu1, sigma, n, alpha, tail)?;
    let mut derivation = Derivation::new();
    derivation.note("z_crit", critical_label(tail, alpha), critical);
    derivation.note("z_power", format!("Phi^-1({})", format_value(power)), z_power);
    derivation.push(Step::new(
        "mu1",
        format!("mu0 + ({}) * sigma / sqrt(n)", shift_expression(tail)),
        format!(
            "{} + {} * {} / sqrt({})",
            format_value(mu0),
            format_value(shift),
            format_value(sigma),
            format_value(n)
        ),
        mu1,
    ));
    derivation.extend(report.derivation);
    report.derivation = derivation;
    report.target = Target::AlternativeMean;
    report.requested_power = Some(power);
    Ok(report)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Probability of landing in the rejection region when the statistic has
/// CDF `cdf` under the alternative.
fn rejection_probability(
    tail: Tail,
    critical: f64,
    cdf: impl Fn(f64) -> statcalc_dist::Result<f64>,
) -> Result<f64> {
    let power = match tail {
        Tail::TwoSided => 1.0 - cdf(critical)? + cdf(-critical)?,
        Tail::Left => cdf(critical)?,
        Tail::Right => 1.0 - cdf(critical)?,
    };
    Ok(power.clamp(0.0, 1.0))
}

fn t_power(tail: Tail, critical: f64, df: f64, delta: f64, method: Method) -> Result<f64> {
    match method {
        Method::Normal => rejection_probability(tail, critical, |x| normal_cdf(x - delta)),
        Method::NoncentralT => {
            rejection_probability(tail, critical, |x| noncentral_t_cdf(x, df, delta))
        }
    }
}

/// `(z_crit, z_power, z_crit +/- z_power)` for the target-power formulas.
fn target_shift(tail: Tail, alpha: f64, power: f64) -> Result<(f64, f64, f64)> {
    let critical = tail.critical_value(&Reference::Normal, alpha)?;
    let z_power = normal_ppf(power)?;
    let shift = match tail {
        Tail::Left => critical - z_power,
        Tail::TwoSided | Tail::Right => critical + z_power,
    };
    Ok((critical, z_power, shift))
}

fn shift_expression(tail: Tail) -> &'static str {
    match tail {
        Tail::Left => "z_crit - z_power",
        Tail::TwoSided | Tail::Right => "z_crit + z_power",
    }
}

fn critical_label(tail: Tail, alpha: f64) -> String {
    match tail {
        Tail::TwoSided => format!("Phi^-1(1 - {}/2)", format_value(alpha)),
        Tail::Left => format!("Phi^-1({})", format_value(alpha)),
        Tail::Right => format!("Phi^-1(1 - {})", format_value(alpha)),
    }
}

#[allow(clippy::too_many_arguments)]
fn note_core(
    derivation: &mut Derivation,
    symbol: &str,
    tail: Tail,
    critical: f64,
    effect: f64,
    se: f64,
    delta: f64,
    power: f64,
) {
    derivation.note(&format!("{symbol}_crit"), format!("{} critical value", tail.label()), critical);
    derivation.push(Step::new(
        "delta",
        "effect / SE",
        format!("{} / {}", format_value(effect), format_value(se)),
        delta,
    ));
    derivation.note("power", "1 - beta", power);
    derivation.note("beta", "1 - power", 1.0 - power);
}

fn finish(report: PowerReport) -> PowerReport {
    debug!(
        kind = ?report.kind,
        method = ?report.method,
        power = report.power,
        "power computed"
    );
    report
}

fn check_common(alpha: f64, n: f64, n_above: f64, sd_name: &str, sd: f64) -> Result<()> {
    check_alpha(alpha)?;
    if !(n > n_above && n.is_finite()) {
        return Err(InferError::InvalidInput(format!(
            "sample size must be > {}, got {}",
            format_value(n_above),
            format_value(n)
        )));
    }
    if !(sd > 0.0 && sd.is_finite()) {
        return Err(InferError::InvalidInput(format!(
            "standard deviation {sd_name} must be > 0, got {}",
            format_value(sd)
        )));
    }
    Ok(())
}

fn check_target(power: f64) -> Result<()> {
    if power > 0.0 && power < 1.0 {
        Ok(())
    } else {
        Err(InferError::InvalidInput(format!(
            "target power must lie strictly between 0 and 1, got {}",
            format_value(power)
        )))
    }
}
