//! Clap CLI definitions for the `statcalc` command.
//!
//! Every calculator takes free-form `key=value` bindings; the calculator
//! itself decides which keys it recognizes.

use clap::{Args, Parser, Subcommand};

/// statcalc -- calculators for introductory inferential statistics.
///
/// Give the known values as key=value pairs and mark the value to solve for
/// with `-`. Fractions such as `p=1/6` are accepted.
#[derive(Parser, Debug)]
#[command(
    name = "statcalc",
    about = "Calculators for introductory inferential statistics",
    long_about = "Give the known values as key=value pairs and mark the unknown with '-'. \
                  Each calculator fills in the missing value and prints a worked derivation.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug tracing on stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Print result lines only, without derivations.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Decimals shown for results (default: from configuration).
    #[arg(long, global = true, value_name = "DIGITS")]
    pub precision: Option<usize>,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // ===== Distributions =====
    /// Binomial probability: n p k [art=mode].
    Binomial(CalcArgs),

    /// Hypergeometric probability: N M n k [art=mode] (N and n are case-sensitive).
    #[command(alias = "hypergeometrisch")]
    Hypergeometric(CalcArgs),

    /// Poisson probability: lambda k [art=mode].
    Poisson(CalcArgs),

    // ===== Scores and effect sizes =====
    /// Z-score: z x mu sigma|var p, one of them '-'.
    #[command(name = "z-score", alias = "zscore")]
    ZScore(CalcArgs),

    /// Cohen's d: d x_bar mu0 sigma, one of them '-'.
    #[command(name = "cohens-d", alias = "cohen")]
    CohensD(CalcArgs),

    /// k-sigma interval: mu sigma and k (or z) or conf.
    #[command(name = "k-sigma", alias = "ksigma")]
    KSigma(CalcArgs),

    // ===== Inference =====
    /// One-sample Z- or t-test: x_bar mu0 sigma|s|shoch2 n [alpha] [test=side].
    #[command(alias = "hypothesentest")]
    Hypothesis(CalcArgs),

    /// Confidence interval for a mean or a variance.
    #[command(alias = "konfidenzintervall")]
    Interval(CalcArgs),

    /// Power, required sample size or detectable mean.
    #[command(alias = "trennschaerfe")]
    Power(CalcArgs),

    // ===== Descriptive =====
    /// Pearson and Spearman correlation (x=.. y=..) or contingency coefficient.
    #[command(alias = "korrelation")]
    Correlation(CalcArgs),

    /// Descriptive statistics of a data list.
    #[command(alias = "standardabweichung")]
    Describe(CalcArgs),

    // ===== Registry & setup =====
    /// Inspect and solve the built-in formulas.
    Formula(FormulaArgs),

    /// Show or create the configuration file.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

impl Commands {
    /// Subcommand name as registered with clap.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Binomial(_) => "binomial",
            Commands::Hypergeometric(_) => "hypergeometric",
            Commands::Poisson(_) => "poisson",
            Commands::ZScore(_) => "z-score",
            Commands::CohensD(_) => "cohens-d",
            Commands::KSigma(_) => "k-sigma",
            Commands::Hypothesis(_) => "hypothesis",
            Commands::Interval(_) => "interval",
            Commands::Power(_) => "power",
            Commands::Correlation(_) => "correlation",
            Commands::Describe(_) => "describe",
            Commands::Formula(_) => "formula",
            Commands::Config(_) => "config",
            Commands::Completion(_) => "completion",
            Commands::Version => "version",
        }
    }
}

/// Arguments shared by every calculator.
#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    /// Values as key=value; '-', '?', 'None' or an empty value mark the unknown.
    #[arg(value_name = "KEY=VALUE")]
    pub bindings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// Arguments for `statcalc formula`.
#[derive(Args, Debug)]
pub struct FormulaArgs {
    #[command(subcommand)]
    pub command: FormulaCommands,
}

/// Formula subcommands.
#[derive(Subcommand, Debug)]
pub enum FormulaCommands {
    /// List the built-in formulas.
    List,

    /// Show a formula's variables, aliases and inversions.
    Show(FormulaShowArgs),

    /// Resolve one or more formulas sharing the given values.
    Solve(FormulaSolveArgs),
}

/// Arguments for `statcalc formula show`.
#[derive(Args, Debug)]
pub struct FormulaShowArgs {
    /// Formula id, e.g. z-score.
    pub id: String,
}

/// Arguments for `statcalc formula solve`.
#[derive(Args, Debug)]
pub struct FormulaSolveArgs {
    /// Comma-separated formula ids, e.g. normal-cdf,z-score.
    pub ids: String,

    /// Values as key=value.
    #[arg(value_name = "KEY=VALUE")]
    pub bindings: Vec<String>,
}

impl FormulaSolveArgs {
    pub fn id_list(&self) -> Vec<&str> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `statcalc config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration and where it was loaded from.
    Show,

    /// Write a configuration file with the default values.
    Init(ConfigInitArgs),
}

/// Arguments for `statcalc config init`.
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `statcalc completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
