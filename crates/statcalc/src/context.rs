//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what every command handler needs: global
//! flags, the loaded configuration and the formula registry.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use statcalc_config::{StatcalcConfig, config_path, load_config};
use statcalc_formula::FormulaRegistry;
use statcalc_formula::types::format_fixed;
use statcalc_infer::Defaults;
use tracing::debug;

use crate::cli::GlobalArgs;

const MAX_PRECISION: usize = 15;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Result lines only.
    pub quiet: bool,

    /// Decimals for displayed results.
    pub precision: usize,

    /// Effective configuration after all layers.
    pub config: StatcalcConfig,

    /// File the configuration was looked up in.
    pub config_path: PathBuf,

    pub registry: FormulaRegistry,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments, loading the
    /// configuration for the current directory.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let config_path = config_path(&cwd);
        let config = load_config(&config_path)
            .with_context(|| format!("invalid configuration in {}", config_path.display()))?;

        let precision = global.precision.unwrap_or(config.precision);
        if precision > MAX_PRECISION {
            bail!("--precision must be at most {MAX_PRECISION} (got {precision})");
        }

        statcalc_ui::terminal::set_color_override(config.color.forced());
        debug!(path = %config_path.display(), precision, alpha = config.alpha, "runtime context ready");

        Ok(Self {
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
            precision,
            config,
            config_path,
            registry: FormulaRegistry::builtin(),
        })
    }

    /// Fallbacks for calculators that need alpha or a test side.
    pub fn defaults(&self) -> Defaults {
        Defaults {
            alpha: self.config.alpha,
            tail: self.config.tail,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    /// `value` at the configured precision.
    pub fn fmt(&self, value: f64) -> String {
        format_fixed(value, self.precision)
    }

    /// `value` as a percentage with two decimals.
    pub fn percent(&self, value: f64) -> String {
        format!("{:.2}%", value * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(precision: usize) -> RuntimeContext {
        RuntimeContext {
            json: false,
            verbose: false,
            quiet: false,
            precision,
            config: StatcalcConfig::default(),
            config_path: PathBuf::from("statcalc.yaml"),
            registry: FormulaRegistry::builtin(),
        }
    }

    #[test]
    fn formats_at_precision() {
        assert_eq!(context(3).fmt(1.23456), "1.235");
        assert_eq!(context(0).fmt(2.4), "2");
        assert_eq!(context(6).percent(0.054762), "5.48%");
    }

    #[test]
    fn defaults_follow_config() {
        let d = context(6).defaults();
        assert_eq!(d.alpha, 0.05);
        assert_eq!(d.tail, statcalc_dist::Tail::TwoSided);
    }
}
