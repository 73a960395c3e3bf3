//! Configuration types and loading.
//!
//! The main entry point is [`StatcalcConfig`]. It is loaded with
//! [`load_config`] and written back with [`save_config`].

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use statcalc_dist::{Comparison, Tail};
use thiserror::Error;
use tracing::debug;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "statcalc.yaml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "STATCALC_CONFIG";

/// Prefix of environment variables overriding single keys.
pub const ENV_PREFIX: &str = "STATCALC_";

const MAX_PRECISION: usize = 15;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be written.
    #[error("failed to write config file: {0}")]
    WriteError(#[from] std::io::Error),

    /// A layer could not be read or did not match the expected shape.
    #[error("failed to load configuration: {0}")]
    ParseError(String),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    /// A configuration value was out of range.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color only on a terminal that allows it.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `Some(forced)` for always/never, `None` to detect.
    pub fn forced(self) -> Option<bool> {
        match self {
            ColorChoice::Auto => None,
            ColorChoice::Always => Some(true),
            ColorChoice::Never => Some(false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        }
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatcalcConfig {
    /// Decimals shown for results.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Significance level used when a calculator needs one and none is given.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Absolute tolerance of the verification pass.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Test side used when none is given.
    #[serde(default)]
    pub tail: Tail,

    /// Comparison mode of the distribution calculators.
    #[serde(default)]
    pub mode: Comparison,

    #[serde(default)]
    pub color: ColorChoice,
}

impl Default for StatcalcConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            alpha: default_alpha(),
            tolerance: default_tolerance(),
            tail: Tail::default(),
            mode: Comparison::default(),
            color: ColorChoice::default(),
        }
    }
}

fn default_precision() -> usize {
    6
}

fn default_alpha() -> f64 {
    0.05
}

fn default_tolerance() -> f64 {
    1e-4
}

impl StatcalcConfig {
    /// Reject values no calculator can work with.
    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::InvalidValue {
                key: "precision".to_string(),
                reason: format!("{} exceeds the maximum of {MAX_PRECISION}", self.precision),
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "alpha".to_string(),
                reason: format!("{} must lie strictly between 0 and 1", self.alpha),
            });
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "tolerance".to_string(),
                reason: format!("{} must be positive", self.tolerance),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The configuration file for `dir`: `$STATCALC_CONFIG` if set, otherwise
/// `dir/statcalc.yaml`.
pub fn config_path(dir: &Path) -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dir.join(CONFIG_FILE),
    }
}

/// Load defaults, then the YAML file at `path` if it exists, then
/// `STATCALC_*` environment variables, and validate the result.
pub fn load_config(path: &Path) -> Result<StatcalcConfig> {
    debug!(path = %path.display(), exists = path.exists(), "loading configuration");
    let config: StatcalcConfig = Figment::new()
        .merge(Serialized::defaults(StatcalcConfig::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Defaults overlaid with a YAML document; no environment layer.
pub fn load_from_str(yaml: &str) -> Result<StatcalcConfig> {
    let config: StatcalcConfig = Figment::new()
        .merge(Serialized::defaults(StatcalcConfig::default()))
        .merge(Yaml::string(yaml))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Write `config` as YAML, creating parent directories.
pub fn save_config(path: &Path, config: &StatcalcConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    debug!(path = %path.display(), "saved configuration");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let cfg = StatcalcConfig::default();
        assert_eq!(cfg.precision, 6);
        assert_eq!(cfg.alpha, 0.05);
        assert_eq!(cfg.tolerance, 1e-4);
        assert_eq!(cfg.tail, Tail::TwoSided);
        assert_eq!(cfg.mode, Comparison::Exactly);
        assert_eq!(cfg.color, ColorChoice::Auto);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg.precision, StatcalcConfig::default().precision);
        assert_eq!(cfg.alpha, StatcalcConfig::default().alpha);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = load_from_str("precision: 3\ntail: einseitig_links\n").unwrap();
        assert_eq!(cfg.precision, 3);
        assert_eq!(cfg.tail, Tail::Left);
        assert_eq!(cfg.alpha, 0.05);
        assert_eq!(cfg.mode, Comparison::Exactly);
    }

    #[test]
    fn test_mode_aliases() {
        let cfg = load_from_str("mode: mindestens\ncolor: never\n").unwrap();
        assert_eq!(cfg.mode, Comparison::AtLeast);
        assert_eq!(cfg.color.forced(), Some(false));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_from_str("alpha: 1.5\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "alpha"
        ));
        assert!(matches!(
            load_from_str("precision: 20\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "precision"
        ));
        assert!(matches!(
            load_from_str("tolerance: 0\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "tolerance"
        ));
        assert!(matches!(
            load_from_str("tail: sideways\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let cfg = StatcalcConfig {
            precision: 4,
            alpha: 0.01,
            tail: Tail::Right,
            color: ColorChoice::Always,
            ..StatcalcConfig::default()
        };
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_save_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StatcalcConfig {
            alpha: 0.0,
            ..StatcalcConfig::default()
        };
        assert!(save_config(&dir.path().join(CONFIG_FILE), &cfg).is_err());
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }
}
