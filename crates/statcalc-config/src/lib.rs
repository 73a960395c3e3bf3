//! Configuration management for statcalc.
//!
//! Settings are layered with figment: built-in defaults, then
//! `statcalc.yaml` (or the file named by `STATCALC_CONFIG`), then
//! `STATCALC_*` environment variables.

pub mod config;

pub use config::{
    CONFIG_ENV, CONFIG_FILE, ColorChoice, ConfigError, ENV_PREFIX, Result, StatcalcConfig,
    config_path, load_config, load_from_str, save_config,
};
