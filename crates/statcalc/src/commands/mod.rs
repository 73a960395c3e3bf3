//! Command handlers, one module per subcommand group.

pub mod completion;
pub mod config_cmd;
pub mod correlation;
pub mod describe;
pub mod distribution;
pub mod effect;
pub mod formula;
pub mod hypothesis;
pub mod interval;
pub mod power;
pub mod score;
pub mod version;

use anyhow::Result;
use statcalc_formula::Assignments;

use crate::cli::CalcArgs;

/// Parse the `key=value` bindings of a calculator.
pub(crate) fn assignments(args: &CalcArgs) -> Result<Assignments> {
    Ok(Assignments::parse(&args.bindings)?)
}
