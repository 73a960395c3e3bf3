//! Terminal styling for statcalc output.
//!
//! Ayu-themed colors for results, verdicts and derivations, plus terminal
//! detection that honors `NO_COLOR`/`CLICOLOR` and a configured override.

pub mod styles;
pub mod terminal;
