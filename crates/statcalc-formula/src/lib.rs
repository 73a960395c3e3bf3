//! Formula solver for the statcalc calculators.
//!
//! A formula is a set of named variables, each with a closed-form inversion
//! computing it from the others. Given bindings with exactly one unknown the
//! resolver fills it in and records a derivation step; fully bound formulas
//! are cross-checked instead. Several formulas sharing one binding namespace
//! can be resolved together, each solved value unlocking the next.

pub mod engine;
pub mod parser;
pub mod registry;
pub mod types;

pub use engine::{DEFAULT_TOLERANCE, Resolution, resolve, solve};
pub use parser::{Assignments, Entry};
pub use registry::FormulaRegistry;
pub use types::{Bindings, Derivation, Formula, FormulaError, Outcome, Step, Verification};
