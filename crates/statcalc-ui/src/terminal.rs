//! Terminal detection: TTY status, width and whether to emit color.

use std::env;
use std::sync::atomic::{AtomicU8, Ordering};

const AUTO: u8 = 0;
const ALWAYS: u8 = 1;
const NEVER: u8 = 2;

static COLOR_OVERRIDE: AtomicU8 = AtomicU8::new(AUTO);

/// Returns `true` if stdout is connected to a terminal (TTY).
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// Returns the terminal width in columns, defaulting to 80 if detection fails.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _rows)| cols as usize)
        .unwrap_or(80)
}

/// Force color on (`Some(true)`), off (`Some(false)`), or back to detection.
pub fn set_color_override(forced: Option<bool>) {
    let value = match forced {
        None => AUTO,
        Some(true) => ALWAYS,
        Some(false) => NEVER,
    };
    COLOR_OVERRIDE.store(value, Ordering::Relaxed);
}

/// Determines if ANSI color codes should be used.
///
/// An override from [`set_color_override`] wins. Otherwise:
/// - `NO_COLOR` (any value) disables color
/// - `CLICOLOR=0` disables color
/// - `TERM=dumb` disables color
/// - `CLICOLOR_FORCE` (any value) forces color even in non-TTY
/// - falls back to TTY detection
pub fn supports_color() -> bool {
    match COLOR_OVERRIDE.load(Ordering::Relaxed) {
        ALWAYS => return true,
        NEVER => return false,
        _ => {}
    }

    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").as_deref() == Ok("0") {
        return false;
    }
    if env::var("TERM").as_deref() == Ok("dumb") {
        return false;
    }
    if env::var_os("CLICOLOR_FORCE").is_some() {
        return true;
    }
    is_tty()
}
