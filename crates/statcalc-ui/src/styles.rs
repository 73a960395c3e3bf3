//! Ayu color theme and styling functions for statcalc output.
//!
//! Uses the Ayu Dark color palette.
//! Color source: <https://github.com/ayu-theme/ayu-colors>
//!
//! Only verdicts and mismatches get strong color; derivation steps are
//! muted so the final values stand out.

use owo_colors::OwoColorize;

use crate::terminal::{supports_color, terminal_width};

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const VALUE: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons and rules
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // ✓
pub const ICON_WARN: &str = "\u{26A0}"; // ⚠
pub const ICON_FAIL: &str = "\u{2716}"; // ✖
pub const ICON_STEP: &str = "\u{2192}"; // →

const RULE_LIGHT: char = '\u{2500}'; // ─
const RULE_HEAVY: char = '\u{2550}'; // ═
const RULE_MAX: usize = 60;

/// Horizontal rule as wide as the terminal, at most [`RULE_MAX`] columns.
fn rule(ch: char) -> String {
    let width = terminal_width().clamp(20, RULE_MAX);
    std::iter::repeat_n(ch, width).collect()
}

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Section header in uppercase with accent color and bold.
pub fn render_category(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

pub fn render_separator() -> String {
    render_muted(&rule(RULE_LIGHT))
}

/// Title line framed by heavy separators.
pub fn render_title(s: &str) -> String {
    let heavy = render_muted(&rule(RULE_HEAVY));
    format!("{heavy}\n{}\n{heavy}", render_bold(s))
}

// ---------------------------------------------------------------------------
// Icon renderers
// ---------------------------------------------------------------------------

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_warn_icon() -> String {
    color_str(ICON_WARN, WARN)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

// ---------------------------------------------------------------------------
// Result rendering
// ---------------------------------------------------------------------------

/// `name = value` with the value highlighted.
pub fn render_result(name: &str, value: &str) -> String {
    format!("{} = {}", render_accent(name), color_bold_str(value, VALUE))
}

/// One derivation step: `name = expression = substituted → value`.
/// Identical expression and substitution collapse to one.
pub fn render_step(name: &str, expression: &str, substituted: &str, value: &str) -> String {
    let body = if expression == substituted {
        expression.to_string()
    } else {
        format!("{expression} = {substituted}")
    };
    format!(
        "  {} = {} {} {}",
        name,
        render_muted(&body),
        render_muted(ICON_STEP),
        color_str(value, VALUE)
    )
}

/// Test decision line.
pub fn render_verdict(reject: bool) -> String {
    if reject {
        format!("{} {}", render_warn_icon(), color_bold_str("reject H0", WARN))
    } else {
        format!("{} {}", render_pass_icon(), color_bold_str("fail to reject H0", PASS))
    }
}

/// Consistency marker of a verification check.
pub fn render_check(consistent: bool) -> String {
    if consistent {
        format!("{} {}", render_pass_icon(), render_pass("consistent"))
    } else {
        format!("{} {}", render_fail_icon(), render_fail("mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_contains_decision() {
        assert!(render_verdict(true).contains("reject H0"));
        assert!(render_verdict(false).contains("fail to reject H0"));
    }

    #[test]
    fn check_marks_mismatch() {
        assert!(render_check(false).contains("mismatch"));
        assert!(render_check(true).contains("consistent"));
    }

    #[test]
    fn step_collapses_identical_substitution() {
        let collapsed = render_step("k", "1.96", "1.96", "1.96");
        assert_eq!(collapsed.matches("1.96").count(), 2);
        let full = render_step("z", "(x - mu) / sigma", "(130 - 100) / 15", "2");
        assert!(full.contains("(130 - 100) / 15"));
    }

    #[test]
    fn rules_fit_the_terminal() {
        let width = rule(RULE_LIGHT).chars().count();
        assert!((20..=RULE_MAX).contains(&width));
    }

    #[test]
    fn category_is_uppercase() {
        assert!(render_category("result").contains("RESULT"));
    }
}
