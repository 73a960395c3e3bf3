//! Output helpers for the `statcalc` CLI: JSON, titled sections, derivation
//! steps, result lines and verification reports.

use std::io::{self, Write};

use serde::Serialize;
use statcalc_formula::{Derivation, Verification};
use statcalc_infer::FormulaReport;
use statcalc_ui::styles::{
    render_category, render_check, render_muted, render_result, render_separator, render_step,
    render_title,
};

use crate::context::RuntimeContext;

/// Print a value as pretty JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Calculator title, suppressed in quiet mode.
pub fn print_title(ctx: &RuntimeContext, title: &str) {
    if !ctx.quiet {
        println!("{}", render_title(title));
    }
}

/// Section header, suppressed in quiet mode.
pub fn print_section(ctx: &RuntimeContext, name: &str) {
    if !ctx.quiet {
        println!();
        println!("{}", render_category(name));
    }
}

/// Informational line, suppressed in quiet mode.
pub fn print_note(ctx: &RuntimeContext, text: &str) {
    if !ctx.quiet {
        println!("  {}", render_muted(text));
    }
}

/// Worked derivation, one step per line.
pub fn print_derivation(ctx: &RuntimeContext, derivation: &Derivation) {
    if ctx.quiet || derivation.is_empty() {
        return;
    }
    print_section(ctx, "Derivation");
    for step in derivation.steps() {
        println!(
            "{}",
            render_step(&step.variable, &step.expression, &step.substituted, &ctx.fmt(step.value))
        );
    }
}

/// `name = value` at the configured precision. Always printed.
pub fn print_value(ctx: &RuntimeContext, name: &str, value: f64) {
    println!("{}", render_result(name, &ctx.fmt(value)));
}

/// `name = text`. Always printed.
pub fn print_text(name: &str, text: &str) {
    println!("{}", render_result(name, text));
}

/// Probability with its percentage.
pub fn print_probability(ctx: &RuntimeContext, name: &str, value: f64) {
    let text = format!("{} ({})", ctx.fmt(value), ctx.percent(value));
    println!("{}", render_result(name, &text));
}

/// Cross-check results of fully bound formulas.
pub fn print_verifications(ctx: &RuntimeContext, verifications: &[Verification]) {
    if verifications.is_empty() {
        return;
    }
    print_section(ctx, "Verification");
    for verification in verifications {
        println!(
            "  {} {}",
            verification.formula,
            render_check(verification.is_consistent())
        );
        if ctx.quiet {
            continue;
        }
        for check in &verification.checks {
            let computed = check
                .computed
                .map(|c| ctx.fmt(c))
                .unwrap_or_else(|| "undefined".to_string());
            println!(
                "    {}: given {}, computed {} {}",
                check.variable,
                ctx.fmt(check.given),
                computed,
                render_check(check.consistent)
            );
        }
    }
}

/// Derivation, the listed result values, verifications and any formula
/// left unsolved.
pub fn print_formula_report(ctx: &RuntimeContext, report: &FormulaReport, results: &[&str]) {
    print_derivation(ctx, &report.resolution.derivation);
    print_section(ctx, "Result");
    for name in results {
        if let Some(value) = report.value(name) {
            print_value(ctx, name, value);
        }
    }
    print_verifications(ctx, &report.resolution.verifications);
    for open in &report.resolution.unresolved {
        print_note(
            ctx,
            &format!("{}: not solvable, missing {}", open.formula, open.missing.join(", ")),
        );
    }
}

/// Light rule between blocks, suppressed in quiet mode.
pub fn print_separator(ctx: &RuntimeContext) {
    if !ctx.quiet {
        println!("{}", render_separator());
    }
}
