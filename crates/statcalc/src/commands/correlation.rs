//! `statcalc correlation` -- Pearson and Spearman for paired lists, or the
//! contingency coefficient for a frequency table.

use anyhow::{Result, bail};
use statcalc_describe::{Coefficient, ContingencyReport, CorrelationReport, contingency, correlate};
use statcalc_ui::styles::{render_pass, render_warn};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{
    output_json, print_note, print_probability, print_section, print_text, print_title, print_value,
};

const X: &[&str] = &["x", "daten_x", "liste_x"];
const Y: &[&str] = &["y", "daten_y", "liste_y"];
const TABLE: &[&str] = &["kontingenz", "contingency", "table", "tabelle"];

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let table = args.table(TABLE)?;
    let x = args.list(X)?;
    let y = args.list(Y)?;
    args.finish()?;

    match (table, x, y) {
        (Some(table), None, None) => {
            let report = contingency(&table)?;
            if ctx.json {
                output_json(&report);
            } else {
                print_contingency(ctx, &report);
            }
        }
        (None, Some(x), Some(y)) => {
            let report = correlate(&x, &y)?;
            if ctx.json {
                output_json(&report);
            } else {
                print_correlation(ctx, &report);
            }
        }
        (Some(_), _, _) => bail!("give either a contingency table or x and y lists, not both"),
        _ => bail!("x=[..] and y=[..] or kontingenz=[[..],[..]] must be given"),
    }
    Ok(())
}

fn print_correlation(ctx: &RuntimeContext, report: &CorrelationReport) {
    print_title(ctx, "Correlation");
    print_note(ctx, &format!("n = {} pairs", report.n));

    print_section(ctx, "Pearson");
    print_value(ctx, "x mean", report.x_mean);
    print_value(ctx, "y mean", report.y_mean);
    print_value(ctx, "Sxy", report.sxy);
    print_value(ctx, "Sxx", report.sxx);
    print_value(ctx, "Syy", report.syy);
    print_coefficient(ctx, "r", &report.pearson);

    print_section(ctx, "Spearman");
    print_note(ctx, &format!("x ranks = {}", ranks(ctx, &report.x_ranks)));
    print_note(ctx, &format!("y ranks = {}", ranks(ctx, &report.y_ranks)));
    print_value(ctx, "sum d^2", report.d_squared);
    print_coefficient(ctx, "rho", &report.spearman);
}

fn print_coefficient(ctx: &RuntimeContext, name: &str, coefficient: &Coefficient) {
    print_value(ctx, name, coefficient.value);
    if let Some(t) = coefficient.t {
        print_value(ctx, &format!("t (df = {})", coefficient.df), t);
    }
    print_probability(ctx, "p (two-sided)", coefficient.p_value);
    print_text("interpretation", &coefficient.describe());
    let alpha = ctx.config.alpha;
    let verdict = if coefficient.is_significant(alpha) {
        render_warn(&format!("significant at alpha = {}", ctx.fmt(alpha)))
    } else {
        render_pass(&format!("not significant at alpha = {}", ctx.fmt(alpha)))
    };
    println!("  {verdict}");
}

fn print_contingency(ctx: &RuntimeContext, report: &ContingencyReport) {
    print_title(ctx, "Contingency coefficient");
    print_note(
        ctx,
        &format!("{} x {} table, n = {}", report.rows, report.cols, ctx.fmt(report.n)),
    );
    if report.yates {
        print_note(ctx, "Yates continuity correction applied");
    }

    print_section(ctx, "Expected counts");
    for row in &report.expected {
        print_note(ctx, &ranks(ctx, row));
    }

    print_section(ctx, "Result");
    print_value(ctx, "chi2", report.chi2);
    print_value(ctx, "df", report.df as f64);
    print_probability(ctx, "p", report.p_value);
    print_value(ctx, "C", report.c);
    print_value(ctx, "C_max", report.c_max);
    print_value(ctx, "C_corr", report.c_corr);
    print_text("association", report.strength.label());
}

fn ranks(ctx: &RuntimeContext, values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| ctx.fmt(*v)).collect();
    format!("[{}]", items.join(", "))
}
