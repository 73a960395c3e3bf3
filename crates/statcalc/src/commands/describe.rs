//! `statcalc describe` -- summary statistics of a data list.

use anyhow::{Context, Result};
use statcalc_describe::{VarianceKind, summarize};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_note, print_section, print_title, print_value};

const DATA: &[&str] = &["data", "daten", "x", "werte"];
const POPULATION: &[&str] = &["population", "pop", "grundgesamtheit"];

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let data = args.list(DATA)?.context("data=[..] must be given")?;
    let kind = match args.flag(POPULATION)? {
        Some(true) => VarianceKind::Population,
        _ => VarianceKind::Sample,
    };
    args.finish()?;

    let summary = summarize(&data, kind)?;
    if ctx.json {
        output_json(&summary);
        return Ok(());
    }

    print_title(ctx, "Descriptive statistics");
    print_note(ctx, &format!("{} values, {}", summary.n, summary.kind.label()));

    print_section(ctx, "Location");
    print_value(ctx, "mean", summary.mean);
    print_value(ctx, "median", summary.median);
    if let (Some(q1), Some(q3)) = (summary.q1, summary.q3) {
        print_value(ctx, "Q1", q1);
        print_value(ctx, "Q3", q3);
    }

    print_section(ctx, "Spread");
    print_value(ctx, "variance", summary.variance);
    print_value(ctx, "sd", summary.sd);
    print_value(ctx, "min", summary.min);
    print_value(ctx, "max", summary.max);
    print_value(ctx, "range", summary.range);
    if let Some(iqr) = summary.iqr {
        print_value(ctx, "IQR", iqr);
    }
    Ok(())
}
