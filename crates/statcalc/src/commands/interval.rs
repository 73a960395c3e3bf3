//! `statcalc interval` -- confidence intervals for a mean or a variance.

use anyhow::Result;
use statcalc_infer::interval::{self, Bounds, IntervalInput};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{
    output_json, print_derivation, print_note, print_section, print_text, print_title, print_value,
};

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let input = IntervalInput::from_assignments(&mut args)?;
    args.finish()?;
    let report = interval::compute(input, &ctx.defaults())?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }

    print_title(ctx, &format!("Confidence interval for the {}", report.kind.label()));
    print_note(
        ctx,
        &format!(
            "{} with alpha = {} ({} confidence)",
            report.tail.label(),
            ctx.fmt(report.alpha),
            ctx.percent(report.confidence)
        ),
    );
    print_derivation(ctx, &report.derivation);

    print_section(ctx, "Result");
    print_value(ctx, "n", report.n);
    if let Some(df) = report.df {
        print_value(ctx, "df", df);
    }
    print_value(ctx, "estimate", report.estimate);
    if let Some(se) = report.standard_error {
        print_value(ctx, "standard error", se);
    }
    for quantile in &report.quantiles {
        print_value(ctx, &format!("q({})", ctx.fmt(quantile.level)), quantile.value);
    }
    print_text("interval", &bounds(ctx, &report.bounds));
    if let Some(sd) = &report.sd_bounds {
        print_text("sd interval", &bounds(ctx, sd));
    }
    Ok(())
}

fn bounds(ctx: &RuntimeContext, b: &Bounds) -> String {
    let open = if b.lower.is_infinite() { '(' } else { '[' };
    let close = if b.upper.is_infinite() { ')' } else { ']' };
    format!("{open}{}, {}{close}", ctx.fmt(b.lower), ctx.fmt(b.upper))
}
