//! `statcalc power` -- power, required sample size or detectable mean.

use anyhow::Result;
use statcalc_infer::power::{self, PowerInput};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{
    output_json, print_derivation, print_note, print_probability, print_section, print_text,
    print_title, print_value,
};

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let input = PowerInput::from_assignments(&mut args)?;
    args.finish()?;
    let report = power::compute(input, &ctx.defaults())?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }

    print_title(ctx, &format!("Power of the {}", report.kind.label()));
    print_note(
        ctx,
        &format!(
            "{}: {} with alpha = {}",
            report.target.label(),
            report.tail.label(),
            ctx.fmt(report.alpha)
        ),
    );
    print_derivation(ctx, &report.derivation);

    print_section(ctx, "Result");
    if let Some(n) = report.n {
        print_value(ctx, "n", n);
    }
    if let Some(mu1) = report.mu1 {
        print_value(ctx, "mu1", mu1);
    }
    if let Some(df) = report.df {
        print_value(ctx, "df", df);
    }
    if let Some(sd) = report.pooled_sd {
        print_value(ctx, "pooled sd", sd);
    }
    print_value(ctx, "effect", report.effect);
    print_value(ctx, "standard error", report.standard_error);
    print_value(ctx, "critical value", report.critical);
    print_value(ctx, "standardized shift", report.standardized);
    if let Some(requested) = report.requested_power {
        print_probability(ctx, "requested power", requested);
    }
    print_probability(ctx, "power", report.power);
    print_probability(ctx, "beta", report.beta);
    print_text("rating", report.label.describe());
    Ok(())
}
