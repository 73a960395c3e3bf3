//! `statcalc z-score` and `statcalc k-sigma`.

use anyhow::Result;
use statcalc_infer::{k_sigma, z_score};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_formula_report, print_probability, print_title};

pub fn run_z_score(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let report = z_score(&ctx.registry, &mut args, ctx.tolerance())?;
    args.finish()?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }
    print_title(ctx, "Z-score");
    print_formula_report(ctx, &report, &["z", "x", "mu", "sigma", "var"]);
    if let Some(p) = report.value("p") {
        print_probability(ctx, "P(Z <= z)", p);
    }
    Ok(())
}

pub fn run_k_sigma(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let report = k_sigma(&ctx.registry, &mut args, ctx.tolerance())?;
    args.finish()?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }
    print_title(ctx, "k-sigma interval");
    print_formula_report(ctx, &report, &["k", "mu", "sigma", "lower", "upper"]);
    if let Some(conf) = report.value("conf") {
        print_probability(ctx, "coverage", conf);
    }
    Ok(())
}
