//! `statcalc cohens-d` -- standardized mean difference with its rating.

use anyhow::Result;
use statcalc_infer::cohens_d;

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_formula_report, print_text, print_title};

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let report = cohens_d(&ctx.registry, &mut args, ctx.tolerance())?;
    args.finish()?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }
    print_title(ctx, "Cohen's d");
    print_formula_report(ctx, &report.formula, &["d", "x_bar", "mu0", "sigma"]);
    if let Some(effect) = report.effect {
        print_text("effect", effect.label());
    }
    Ok(())
}
