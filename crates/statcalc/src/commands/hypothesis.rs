//! `statcalc hypothesis` -- one-sample Z- or t-test with a decision.

use anyhow::Result;
use statcalc_infer::hypothesis::{self, HypothesisInput};
use statcalc_ui::styles::{render_verdict, render_warn};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{
    output_json, print_derivation, print_note, print_probability, print_section, print_text,
    print_title, print_value, print_verifications,
};

const SHOWN: &[&str] = &["x_bar", "mu0", "sigma", "s", "n"];

pub fn run(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let input = HypothesisInput::from_assignments(&mut args, &ctx.registry)?;
    args.finish()?;
    let report = hypothesis::run(&ctx.registry, input, ctx.tolerance())?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }

    print_title(ctx, report.kind.label());
    if let Some(tail) = report.tail {
        print_note(ctx, &format!("test side = {}", tail.label()));
    }
    print_derivation(ctx, &report.derivation);

    print_section(ctx, "Result");
    for name in SHOWN {
        if let Some(value) = report.values.get(name) {
            print_value(ctx, name, value);
        }
    }
    if let Some(df) = report.df {
        print_value(ctx, "df", df);
    }
    print_value(ctx, "standard error", report.standard_error);
    if let Some(statistic) = report.statistic() {
        print_value(ctx, report.kind.statistic(), statistic);
    }
    let p_label = if report.p_value_given {
        "p (given)".to_string()
    } else {
        format!("p ({})", report.p_value_tail.label())
    };
    print_probability(ctx, &p_label, report.p_value);

    if !report.critical.is_empty() {
        print_section(ctx, "Critical values");
        for critical in &report.critical {
            let symbol = report.kind.statistic();
            let value = if critical.tail == statcalc_dist::Tail::TwoSided {
                format!("+/-{}", ctx.fmt(critical.value.abs()))
            } else {
                ctx.fmt(critical.value)
            };
            print_text(
                &format!("{symbol}_crit {} (q = {})", critical.tail.label(), ctx.fmt(critical.level)),
                &value,
            );
        }
    }

    if let Some(decision) = &report.decision {
        print_section(ctx, "Decision");
        let mu0 = report.values.get("mu0").map(|v| ctx.fmt(v)).unwrap_or_else(|| "mu0".into());
        print_note(ctx, &format!("H1: {}", decision.alternative(&mu0)));
        print_note(ctx, &decision.comparison);
        print_note(
            ctx,
            &format!("p = {} vs alpha = {}", ctx.fmt(decision.p_value), ctx.fmt(decision.alpha)),
        );
        println!("  {}", render_verdict(decision.reject()));
        if !decision.criteria_agree() {
            println!(
                "  {}",
                render_warn("critical value and p-value criteria disagree")
            );
        }
    }

    if let Some(verification) = &report.verification {
        print_verifications(ctx, std::slice::from_ref(verification));
    }
    Ok(())
}
