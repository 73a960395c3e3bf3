//! `statcalc formula` -- list, inspect and solve the built-in formulas.

use anyhow::{Result, bail};
use statcalc_formula::Assignments;
use statcalc_formula::types::FormulaSummary;
use statcalc_infer::evaluate;
use statcalc_ui::styles::{render_accent, render_bold, render_muted};

use crate::cli::{FormulaArgs, FormulaCommands, FormulaShowArgs, FormulaSolveArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, print_formula_report, print_separator, print_title};

pub fn run(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    match &args.command {
        FormulaCommands::List => list(ctx),
        FormulaCommands::Show(show_args) => show(ctx, show_args),
        FormulaCommands::Solve(solve_args) => solve(ctx, solve_args),
    }
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let summaries: Vec<FormulaSummary> = ctx.registry.iter().map(|f| f.summary()).collect();
    if ctx.json {
        output_json(&summaries);
        return Ok(());
    }
    let width = summaries.iter().map(|s| s.id.len()).max().unwrap_or(0);
    for summary in &summaries {
        let names: Vec<&str> = summary.variables.iter().map(|v| v.name.as_str()).collect();
        println!(
            "{}  {}  {}",
            render_accent(&format!("{:<width$}", summary.id)),
            summary.description,
            render_muted(&format!("({})", names.join(", ")))
        );
    }
    Ok(())
}

fn show(ctx: &RuntimeContext, args: &FormulaShowArgs) -> Result<()> {
    let summary = ctx.registry.get(&args.id)?.summary();
    if ctx.json {
        output_json(&summary);
        return Ok(());
    }
    print_title(ctx, &summary.description);
    println!("{}", render_muted(&format!("id: {}", summary.id)));
    for var in &summary.variables {
        print_separator(ctx);
        println!(
            "  {} {}",
            render_bold(&var.name),
            render_muted(&format!("- {}", var.description))
        );
        println!("    {}", var.expression);
        println!("    {}", render_muted(&format!("domain: {}", var.domain.requirement())));
        if !var.aliases.is_empty() {
            println!("    {}", render_muted(&format!("aliases: {}", var.aliases.join(", "))));
        }
    }
    Ok(())
}

fn solve(ctx: &RuntimeContext, args: &FormulaSolveArgs) -> Result<()> {
    let ids = args.id_list();
    if ids.is_empty() {
        bail!("at least one formula id must be given");
    }
    let mut assignments = Assignments::parse(&args.bindings)?;
    let report = evaluate(&ctx.registry, &ids, &mut assignments, ctx.tolerance())?;
    assignments.finish()?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }
    print_title(ctx, &ids.join(" + "));
    let names: Vec<&str> = report.values.iter().map(|(name, _)| name).collect();
    print_formula_report(ctx, &report, &names);
    Ok(())
}
