//! `statcalc binomial|hypergeometric|poisson` -- counting distributions
//! under a comparison mode.

use anyhow::{Context, Result};
use statcalc_dist::{
    BinomialModel, Comparison, CountProbability, HypergeometricModel, PoissonModel, count,
    probability,
};
use statcalc_formula::{Assignments, Entry, FormulaError};

use crate::cli::CalcArgs;
use crate::commands::assignments;
use crate::context::RuntimeContext;
use crate::output::{
    output_json, print_note, print_probability, print_section, print_text, print_title,
    print_value,
};

const MODE: &[&str] = &["art", "mode", "modus", "test", "type"];
const P_SUCCESS: &[&str] = &["p", "p_erfolg", "erfolgswahrscheinlichkeit"];
const LAMBDA: &[&str] = &["lambda", "lambda_rate", "rate", "l", "λ"];
const POPULATION: &[&str] = &["n_pop", "n_total", "grundgesamtheit"];
const SUCCESSES: &[&str] = &["m_erfolg", "erfolge"];

pub fn run_binomial(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let mode = mode(ctx, &mut args)?;
    let n = count("n", required(args.number(&["n"])?, "n")?)?;
    let p = required(args.number(P_SUCCESS)?, "p")?;
    let k = count("k", required(args.number(&["k"])?, "k")?)?;
    args.finish()?;

    let model = BinomialModel::new(n, p)?;
    model.check_count(k)?;
    let result = probability(&model, k, mode);
    report(
        ctx,
        "Binomial distribution",
        &[("n (trials)", n.to_string()), ("p (success)", ctx.fmt(p)), ("k", k.to_string())],
        &result,
    );
    Ok(())
}

/// `N` (population) and `n` (sample) differ only in case, so both are
/// matched case-sensitively.
pub fn run_hypergeometric(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let mode = mode(ctx, &mut args)?;
    let big_n = either(args.number_exact(&["N"])?, || args.number(POPULATION))?;
    let big_m = either(args.number_exact(&["M"])?, || args.number(SUCCESSES))?;
    let n = args.number_exact(&["n"])?;
    let k = args.number(&["k"])?;
    args.finish()?;

    let big_n = count("N", required(big_n, "N")?)?;
    let big_m = count("M", required(big_m, "M")?)?;
    let n = count("n", required(n, "n")?)?;
    let k = count("k", required(k, "k")?)?;

    let model = HypergeometricModel::new(big_n, big_m, n)?;
    model.check_count(k)?;
    let result = probability(&model, k, mode);
    report(
        ctx,
        "Hypergeometric distribution",
        &[
            ("N (population)", big_n.to_string()),
            ("M (successes in population)", big_m.to_string()),
            ("n (sample)", n.to_string()),
            ("k", k.to_string()),
        ],
        &result,
    );
    Ok(())
}

pub fn run_poisson(ctx: &RuntimeContext, args: &CalcArgs) -> Result<()> {
    let mut args = assignments(args)?;
    let mode = mode(ctx, &mut args)?;
    let lambda = required(args.number(LAMBDA)?, "lambda")?;
    let k = count("k", required(args.number(&["k"])?, "k")?)?;
    args.finish()?;

    let model = PoissonModel::new(lambda)?;
    let result = probability(&model, k, mode);
    report(
        ctx,
        "Poisson distribution",
        &[("lambda", ctx.fmt(lambda)), ("k", k.to_string())],
        &result,
    );
    Ok(())
}

fn mode(ctx: &RuntimeContext, args: &mut Assignments) -> Result<Comparison> {
    match args.take(MODE) {
        Some(raw) if !raw.trim().is_empty() => Ok(raw.parse()?),
        _ => Ok(ctx.config.mode),
    }
}

fn required(entry: Entry, name: &str) -> Result<f64> {
    entry
        .value()
        .with_context(|| format!("{name} must be given as a number"))
}

fn either(
    first: Entry,
    fallback: impl FnOnce() -> Result<Entry, FormulaError>,
) -> Result<Entry> {
    if first.is_given() {
        Ok(first)
    } else {
        Ok(fallback()?)
    }
}

fn report(
    ctx: &RuntimeContext,
    title: &str,
    params: &[(&str, String)],
    result: &CountProbability,
) {
    if ctx.json {
        output_json(result);
        return;
    }
    print_title(ctx, title);
    print_section(ctx, "Parameters");
    for (name, value) in params {
        print_note(ctx, &format!("{name} = {value}"));
    }
    print_note(ctx, &format!("mode = {}", result.mode));

    print_section(ctx, "Result");
    print_note(ctx, &format!("{} = {}", result.event, result.combinator));
    print_probability(ctx, &result.event, result.probability);
    print_text("distribution", &result.distribution);
    print_value(ctx, "E(X)", result.mean);
    print_value(ctx, "Var(X)", result.variance);
}
