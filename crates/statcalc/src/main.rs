//! `statcalc` -- command-line calculators for introductory inferential
//! statistics.
//!
//! Parses the CLI with clap, loads the configuration into a runtime
//! context and dispatches to the calculator handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use context::RuntimeContext;

const LOG_FILTER: &str = "statcalc=debug,statcalc_formula=debug,statcalc_dist=debug,\
                          statcalc_infer=debug,statcalc_describe=debug,statcalc_config=debug";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => exit_on_parse_error(e),
    };

    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(LOG_FILTER)
            .with_writer(std::io::stderr)
            .init();
    }

    let command = cli.command;
    let name = command.as_ref().map(Commands::name);

    let result = match command {
        // Completion does not depend on the configuration.
        Some(Commands::Completion(args)) => commands::completion::run(&args),
        Some(command) => RuntimeContext::from_global_args(&cli.global)
            .and_then(|ctx| dispatch(&ctx, command)),
        None => {
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        report_error(&format!("{:#}", e), cli.global.json, name);
    }
}

/// Help and version requests exit 0; every other clap error is reported
/// like a calculator error.
fn exit_on_parse_error(e: clap::Error) -> ! {
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        e.print().ok();
        std::process::exit(0);
    }
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let cmd = Cli::command();
    let name = args
        .iter()
        .find_map(|a| cmd.find_subcommand(a))
        .map(|sub| sub.get_name().to_string());

    let rendered = e.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ");
    report_error(message, json, name.as_deref());
}

/// Print `message` to stderr (as JSON with `json`), the usage line to
/// stdout in text mode, and exit 1.
fn report_error(message: &str, json: bool, name: Option<&str>) -> ! {
    if json {
        let err_json = serde_json::json!({ "error": message });
        if let Ok(s) = serde_json::to_string_pretty(&err_json) {
            eprintln!("{}", s);
        }
    } else {
        eprintln!("Error: {}", message);
        let line = match name {
            Some(name) => usage(name),
            None => Some(Cli::command().render_usage().to_string()),
        };
        if let Some(line) = line {
            println!("{line}");
        }
    }
    std::process::exit(1);
}

fn dispatch(ctx: &RuntimeContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Binomial(args) => commands::distribution::run_binomial(ctx, &args),
        Commands::Hypergeometric(args) => commands::distribution::run_hypergeometric(ctx, &args),
        Commands::Poisson(args) => commands::distribution::run_poisson(ctx, &args),
        Commands::ZScore(args) => commands::score::run_z_score(ctx, &args),
        Commands::CohensD(args) => commands::effect::run(ctx, &args),
        Commands::KSigma(args) => commands::score::run_k_sigma(ctx, &args),
        Commands::Hypothesis(args) => commands::hypothesis::run(ctx, &args),
        Commands::Interval(args) => commands::interval::run(ctx, &args),
        Commands::Power(args) => commands::power::run(ctx, &args),
        Commands::Correlation(args) => commands::correlation::run(ctx, &args),
        Commands::Describe(args) => commands::describe::run(ctx, &args),
        Commands::Formula(args) => commands::formula::run(ctx, &args),
        Commands::Config(args) => commands::config_cmd::run(ctx, &args),
        Commands::Completion(args) => commands::completion::run(&args),
        Commands::Version => commands::version::run(ctx),
    }
}

/// Usage line of a subcommand, shown after an error.
fn usage(name: &str) -> Option<String> {
    let mut cmd = Cli::command();
    cmd.build();
    let sub = cmd.find_subcommand_mut(name)?;
    Some(sub.render_usage().to_string())
}
