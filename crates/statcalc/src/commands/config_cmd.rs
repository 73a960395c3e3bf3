//! `statcalc config` -- show the effective settings or write a default file.

use anyhow::{Result, bail};
use serde::Serialize;
use statcalc_config::{StatcalcConfig, save_config};
use tracing::info;

use crate::cli::{ConfigArgs, ConfigCommands, ConfigInitArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, print_note, print_text, print_title, print_value};

#[derive(Serialize)]
struct ConfigView<'a> {
    path: String,
    exists: bool,
    config: &'a StatcalcConfig,
}

pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => show(ctx),
        ConfigCommands::Init(init_args) => init(ctx, init_args),
    }
}

fn show(ctx: &RuntimeContext) -> Result<()> {
    let exists = ctx.config_path.exists();
    if ctx.json {
        output_json(&ConfigView {
            path: ctx.config_path.display().to_string(),
            exists,
            config: &ctx.config,
        });
        return Ok(());
    }

    print_title(ctx, "Configuration");
    let source = if exists { "" } else { " (not found, using defaults)" };
    print_note(ctx, &format!("{}{source}", ctx.config_path.display()));
    let config = &ctx.config;
    print_text("precision", &config.precision.to_string());
    print_value(ctx, "alpha", config.alpha);
    print_text("tolerance", &config.tolerance.to_string());
    print_text("tail", config.tail.as_str());
    print_text("mode", config.mode.as_str());
    print_text("color", config.color.as_str());
    Ok(())
}

fn init(ctx: &RuntimeContext, args: &ConfigInitArgs) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_config(path, &StatcalcConfig::default())?;
    info!(path = %path.display(), "wrote configuration");

    if ctx.json {
        output_json(&serde_json::json!({ "path": path.display().to_string(), "created": true }));
    } else {
        println!("Created {}", path.display());
    }
    Ok(())
}
