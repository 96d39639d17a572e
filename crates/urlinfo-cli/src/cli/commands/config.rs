//! `urlcheck config` - Configuration management.

use anyhow::Result;
use colored::Colorize;
use urlinfo::CheckerConfig;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::OutputFormat;

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => init_config(&ctx, force),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
        OutputFormat::Pretty => {
            println!("{} {}", "Configuration:".bold(), ctx.config_path.display().to_string().dimmed());
            println!();
            print!("{}", ctx.config.to_toml()?);
        }
    }

    Ok(())
}

fn init_config(ctx: &Context, force: bool) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\n\
             Use --force to overwrite it.",
            path.display()
        );
    }

    CheckerConfig::default().save(path)?;
    println!("{} Wrote default config to {}.", "Success:".green().bold(), path.display().to_string().cyan());

    Ok(())
}
