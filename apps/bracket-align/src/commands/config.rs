//! Configuration management commands.
//!
//! Provides show, schema, and validate subcommands for the
//! `bracket-align.json` configuration files.

use anyhow::Result;
use bracket_align::plan::check_suffix;
use bracket_config::{LoadedConfig, load_merged};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show {
        /// Output as raw JSON (no formatting)
        #[arg(long)]
        json: bool,

        /// Image directory whose local config is merged (defaults to current dir)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Output the JSON Schema for bracket-align.json
    Schema,

    /// Validate configuration and show warnings
    Validate {
        /// Image directory whose local config is merged (defaults to current dir)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub fn execute(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json, path } => cmd_show(json, path),
        ConfigCommands::Schema => cmd_schema(),
        ConfigCommands::Validate { path } => cmd_validate(path),
    }
}

fn load(path: Option<PathBuf>) -> Result<LoadedConfig> {
    let dir = match path {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    load_merged(&dir)
}

fn cmd_show(json_output: bool, path: Option<PathBuf>) -> Result<()> {
    let loaded = load(path)?;
    super::print_warnings(&loaded);

    if json_output {
        println!("{}", serde_json::to_string(&loaded.config)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&loaded.config)?);
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    println!("{}", bracket_config::schema_json_pretty()?);
    Ok(())
}

fn cmd_validate(path: Option<PathBuf>) -> Result<()> {
    let loaded = load(path)?;

    if let Err(e) = check_suffix(&loaded.config.output.suffix) {
        eprintln!("{} {}", "ERROR".red(), e);
        anyhow::bail!("Configuration cannot be used for a run");
    }

    if loaded.warnings.is_empty() {
        println!("{} Configuration is valid", "OK".green());
    } else {
        println!(
            "{} Configuration has {} warning(s):",
            "WARN".yellow(),
            loaded.warnings.len()
        );
        for w in &loaded.warnings {
            println!("  - {w}");
        }
    }

    println!("\nConfig files:");
    println!("  Global: {}", loaded.paths.global.display());
    println!("  Local:  {}", loaded.paths.local.display());
    Ok(())
}
