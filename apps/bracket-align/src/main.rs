//! bracket-align CLI.
//!
//! Aligns every exposure-bracketed image in a directory onto its brighter
//! neighbour by chaining `img-aligner` runs, and manages the
//! `bracket-align.json` configuration.

use anyhow::Result;
use bracket_config::LoggingConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bracket-align")]
#[command(about = "Align exposure-bracketed images by chaining img-aligner runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Align all bracket images in a directory
    Align(commands::RunArgs),

    /// Show the alignment chain and aligner commands without running them
    Plan(commands::RunArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Align(args) => {
            let loaded = args.load()?;
            init_tracing(cli.verbose, &loaded.config.logging);
            commands::align::execute(&args.dir, loaded).await
        }
        Commands::Plan(args) => {
            let loaded = args.load()?;
            init_tracing(cli.verbose, &loaded.config.logging);
            commands::plan::execute(&args.dir, loaded)
        }
        Commands::Config { command } => {
            init_tracing(cli.verbose, &LoggingConfig::default());
            commands::config::execute(command)
        }
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins, then `-v` flags, then the configured level.
fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
