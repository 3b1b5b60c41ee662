pub mod align;
pub mod config;
pub mod plan;

use anyhow::Result;
use bracket_config::{LoadedConfig, load_merged};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Arguments shared by `align` and `plan`.
#[derive(Args)]
pub struct RunArgs {
    /// Directory holding the bracket images
    pub dir: PathBuf,

    /// Aligner executable (overrides config and IMG_ALIGNER_PATH)
    #[arg(long, value_name = "PATH")]
    pub aligner: Option<PathBuf>,

    /// Suffix appended to the stem of each warped image
    #[arg(long, allow_hyphen_values = true)]
    pub suffix: Option<String>,

    /// Seconds to wait for the aligner to exit after its output closes
    #[arg(long, value_name = "SECS")]
    pub exit_timeout_secs: Option<u64>,
}

impl RunArgs {
    /// Load the merged configuration for `dir` and apply the flag overrides.
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut loaded = load_merged(&self.dir)?;
        let cfg = &mut loaded.config;

        if let Some(aligner) = &self.aligner {
            cfg.aligner.path = Some(aligner.clone());
        }
        if let Some(suffix) = &self.suffix {
            cfg.output.suffix.clone_from(suffix);
        }
        if let Some(secs) = self.exit_timeout_secs {
            cfg.aligner.exit_timeout_secs = secs;
        }

        loaded.warnings = bracket_config::validation::validate(cfg);
        Ok(loaded)
    }
}

/// Print advisory warnings to stderr.
pub fn print_warnings(loaded: &LoadedConfig) {
    for warning in &loaded.warnings {
        eprintln!("{} {}", "WARN".yellow(), warning);
    }
}
