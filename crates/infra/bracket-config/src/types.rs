//! Configuration types for bracket alignment.
//!
//! The root type is [`BracketConfig`], which groups the external aligner
//! invocation, the fixed tuning parameters passed to it, output naming,
//! and logging.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default suffix appended to the stem of every warped image.
pub const DEFAULT_SUFFIX: &str = " (aligned)";

/// Default name of the aligner executable looked up on `PATH`.
pub const DEFAULT_ALIGNER_BIN: &str = "img-aligner";

/// Root configuration, loaded from `bracket-align.json` files.
///
/// All fields use `#[serde(default)]` so partial configs work correctly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BracketConfig {
    /// Optional JSON Schema URL for IDE autocomplete support.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// How the external aligner is located and run.
    pub aligner: AlignerConfig,

    /// Fixed tuning parameters forwarded to every alignment.
    pub tuning: TuningParams,

    /// Naming of the produced files.
    pub output: OutputConfig,

    /// Logging and diagnostics configuration.
    pub logging: LoggingConfig,
}

/// External aligner invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlignerConfig {
    /// Explicit path to the aligner executable. When unset the executable
    /// is searched for on `PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Flag that puts the aligner into non-interactive mode.
    pub headless_flag: String,

    /// Seconds to wait for the aligner to exit after its output closes.
    pub exit_timeout_secs: u64,

    /// Additional arguments appended after the tuning flags.
    pub extra_args: Vec<String>,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            path: None,
            headless_flag: "--cli".into(),
            exit_timeout_secs: 5,
            extra_args: Vec::new(),
        }
    }
}

/// Tuning parameters passed through to the aligner unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TuningParams {
    /// Resolution used when evaluating the cost function (`--cost-res`).
    pub cost_res: u32,

    /// Pixel-count budget of the intermediate images (`--interm-res`).
    pub interm_res: u64,

    /// Initial warp strength (`--warp-strength`).
    pub warp_strength: f64,

    /// Warp strength decay rate (`--warp-strength-decay`).
    pub warp_strength_decay: f64,

    /// Floor for the decaying warp strength (`--min-warp-strength`).
    pub min_warp_strength: f64,

    /// Convergence threshold on the change in cost (`--min-change-in-cost`).
    pub min_change_in_cost: f64,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            cost_res: 240,
            interm_res: 2_000_000,
            warp_strength: 0.000_15,
            warp_strength_decay: 0.001,
            min_warp_strength: 0.000_1,
            min_change_in_cost: 0.000_005,
        }
    }
}

impl TuningParams {
    /// Render the parameters as aligner command-line flags.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--cost-res".into(),
            self.cost_res.to_string(),
            "--interm-res".into(),
            self.interm_res.to_string(),
            "--warp-strength".into(),
            self.warp_strength.to_string(),
            "--warp-strength-decay".into(),
            self.warp_strength_decay.to_string(),
            "--min-warp-strength".into(),
            self.min_warp_strength.to_string(),
            "--min-change-in-cost".into(),
            self.min_change_in_cost.to_string(),
        ]
    }
}

/// Output file naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to the file stem of each warped image, before the extension.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.into(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when neither `RUST_LOG` nor `-v` is given.
    pub level: String,

    /// Emit logs as JSON lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
        }
    }
}
