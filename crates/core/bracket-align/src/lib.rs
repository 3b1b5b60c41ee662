//! # bracket-align
//!
//! Aligns a directory of exposure-bracketed images by chaining calls to the
//! external `img-aligner` tool.
//!
//! Images are recognised by an exposure marker in their file name:
//! `EXP <n>` means `n` seconds and `EXPR <n>` means `1/n` seconds. They are
//! ordered brightest first; the brightest one anchors the chain and every
//! darker image is warped onto the warped version of its brighter neighbour.
//!
//! ```rust,no_run
//! use bracket_align::{RunOutcome, align_directory};
//! use bracket_config::BracketConfig;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BracketConfig::default();
//!     let mut console = std::io::stdout();
//!     let outcome = align_directory(Path::new("shots"), &config, &mut console).await?;
//!     if let RunOutcome::Completed { steps, .. } = outcome {
//!         eprintln!("{steps} images aligned");
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("bracket-align stops the aligner with SIGTERM and only supports Unix targets");

pub mod aligner;
pub mod collect;
pub mod error;
pub mod exposure;
pub mod orchestrator;
pub mod plan;
pub mod process;
pub mod relay;
pub mod types;

pub use aligner::{AlignerInvoker, StepReport};
pub use collect::collect_brackets;
pub use error::{AlignError, Result};
pub use exposure::parse_exposure;
pub use orchestrator::{RunOutcome, align_directory, plan_directory, preview_directory};
pub use plan::{ChainPlan, aligned_path, plan_chain, sort_brightest_first};
pub use process::find_aligner;
pub use types::{ImageRecord, PlanStep};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
