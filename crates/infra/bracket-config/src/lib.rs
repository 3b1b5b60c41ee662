//! Configuration for exposure-bracket alignment runs.
//!
//! This crate provides:
//! - [`BracketConfig`]: aligner invocation, tuning parameters, output naming, logging
//! - [`load_merged`]: two-layer config loading (global + image directory) with env overrides
//! - [`schema`]: JSON Schema generation for IDE autocomplete
//! - [`validation`]: advisory validation that produces warnings
//!
//! # Configuration Precedence (lowest to highest)
//! 1. Default values
//! 2. Global config (`~/.config/bracket-align/bracket-align.json`)
//! 3. Local config (`<image dir>/bracket-align.json`)
//! 4. Environment variables
//!
//! # Environment Variables
//! - `IMG_ALIGNER_PATH`: path to the aligner executable
//! - `BRACKET_ALIGN_SUFFIX`: suffix appended to warped file stems
//! - `BRACKET_ALIGN_EXIT_TIMEOUT_SECS`: bound on waiting for the aligner to exit
//! - `BRACKET_ALIGN_LOG_LEVEL`: default tracing filter
//! - `BRACKET_ALIGN_LOG_JSON`: enable JSON logging ("true" or "1")

pub mod loader;
pub mod merge;
pub mod schema;
pub mod types;
pub mod validation;

pub use loader::{LoadedConfig, load_merged};
pub use schema::schema_json_pretty;
pub use types::{AlignerConfig, BracketConfig, LoggingConfig, OutputConfig, TuningParams};
pub use validation::AdvisoryWarning;
