//! Configuration loader with two-layer merge and env overrides.
//!
//! The loading process:
//! 1. Read global config from `~/.config/bracket-align/bracket-align.json`
//! 2. Read local config from `<image dir>/bracket-align.json`
//! 3. Deep merge at JSON Value level (RFC 7396)
//! 4. Deserialize once into typed [`BracketConfig`]
//! 5. Apply env var overrides (highest precedence)
//! 6. Run advisory validation

use crate::{merge::merge_patch, types::BracketConfig, validation::AdvisoryWarning};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Filename for local config, looked up inside the image directory.
pub const LOCAL_FILE: &str = "bracket-align.json";

/// Directory name under `config_dir` for global config.
pub const GLOBAL_DIR: &str = "bracket-align";

/// Filename for global config.
pub const GLOBAL_FILE: &str = "bracket-align.json";

/// Resolved paths for config files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Path to local config (`<image dir>/bracket-align.json`).
    pub local: PathBuf,

    /// Path to global config.
    pub global: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct LoadedConfig {
    /// The loaded and merged configuration.
    pub config: BracketConfig,

    /// Advisory warnings from validation.
    pub warnings: Vec<AdvisoryWarning>,

    /// Resolved config file paths.
    pub paths: ConfigPaths,
}

/// Get the global config file path.
pub fn global_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config dir")?;
    Ok(base.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

/// Get the local config file path for a given image directory.
pub fn local_config_path(image_dir: &Path) -> PathBuf {
    image_dir.join(LOCAL_FILE)
}

/// Load and merge configuration for a run against `image_dir`.
///
/// # Precedence (lowest to highest)
/// 1. Default values
/// 2. Global config
/// 3. Local config in the image directory
/// 4. Environment variables
pub fn load_merged(image_dir: &Path) -> Result<LoadedConfig> {
    let global_path = global_config_path()?;
    load_with_global(&global_path, image_dir)
}

/// Same as [`load_merged`] with an explicit global config path.
pub fn load_with_global(global_path: &Path, image_dir: &Path) -> Result<LoadedConfig> {
    let local_path = local_config_path(image_dir);

    let global_v = read_json_object_or_empty(global_path)?;
    let local_v = read_json_object_or_empty(&local_path)?;
    let merged = merge_patch(global_v, local_v);

    let mut cfg: BracketConfig =
        serde_json::from_value(merged).context("Failed to deserialize merged config")?;

    apply_env_overrides(&mut cfg);

    let warnings = crate::validation::validate(&cfg);

    Ok(LoadedConfig {
        config: cfg,
        warnings,
        paths: ConfigPaths {
            local: local_path,
            global: global_path.to_path_buf(),
        },
    })
}

fn apply_env_overrides(cfg: &mut BracketConfig) {
    if let Some(v) = env_trimmed("IMG_ALIGNER_PATH") {
        cfg.aligner.path = Some(PathBuf::from(v));
    }
    if let Some(v) = env_trimmed("BRACKET_ALIGN_EXIT_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) => cfg.aligner.exit_timeout_secs = secs,
            Err(e) => tracing::warn!(
                "Ignoring BRACKET_ALIGN_EXIT_TIMEOUT_SECS={:?}: {}",
                v,
                e
            ),
        }
    }

    // Not trimmed: leading whitespace is significant in the default " (aligned)"
    if let Ok(v) = std::env::var("BRACKET_ALIGN_SUFFIX")
        && !v.is_empty()
    {
        cfg.output.suffix = v;
    }

    if let Some(v) = env_trimmed("BRACKET_ALIGN_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_trimmed("BRACKET_ALIGN_LOG_JSON") {
        cfg.logging.json = v.eq_ignore_ascii_case("true") || v == "1";
    }
}

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a JSON file as a Value, returning empty object if file doesn't exist.
fn read_json_object_or_empty(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match v {
        Value::Object(_) => Ok(v),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}
