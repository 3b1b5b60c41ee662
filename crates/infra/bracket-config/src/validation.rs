//! Advisory validation for [`BracketConfig`].
//!
//! Validation only collects warnings. Values that would actually break a
//! chain (an unusable output suffix) are rejected by the aligner crate
//! when a run starts.

use crate::types::BracketConfig;

/// Flags the invoker always sets itself; repeating them in `extra_args`
/// leaves the aligner with two conflicting values.
const MANAGED_FLAGS: &[&str] = &["-b", "-t", "-o", "--base-mul"];

/// An advisory warning about a configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    /// Human-readable warning message.
    pub message: String,

    /// JSON path to the problematic config field.
    pub path: &'static str,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Validate a configuration and return advisory warnings.
pub fn validate(cfg: &BracketConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];
    let tuning = &cfg.tuning;

    if tuning.cost_res == 0 {
        warnings.push(AdvisoryWarning {
            code: "tuning.cost_res.zero",
            path: "tuning.cost_res",
            message: "cost resolution must be greater than zero".into(),
        });
    }
    if tuning.interm_res == 0 {
        warnings.push(AdvisoryWarning {
            code: "tuning.interm_res.zero",
            path: "tuning.interm_res",
            message: "intermediate resolution must be greater than zero".into(),
        });
    }
    if u64::from(tuning.cost_res) * u64::from(tuning.cost_res) > tuning.interm_res {
        warnings.push(AdvisoryWarning {
            code: "tuning.cost_res.exceeds_interm",
            path: "tuning.cost_res",
            message: format!(
                "cost resolution {} needs more pixels than the intermediate budget {}",
                tuning.cost_res, tuning.interm_res
            ),
        });
    }

    validate_positive(
        tuning.warp_strength,
        "tuning.warp_strength",
        "tuning.warp_strength.not_positive",
        &mut warnings,
    );
    validate_positive(
        tuning.warp_strength_decay,
        "tuning.warp_strength_decay",
        "tuning.warp_strength_decay.not_positive",
        &mut warnings,
    );
    validate_positive(
        tuning.min_warp_strength,
        "tuning.min_warp_strength",
        "tuning.min_warp_strength.not_positive",
        &mut warnings,
    );
    validate_positive(
        tuning.min_change_in_cost,
        "tuning.min_change_in_cost",
        "tuning.min_change_in_cost.not_positive",
        &mut warnings,
    );

    if tuning.min_warp_strength > tuning.warp_strength {
        warnings.push(AdvisoryWarning {
            code: "tuning.min_warp_strength.above_initial",
            path: "tuning.min_warp_strength",
            message: format!(
                "minimum warp strength {} is above the initial warp strength {}",
                tuning.min_warp_strength, tuning.warp_strength
            ),
        });
    }

    if cfg.aligner.exit_timeout_secs == 0 {
        warnings.push(AdvisoryWarning {
            code: "aligner.exit_timeout_secs.zero",
            path: "aligner.exit_timeout_secs",
            message: "a zero exit timeout fails every step that is still running".into(),
        });
    }

    if cfg.aligner.headless_flag.trim().is_empty() {
        warnings.push(AdvisoryWarning {
            code: "aligner.headless_flag.empty",
            path: "aligner.headless_flag",
            message: "without a headless flag the aligner opens its GUI".into(),
        });
    }

    for arg in &cfg.aligner.extra_args {
        if MANAGED_FLAGS.contains(&arg.as_str()) || *arg == cfg.aligner.headless_flag {
            warnings.push(AdvisoryWarning {
                code: "aligner.extra_args.managed_flag",
                path: "aligner.extra_args",
                message: format!("'{arg}' is already set for every step"),
            });
        }
    }

    warnings
}

fn validate_positive(
    value: f64,
    path: &'static str,
    code: &'static str,
    warnings: &mut Vec<AdvisoryWarning>,
) {
    if !value.is_finite() || value <= 0.0 {
        warnings.push(AdvisoryWarning {
            code,
            path,
            message: format!("expected a positive number, got {value}"),
        });
    }
}
