//! Chain planning: brightest-first ordering and the base/target links.
//!
//! The brightest image anchors the chain and is never warped. Every other
//! image is warped onto the already-warped version of its next brighter
//! neighbour, so the steps must run strictly in order.

use crate::error::{AlignError, Result};
use crate::types::{ImageRecord, PlanStep};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Ordered records and the steps that align them.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPlan {
    /// Records sorted brightest first.
    pub ordered: Vec<ImageRecord>,

    /// One step per record after the first. Empty when fewer than two
    /// records were collected.
    pub steps: Vec<PlanStep>,
}

impl ChainPlan {
    /// Whether there is anything to align.
    pub fn is_runnable(&self) -> bool {
        self.ordered.len() >= 2
    }
}

/// Sort `records` brightest first. The sort is stable, so records with
/// equal exposures keep their collection order.
pub fn sort_brightest_first(records: &mut [ImageRecord]) {
    records.sort_by(ImageRecord::brightness_cmp);
}

/// Order `records` and derive the alignment steps.
pub fn plan_chain(mut records: Vec<ImageRecord>, aligned_suffix: &str) -> Result<ChainPlan> {
    check_suffix(aligned_suffix)?;
    sort_brightest_first(&mut records);

    let mut steps = Vec::with_capacity(records.len().saturating_sub(1));
    let mut previous_output: Option<PathBuf> = None;
    for (offset, pair) in records.windows(2).enumerate() {
        let step = next_step(
            offset + 1,
            &pair[0],
            &pair[1],
            previous_output.as_deref(),
            aligned_suffix,
        );
        previous_output = Some(step.output_path.clone());
        steps.push(step);
    }

    Ok(ChainPlan {
        ordered: records,
        steps,
    })
}

/// Build step `index` from its two records.
///
/// `previous_output` is the output of step `index - 1`; when present it
/// replaces the target's original file.
fn next_step(
    index: usize,
    target: &ImageRecord,
    base: &ImageRecord,
    previous_output: Option<&Path>,
    aligned_suffix: &str,
) -> PlanStep {
    let target_path =
        previous_output.map_or_else(|| target.path().to_path_buf(), Path::to_path_buf);

    PlanStep {
        index,
        base: base.clone(),
        target: target.clone(),
        target_path,
        output_path: aligned_path(base.path(), aligned_suffix),
        multiplier: target.exposure_secs() / base.exposure_secs(),
    }
}

/// Append `suffix` to the file stem of `path`, keeping the extension.
///
/// `EXPR 25 car.exr` becomes `EXPR 25 car (aligned).exr`.
pub fn aligned_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Reject suffixes that would make the aligner overwrite its input or
/// write outside the image directory.
pub fn check_suffix(suffix: &str) -> Result<()> {
    if suffix.is_empty() {
        return Err(AlignError::InvalidConfiguration {
            message: "output suffix cannot be empty".to_string(),
        });
    }
    if suffix.contains('/') || suffix.contains(std::path::MAIN_SEPARATOR) {
        return Err(AlignError::InvalidConfiguration {
            message: format!("output suffix '{suffix}' cannot contain a path separator"),
        });
    }
    Ok(())
}
