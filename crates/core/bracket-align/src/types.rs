use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// One bracket image found on disk together with its exposure in seconds.
///
/// Records are never mutated after collection. Equality compares both the
/// path and the exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    path: PathBuf,
    exposure_secs: f64,
}

impl ImageRecord {
    /// Create a record. `exposure_secs` must be positive and finite; the
    /// collector only builds records from values the exposure parser
    /// accepted.
    pub(crate) fn new(path: PathBuf, exposure_secs: f64) -> Self {
        debug_assert!(exposure_secs.is_finite() && exposure_secs > 0.0);
        Self {
            path,
            exposure_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exposure_secs(&self) -> f64 {
        self.exposure_secs
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }

    /// Brightest-first order: a longer exposure sorts before a shorter one.
    pub fn brightness_cmp(&self, other: &Self) -> Ordering {
        other.exposure_secs.total_cmp(&self.exposure_secs)
    }
}

/// One link of the chain: warp `base` onto `target_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// 1-based position of the base image in the brightest-first order.
    pub index: usize,

    /// The darker image being warped.
    pub base: ImageRecord,

    /// The brighter neighbour `base` is aligned to.
    pub target: ImageRecord,

    /// File actually handed to the aligner as the target. For every step
    /// after the first this is the previous step's output.
    pub target_path: PathBuf,

    /// Where the aligner writes the warped base image.
    pub output_path: PathBuf,

    /// Ratio of target to base exposure, applied to the base image.
    pub multiplier: f64,
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
