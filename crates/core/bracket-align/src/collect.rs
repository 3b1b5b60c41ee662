//! Directory scan for bracket candidates.

use crate::error::{AlignError, Result};
use crate::exposure::parse_exposure;
use crate::plan::aligned_path;
use crate::types::ImageRecord;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, warn};

/// Scan `dir` (non-recursively) for bracket images.
///
/// Entries are visited in file name order, which is the order records with
/// equal exposures keep after planning. Files whose stem already ends with
/// `aligned_suffix` are outputs of an earlier run and are skipped, as are
/// directories and names that are not valid UTF-8.
pub fn collect_brackets(dir: &Path, aligned_suffix: &str) -> Result<Vec<ImageRecord>> {
    let read_dir_err = |source| AlignError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names: Vec<OsString> = std::fs::read_dir(dir)
        .map_err(read_dir_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()
        .map_err(read_dir_err)?;
    names.sort();

    let mut records = Vec::new();
    for name in names {
        let Some(name) = name.to_str() else {
            debug!("Skipping non UTF-8 entry {:?}", name);
            continue;
        };

        if is_aligned_output(name, aligned_suffix) {
            debug!("Skipping previous output '{}'", name);
            continue;
        }

        let exposure = match parse_exposure(name) {
            Ok(Some(exposure)) => exposure,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let path = dir.join(name);
        if !path.is_file() {
            debug!("Skipping '{}': not a file", name);
            continue;
        }

        records.push(ImageRecord::new(path, exposure));
    }

    debug!("Collected {} bracket images from {}", records.len(), dir.display());
    Ok(records)
}

/// Whether `name` is what [`aligned_path`] makes of some other name.
///
/// Every occurrence of the suffix is tried, since a suffix containing `.`
/// can end up after the extension separator.
fn is_aligned_output(name: &str, aligned_suffix: &str) -> bool {
    if aligned_suffix.is_empty() {
        return false;
    }

    name.match_indices(aligned_suffix).any(|(at, _)| {
        let original = format!("{}{}", &name[..at], &name[at + aligned_suffix.len()..]);
        aligned_path(Path::new(&original), aligned_suffix) == Path::new(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SUFFIX: &str = " (aligned)";

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn names(records: &[ImageRecord]) -> Vec<String> {
        records.iter().map(ImageRecord::display_name).collect()
    }

    #[test]
    fn test_collects_candidates_only() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "EXP 2 b.png",
            "EXPR 4 c.png",
            "EXPLODE.png",
            "EXP x.png",
            "notes.txt",
        ] {
            touch(tmp.path(), name);
        }

        let records = collect_brackets(tmp.path(), SUFFIX).unwrap();
        assert_eq!(names(&records), vec!["EXP 2 b.png", "EXPR 4 c.png"]);
        assert_eq!(records[0].exposure_secs(), 2.0);
        assert_eq!(records[1].exposure_secs(), 0.25);
        assert_eq!(records[0].path(), tmp.path().join("EXP 2 b.png"));
    }

    #[test]
    fn test_skips_previous_outputs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "EXP 4 b.exr");
        touch(tmp.path(), "EXP 4 b (aligned).exr");

        let records = collect_brackets(tmp.path(), SUFFIX).unwrap();
        assert_eq!(names(&records), vec!["EXP 4 b.exr"]);
    }

    #[test]
    fn test_suffix_only_checked_against_stem() {
        let tmp = TempDir::new().unwrap();
        // The suffix sits in the middle of the name, not at the end of the stem
        touch(tmp.path(), "EXP 4 b (aligned) copy.exr");

        let records = collect_brackets(tmp.path(), SUFFIX).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_skips_degenerate_and_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "EXPR 0 zero.png");
        touch(tmp.path(), "EXP 1 one.png");
        fs::create_dir(tmp.path().join("EXP 3 folder")).unwrap();

        let records = collect_brackets(tmp.path(), SUFFIX).unwrap();
        assert_eq!(names(&records), vec!["EXP 1 one.png"]);
    }

    #[test]
    fn test_does_not_recurse() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("nested");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "EXP 1 deep.png");

        assert!(collect_brackets(tmp.path(), SUFFIX).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        match collect_brackets(&missing, SUFFIX) {
            Err(AlignError::ReadDir { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected ReadDir error, got {other:?}"),
        }
    }

    #[test]
    fn test_entries_come_back_in_name_order() {
        let tmp = TempDir::new().unwrap();
        for name in ["EXP 1 c.png", "EXP 1 a.png", "EXP 1 b.png"] {
            touch(tmp.path(), name);
        }

        let records = collect_brackets(tmp.path(), SUFFIX).unwrap();
        assert_eq!(
            names(&records),
            vec!["EXP 1 a.png", "EXP 1 b.png", "EXP 1 c.png"]
        );
    }

    #[test]
    fn test_dotted_suffix_outputs_are_not_recollected() {
        let tmp = TempDir::new().unwrap();
        let suffix = ".aligned";
        for original in ["EXP 4 raw", "EXP 2 a.png"] {
            touch(tmp.path(), original);
            let output = aligned_path(&tmp.path().join(original), suffix);
            fs::write(output, b"").unwrap();
        }

        let records = collect_brackets(tmp.path(), suffix).unwrap();
        assert_eq!(names(&records), vec!["EXP 2 a.png", "EXP 4 raw"]);
    }

    #[test]
    fn test_is_aligned_output() {
        assert!(is_aligned_output("EXP 4 b (aligned).exr", SUFFIX));
        assert!(is_aligned_output("EXP 4 b (aligned)", SUFFIX));
        assert!(is_aligned_output("EXP 4 raw.aligned", ".aligned"));
        assert!(!is_aligned_output("EXP 4 b (aligned) copy.exr", SUFFIX));
        assert!(!is_aligned_output("EXP 4 b.exr", SUFFIX));
        assert!(!is_aligned_output("EXP 4 b.exr", ""));
    }
}
