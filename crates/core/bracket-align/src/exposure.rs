//! Exposure time inference from bracket file names.
//!
//! A bracket candidate starts with `"EXP "` followed by the exposure in
//! seconds, or `"EXPR "` followed by the reciprocal of the exposure:
//!
//! - `EXP 2 2025-04-24.png` is a 2 s exposure
//! - `EXPR 5 forest.exr` is a 1/5 s exposure
//!
//! Only an unsigned run of ASCII digits is read after the marker.

use crate::error::{AlignError, Result};

/// Marker for names carrying the exposure time in seconds.
pub const EXPOSURE_MARKER: &str = "EXP ";

/// Marker for names carrying the reciprocal of the exposure time.
pub const RECIPROCAL_MARKER: &str = "EXPR ";

/// Parse the exposure time in seconds encoded in `file_name`.
///
/// Returns `Ok(None)` when the name is not a bracket candidate: no marker,
/// or a marker with no digits right after it. A numeral that yields no
/// positive finite exposure (`EXP 0`, `EXPR 0`) is rejected with
/// [`AlignError::DegenerateExposure`].
pub fn parse_exposure(file_name: &str) -> Result<Option<f64>> {
    let (rest, reciprocal) = if let Some(rest) = file_name.strip_prefix(RECIPROCAL_MARKER) {
        (rest, true)
    } else if let Some(rest) = file_name.strip_prefix(EXPOSURE_MARKER) {
        (rest, false)
    } else {
        return Ok(None);
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok(None);
    }
    let numeral = &rest[..digits];

    let Ok(value) = numeral.parse::<f64>() else {
        return Ok(None);
    };
    let exposure = if reciprocal { value.recip() } else { value };

    if !exposure.is_finite() || exposure <= 0.0 {
        return Err(AlignError::DegenerateExposure {
            file_name: file_name.to_string(),
            numeral: numeral.to_string(),
        });
    }

    Ok(Some(exposure))
}
