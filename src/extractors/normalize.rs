// src/extractors/normalize.rs
use crate::utils::error::ExtractError;

/// Marker Zacks renders for a value it does not have.
pub const EMPTY_SENTINEL: &str = "--";

/// Cleans one display-formatted cell into a number.
///
/// `"--"` maps to `None`. Otherwise the currency symbol, percent sign and
/// thousands separators are stripped and the remainder must parse as a
/// float. Percent cells come back as whole magnitudes (`"12%"` becomes
/// `12.0`); scaling into a fraction is the caller's business.
pub fn clean_value(raw: &str) -> Result<Option<f64>, ExtractError> {
    let trimmed = raw.trim();
    if trimmed == EMPTY_SENTINEL {
        return Ok(None);
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ','))
        .collect();
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ExtractError::ValueFormat(trimmed.to_string()))
}
