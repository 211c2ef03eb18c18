//! Band lookup for a location and LOA.
//!
//! Overlapping bands are resolved first-match-wins in table order. Existing
//! datasets rely on this, so it is not refined into a "most specific band"
//! rule.

use thiserror::Error;
use tracing::debug;

use crate::dataset::Dataset;
use crate::models::{Band, LookupOutcome, Operation, TugRequirement};
use crate::utils::parse_finite;

/// Malformed user input. Distinct from `LookupOutcome::NoMatch`, which is a
/// valid query that simply has no band.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter a valid LOA (m).")]
    InvalidLoa(String),

    #[error("Select a jetty/location.")]
    MissingLocation,

    #[error("Unknown jetty/location: {0}")]
    UnknownLocation(String),
}

/// First band for `location` whose inclusive range contains `loa`.
pub fn find_band<'a>(bands: &'a [Band], location: &str, loa: f64) -> Option<&'a Band> {
    bands
        .iter()
        .find(|band| band.is_location(location) && band.contains(loa))
}

/// Resolve a query against a set of bands.
pub fn lookup(bands: &[Band], location: &str, loa: f64, operation: Operation) -> LookupOutcome {
    match find_band(bands, location, loa) {
        Some(band) => LookupOutcome::Matched(TugRequirement::from_band(band, operation)),
        None => LookupOutcome::NoMatch,
    }
}

/// Validate raw user input and resolve it against a loaded dataset.
///
/// LOA is checked before location, matching the order the form reports
/// problems in.
pub fn compute_result(
    dataset: &Dataset,
    location: &str,
    loa_text: &str,
    operation: Operation,
) -> Result<LookupOutcome, ValidationError> {
    let loa = parse_finite(loa_text)
        .ok_or_else(|| ValidationError::InvalidLoa(loa_text.to_string()))?;

    let location = location.trim();
    if location.is_empty() {
        return Err(ValidationError::MissingLocation);
    }
    if !dataset.has_location(location) {
        return Err(ValidationError::UnknownLocation(location.to_string()));
    }

    let outcome = lookup(dataset.bands(), location, loa, operation);
    debug!(location, loa, %operation, matched = outcome.is_match(), "Computed tug requirement");
    Ok(outcome)
}
