use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{split_rows, ColumnMap, ParseError};
use crate::models::Band;
use crate::utils::{cmp_ignore_case, parse_number_or_zero};

/// Parse raw table text into bands, preserving table order.
pub fn parse_bands(text: &str) -> Result<Vec<Band>, ParseError> {
    let rows = split_rows(text);
    if rows.len() < 2 {
        return Err(ParseError::Empty);
    }

    let columns = ColumnMap::resolve(&rows[0])?;

    let bands: Vec<Band> = rows[1..]
        .iter()
        .map(|row| band_from_row(&columns, row))
        .filter(|band| !band.location.is_empty())
        .collect();

    debug!(
        rows = rows.len() - 1,
        bands = bands.len(),
        discarded = rows.len() - 1 - bands.len(),
        "Parsed tug requirement table"
    );

    Ok(bands)
}

fn band_from_row(columns: &ColumnMap, row: &[String]) -> Band {
    let text = |index: usize| ColumnMap::cell(row, Some(index));
    let optional = |index: Option<usize>| ColumnMap::cell(row, index).to_string();

    Band {
        location: text(columns.location).to_string(),
        min_length: parse_number_or_zero(text(columns.min_length)),
        max_length: parse_number_or_zero(text(columns.max_length)),
        berthing_tugs: parse_number_or_zero(text(columns.berthing_tugs)),
        berthing_rule: optional(columns.berthing_rule),
        unberthing_tugs: parse_number_or_zero(text(columns.unberthing_tugs)),
        unberthing_rule: optional(columns.unberthing_rule),
        additional_notes: optional(columns.notes),
    }
}

/// Immutable snapshot of the reference table.
///
/// Built once per load and replaced wholesale on reload. Lookups only read
/// from it, so it can be shared freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    bands: Vec<Band>,
    locations: Vec<String>,
}

impl Dataset {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self::from_bands(parse_bands(text)?))
    }

    pub fn from_bands(bands: Vec<Band>) -> Self {
        let mut locations: Vec<String> = Vec::new();
        for band in &bands {
            if !locations.contains(&band.location) {
                locations.push(band.location.clone());
            }
        }
        locations.sort_by(|a, b| cmp_ignore_case(a, b));

        Self { bands, locations }
    }

    /// Bands in original table order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Distinct locations, sorted for selection.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Case-insensitive membership check against the known locations.
    pub fn has_location(&self, location: &str) -> bool {
        let wanted = location.to_lowercase();
        self.locations.iter().any(|l| l.to_lowercase() == wanted)
    }
}
