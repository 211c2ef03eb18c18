use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Band;

/// The two harbour operations a tug requirement is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Operation {
    #[default]
    Berthing,
    Unberthing,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Berthing => write!(f, "Berthing"),
            Operation::Unberthing => write!(f, "Unberthing"),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "berthing" | "berth" => Ok(Operation::Berthing),
            "unberthing" | "unberth" => Ok(Operation::Unberthing),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// Resolved requirement for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TugRequirement {
    pub tugs_required: i64,
    pub band_label: String,
    pub rule_text: String,
    pub notes_text: String,
}

impl TugRequirement {
    pub fn from_band(band: &Band, operation: Operation) -> Self {
        Self {
            tugs_required: round_up_tugs(band.raw_tugs(operation)),
            band_label: band.label(),
            rule_text: band.rule(operation).to_string(),
            notes_text: band.additional_notes.clone(),
        }
    }
}

/// A well-formed query either hits a band or it doesn't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    Matched(TugRequirement),
    NoMatch,
}

impl LookupOutcome {
    pub fn requirement(&self) -> Option<&TugRequirement> {
        match self {
            LookupOutcome::Matched(req) => Some(req),
            LookupOutcome::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, LookupOutcome::Matched(_))
    }
}

/// Partial tugs cannot be dispatched: round the raw requirement up.
pub fn round_up_tugs(raw: f64) -> i64 {
    raw.ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_tugs() {
        assert_eq!(round_up_tugs(2.0), 2);
        assert_eq!(round_up_tugs(2.01), 3);
        assert_eq!(round_up_tugs(2.1), 3);
        assert_eq!(round_up_tugs(0.0), 0);
        assert_eq!(round_up_tugs(0.3), 1);
    }

    #[test]
    fn test_round_up_never_undershoots() {
        for tenths in 0..100 {
            let raw = tenths as f64 / 10.0;
            let rounded = round_up_tugs(raw) as f64;
            assert!(rounded >= raw);
            assert!(rounded - raw < 1.0);
        }
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!("Berthing".parse::<Operation>(), Ok(Operation::Berthing));
        assert_eq!(" unberth ".parse::<Operation>(), Ok(Operation::Unberthing));
        assert!("towing".parse::<Operation>().is_err());
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_string(&LookupOutcome::NoMatch).unwrap();
        assert_eq!(json, r#"{"outcome":"no_match"}"#);
    }
}
