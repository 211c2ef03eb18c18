use serde::{Deserialize, Serialize};

use super::Operation;
use crate::utils::format_length;

/// One LOA band of the reference table for a single location.
///
/// Bounds are inclusive on both ends. Tug counts are kept exactly as read
/// (possibly fractional); rounding happens at lookup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Band {
    pub location: String,
    pub min_length: f64,
    pub max_length: f64,
    pub berthing_tugs: f64,
    pub berthing_rule: String,
    pub unberthing_tugs: f64,
    pub unberthing_rule: String,
    pub additional_notes: String,
}

impl Band {
    /// Case-insensitive location comparison.
    pub fn is_location(&self, location: &str) -> bool {
        self.location.to_lowercase() == location.to_lowercase()
    }

    /// True when `loa` falls within `[min_length, max_length]`.
    pub fn contains(&self, loa: f64) -> bool {
        loa >= self.min_length && loa <= self.max_length
    }

    /// Raw (unrounded) tug count for the given operation.
    pub fn raw_tugs(&self, operation: Operation) -> f64 {
        match operation {
            Operation::Berthing => self.berthing_tugs,
            Operation::Unberthing => self.unberthing_tugs,
        }
    }

    pub fn rule(&self, operation: Operation) -> &str {
        match operation {
            Operation::Berthing => &self.berthing_rule,
            Operation::Unberthing => &self.unberthing_rule,
        }
    }

    /// Display label using the original bounds, e.g. `50–100 m`.
    pub fn label(&self) -> String {
        format!(
            "{}–{} m",
            format_length(self.min_length),
            format_length(self.max_length)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: f64, max: f64) -> Band {
        Band {
            location: "Fairport".to_string(),
            min_length: min,
            max_length: max,
            berthing_tugs: 2.0,
            berthing_rule: "Two tugs forward".to_string(),
            unberthing_tugs: 1.5,
            unberthing_rule: String::new(),
            additional_notes: String::new(),
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = band(50.0, 100.0);
        assert!(b.contains(50.0));
        assert!(b.contains(100.0));
        assert!(b.contains(75.0));
        assert!(!b.contains(49.99));
        assert!(!b.contains(100.01));
    }

    #[test]
    fn test_is_location_ignores_case() {
        let b = band(0.0, 10.0);
        assert!(b.is_location("fairport"));
        assert!(b.is_location("FAIRPORT"));
        assert!(!b.is_location("Fairport East"));
    }

    #[test]
    fn test_label_keeps_fractional_bounds() {
        assert_eq!(band(50.0, 100.0).label(), "50–100 m");
        assert_eq!(band(100.5, 150.25).label(), "100.5–150.25 m");
        assert_eq!(band(-0.0, 100.0).label(), "0–100 m");
    }

    #[test]
    fn test_operation_selects_columns() {
        let b = band(0.0, 10.0);
        assert_eq!(b.raw_tugs(Operation::Berthing), 2.0);
        assert_eq!(b.raw_tugs(Operation::Unberthing), 1.5);
        assert_eq!(b.rule(Operation::Berthing), "Two tugs forward");
        assert_eq!(b.rule(Operation::Unberthing), "");
    }
}
