use std::cmp::Ordering;

/// Placeholder shown for empty text fields.
const EMPTY_PLACEHOLDER: &str = "—";

/// Parse trimmed text as a finite decimal number.
/// Returns `None` for empty, non-numeric, infinite or NaN input.
pub fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Unparseable numeric field defaults to zero.
///
/// The reference table is hand-edited, so a stray word in a numeric cell
/// keeps the row with a `0` rather than rejecting it.
pub fn parse_number_or_zero(text: &str) -> f64 {
    parse_finite(text).unwrap_or(0.0)
}

/// Magnitudes outside `[EXPONENT_BELOW, EXPONENT_FROM)` use exponent notation
const EXPONENT_BELOW: f64 = 1e-6;
const EXPONENT_FROM: f64 = 1e21;

/// Shortest rendering of a length, as a browser prints numbers: `50`,
/// `62.5`, `1e-7`, `1e+21`. Negative zero prints as `0`.
pub fn format_length(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let magnitude = value.abs();
    if magnitude == 0.0 || (EXPONENT_BELOW..EXPONENT_FROM).contains(&magnitude) {
        return format!("{}", value);
    }

    let text = format!("{:e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

/// Return the text, or a dash when it is blank.
pub fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        text
    }
}

/// Case-insensitive ordering with a case-sensitive tie-break, so the result
/// is total and stable.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_finite() {
        assert_eq!(parse_finite(" 42 "), Some(42.0));
        assert_eq!(parse_finite("62.5"), Some(62.5));
        assert_eq!(parse_finite("1e2"), Some(100.0));
        assert_eq!(parse_finite(""), None);
        assert_eq!(parse_finite("abc"), None);
        assert_eq!(parse_finite("inf"), None);
        assert_eq!(parse_finite("NaN"), None);
    }

    #[test]
    fn test_parse_number_or_zero() {
        assert_eq!(parse_number_or_zero("3"), 3.0);
        assert_eq!(parse_number_or_zero("three"), 0.0);
        assert_eq!(parse_number_or_zero(""), 0.0);
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(50.0), "50");
        assert_eq!(format_length(62.5), "62.5");
        assert_eq!(format_length(0.0), "0");
        assert_eq!(format_length(-0.0), "0");
        assert_eq!(format_length(-12.5), "-12.5");
        assert_eq!(format_length(0.000001), "0.000001");
        assert_eq!(format_length(1e-7), "1e-7");
        assert_eq!(format_length(1.5e-7), "1.5e-7");
        assert_eq!(format_length(1e21), "1e+21");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash("Pilot on board"), "Pilot on board");
        assert_eq!(or_dash("   "), "—");
        assert_eq!(or_dash(""), "—");
    }

    #[test]
    fn test_cmp_ignore_case() {
        let mut names = vec!["port b", "Port A", "alpha", "Port a"];
        names.sort_by(|a, b| cmp_ignore_case(a, b));
        assert_eq!(names, vec!["alpha", "Port A", "Port a", "port b"]);
    }
}
