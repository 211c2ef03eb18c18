//! Utility functions for string formatting and number parsing.

pub mod format;

pub use format::{cmp_ignore_case, format_length, or_dash, parse_number_or_zero, parse_finite};
