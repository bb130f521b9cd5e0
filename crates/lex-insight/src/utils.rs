//! Shared utilities for the insight pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// First signed decimal number appearing anywhere in a string.
static EMBEDDED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number pattern"));

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Parse a cell that may carry currency, percent or thousands formatting.
///
/// Used for cells of narrative tables, where "45%" and "$1,200" are numbers.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    parse_plain_number(&clean_numeric_string(s))
}

/// Parse a bare number, as a spreadsheet or CSV cell would hold it.
///
/// No formatting characters are stripped. Non-finite spellings such as
/// "NaN" or "inf" are rejected so they never enter a numeric view.
pub fn parse_plain_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extract the first number embedded in a string ("approx. 45 units" gives 45).
pub fn extract_embedded_number(s: &str) -> Option<f64> {
    let cleaned = s.replace([',', '$', '€', '£'], "");
    EMBEDDED_NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Loose check for values that look numeric once separators and signs are
/// removed ("1.234.567", "12-34"). Used to flag text columns that were
/// probably meant to be numbers.
pub fn looks_numeric(s: &str) -> bool {
    let stripped: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '-' | ' '))
        .collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Format a value for a chart label: integers get thousands separators,
/// anything else gets one decimal.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(format_value(1234567.0), "1,234,567");
/// assert_eq!(format_value(12.34), "12.3");
/// ```
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        group_thousands(&format!("{}", value as i64))
    } else {
        let formatted = format!("{:.1}", value);
        match formatted.split_once('.') {
            Some((int_part, frac)) => format!("{}.{}", group_thousands(int_part), frac),
            None => formatted,
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{}{}", sign, out)
}

/// Truncate a label to `max_chars` characters, appending "..." when cut.
pub fn truncate_label(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Percentage of `part` in `whole`, 0.0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
        assert_eq!(clean_numeric_string("1 000"), "1000");
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("35.5%"), Some(35.5));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("Norte"), None);
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_plain_number(" 7.5 "), Some(7.5));
        assert_eq!(parse_plain_number("1e3"), Some(1000.0));
        assert_eq!(parse_plain_number("1,000"), None);
        assert_eq!(parse_plain_number("NaN"), None);
        assert_eq!(parse_plain_number("inf"), None);
    }

    #[test]
    fn test_extract_embedded_number() {
        assert_eq!(extract_embedded_number("approx. 45 units"), Some(45.0));
        assert_eq!(extract_embedded_number("$1,200.50 total"), Some(1200.5));
        assert_eq!(extract_embedded_number("-3 pts"), Some(-3.0));
        assert_eq!(extract_embedded_number("none"), None);
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("1.234.567"));
        assert!(looks_numeric("2024-01"));
        assert!(!looks_numeric("12a"));
        assert!(!looks_numeric(" - "));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(999.0), "999");
        assert_eq!(format_value(1234567.0), "1,234,567");
        assert_eq!(format_value(-4500.0), "-4,500");
        assert_eq!(format_value(12.34), "12.3");
        assert_eq!(format_value(12345.67), "12,345.7");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_round_to_and_percentage() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }
}
