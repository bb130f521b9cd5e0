//! Type inference logic for column analysis.
//!
//! Inference always starts from the raw cell text, never from a previous
//! typed view, so running it twice over the same column gives the same view.

use crate::config::InsightConfig;
use crate::utils::parse_plain_number;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::table::{Column, ColumnView};

// Shapes worth handing to the date parser - compiled once at startup
static DATE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/.]\d{1,2}[-/.]\d{1,2}").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}").expect("Invalid regex: DD-MM-YYYY"),
        Regex::new(r"^\d{1,2} [A-Za-z]{3,9}\.? \d{4}").expect("Invalid regex: DD Mon YYYY"),
        Regex::new(r"^[A-Za-z]{3,9}\.? \d{1,2},? \d{4}").expect("Invalid regex: Mon DD YYYY"),
    ]
});

/// Formats carrying a time of day, day-first before month-first.
const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only formats, day-first before month-first. Two-digit years come
/// before four-digit ones so "1/3/24" is not read as the year 24.
const DATE_FORMATS: [&str; 17] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
];

/// Column-local type inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeInference {
    numeric_ratio: f64,
    datetime_ratio: f64,
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::from_config(&InsightConfig::default())
    }
}

impl TypeInference {
    /// Create an inference pass with explicit promotion ratios.
    ///
    /// A column is promoted when the share of parsed values among its
    /// non-missing cells is strictly greater than the ratio.
    pub fn new(numeric_ratio: f64, datetime_ratio: f64) -> Self {
        Self {
            numeric_ratio,
            datetime_ratio,
        }
    }

    pub fn from_config(config: &InsightConfig) -> Self {
        Self::new(config.numeric_promotion_ratio, config.datetime_promotion_ratio)
    }

    /// Infer the typed view of a column from its raw cells.
    ///
    /// Numeric coercion is tried first and, with the default ratio, any
    /// parsed value promotes the column. Datetime coercion only runs on
    /// columns that stayed text.
    pub fn infer(&self, raw: &[Option<String>]) -> ColumnView {
        let present = raw.iter().flatten().count();
        if present == 0 {
            return ColumnView::Empty;
        }

        let numbers: Vec<Option<f64>> = raw
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_plain_number))
            .collect();
        if promotes(numbers.iter().flatten().count(), present, self.numeric_ratio) {
            return ColumnView::Numeric(numbers);
        }

        let dates: Vec<Option<NaiveDateTime>> = raw
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_day_first_datetime))
            .collect();
        if promotes(dates.iter().flatten().count(), present, self.datetime_ratio) {
            return ColumnView::Datetime(dates);
        }

        ColumnView::Text
    }

    /// Build a typed column from a name and raw cells.
    pub fn column(&self, name: impl Into<String>, raw: Vec<Option<String>>) -> Column {
        let view = self.infer(&raw);
        Column::new(name, raw, view)
    }

    /// Re-run inference over an existing column.
    pub fn reinfer(&self, column: &Column) -> Column {
        self.column(column.name(), column.raw().to_vec())
    }
}

fn promotes(parsed: usize, present: usize, ratio: f64) -> bool {
    parsed > 0 && parsed as f64 > present as f64 * ratio
}

/// Parse a date or datetime, preferring day-before-month when ambiguous.
///
/// Accepts ISO forms (with or without a time or offset), day-first numeric
/// forms with `/`, `-` or `.` separators, and written month names. Month-first
/// is only used when the day-first reading is impossible ("12/31/2024").
pub fn parse_day_first_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() || !DATE_SHAPES.iter().any(|re| re.is_match(value)) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    // chrono reads "%Y" from as few as one digit, so year-first formats
    // only apply to values that open with a four-digit year
    let year_first = value.len() >= 4 && value.as_bytes()[..4].iter().all(u8::is_ascii_digit);
    let applies = |fmt: &&&str| fmt.starts_with("%Y") == year_first;

    DATETIME_FORMATS
        .iter()
        .filter(applies)
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .filter(applies)
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // ==================== infer() tests ====================

    #[test]
    fn test_infer_all_missing_is_empty() {
        let inference = TypeInference::default();
        assert_eq!(inference.infer(&cells(&["", ""])), ColumnView::Empty);
    }

    #[test]
    fn test_infer_numeric_keeps_uncoercible_as_missing() {
        let inference = TypeInference::default();
        let view = inference.infer(&cells(&["10", "20.5", "n/a", ""]));
        assert_eq!(
            view,
            ColumnView::Numeric(vec![Some(10.0), Some(20.5), None, None])
        );
    }

    #[test]
    fn test_infer_any_number_promotes_by_default() {
        let inference = TypeInference::default();
        let view = inference.infer(&cells(&["1", "x", "y"]));
        assert_eq!(view, ColumnView::Numeric(vec![Some(1.0), None, None]));
    }

    #[test]
    fn test_infer_without_numbers_stays_text() {
        let inference = TypeInference::default();
        assert_eq!(inference.infer(&cells(&["Norte", "Sur", ""])), ColumnView::Text);
    }

    #[test]
    fn test_infer_majority_ratio_keeps_minority_as_text() {
        let inference = TypeInference::new(0.5, 0.5);
        let view = inference.infer(&cells(&["Norte", "Sur", "Este", "4"]));
        assert_eq!(view, ColumnView::Text);
    }

    #[test]
    fn test_infer_day_first_dates() {
        let inference = TypeInference::default();
        let view = inference.infer(&cells(&["01/02/2024", "15/02/2024", "oops"]));
        assert_eq!(
            view,
            ColumnView::Datetime(vec![Some(ymd(2024, 2, 1)), Some(ymd(2024, 2, 15)), None])
        );
    }

    #[test]
    fn test_infer_dates_need_majority() {
        let inference = TypeInference::default();
        let view = inference.infer(&cells(&["2024-01-01", "later", "soon"]));
        assert_eq!(view, ColumnView::Text);
    }

    #[test]
    fn test_inference_is_idempotent() {
        let inference = TypeInference::default();
        for raw in [
            cells(&["1", "2", "x"]),
            cells(&["2024-01-01", "02/01/2024"]),
            cells(&["a", "b"]),
            cells(&["", ""]),
        ] {
            let once = inference.column("c", raw);
            let twice = inference.reinfer(&once);
            assert_eq!(once, twice);
        }
    }

    // ==================== parse_day_first_datetime() tests ====================

    #[test]
    fn test_parse_iso_forms() {
        assert_eq!(parse_day_first_datetime("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(
            parse_day_first_datetime("2024-03-05 14:30:00"),
            ymd(2024, 3, 5).date().and_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_day_first_datetime("2024-03-05T14:30:00Z"),
            ymd(2024, 3, 5).date().and_hms_opt(14, 30, 0)
        );
    }

    #[test]
    fn test_parse_prefers_day_first() {
        assert_eq!(parse_day_first_datetime("03/05/2024"), Some(ymd(2024, 5, 3)));
        assert_eq!(parse_day_first_datetime("03.05.2024"), Some(ymd(2024, 5, 3)));
        assert_eq!(parse_day_first_datetime("1/3/24"), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_parse_falls_back_to_month_first() {
        assert_eq!(parse_day_first_datetime("12/31/2024"), Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_parse_month_names() {
        assert_eq!(parse_day_first_datetime("5 Mar 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_day_first_datetime("March 5, 2024"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_parse_rejects_non_dates() {
        assert_eq!(parse_day_first_datetime("Norte"), None);
        assert_eq!(parse_day_first_datetime("42"), None);
        assert_eq!(parse_day_first_datetime("32/13/2024"), None);
    }
}
