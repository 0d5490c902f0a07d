//! Free-text delivery phrases ("Monday, July 15") to calendar dates.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

static DELIVERY_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\w+day,?\s+)?(\w+\s+\d{1,2})").expect("delivery phrase pattern is valid")
});

static WEEKDAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\w+day,?\s+").expect("weekday prefix pattern is valid"));

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:\D|$)").expect("month/day pattern is valid")
});

/// Returns the first date-shaped fragment of a delivery message, if any.
///
/// Only the first fragment is considered; it may still fail to normalize.
pub fn find_delivery_phrase(text: &str) -> Option<&str> {
    DELIVERY_PHRASE.find(text).map(|m| m.as_str())
}

/// Resolves `"<Weekday>, <Month> <day>"` against `reference`.
///
/// The reference year is tried first; a date that is invalid in that year or
/// already in the past rolls over to the following year.
pub fn normalize_delivery_date(phrase: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let cleaned = WEEKDAY_PREFIX.replace(phrase.trim(), "");
    let captures = MONTH_DAY.captures(cleaned.trim())?;
    let month = month_from_name(&captures[1])?;
    let day: u32 = captures[2].parse().ok()?;

    match NaiveDate::from_ymd_opt(reference.year(), month, day) {
        Some(date) if date >= reference => Some(date),
        _ => NaiveDate::from_ymd_opt(reference.year() + 1, month, day),
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn future_date_stays_in_reference_year() {
        assert_eq!(
            normalize_delivery_date("Monday, July 15", date(2024, 1, 1)),
            Some(date(2024, 7, 15))
        );
    }

    #[test]
    fn past_date_rolls_into_next_year() {
        assert_eq!(
            normalize_delivery_date("Monday, July 15", date(2024, 8, 1)),
            Some(date(2025, 7, 15))
        );
    }

    #[test]
    fn same_day_is_not_in_the_past() {
        assert_eq!(
            normalize_delivery_date("July 15", date(2024, 7, 15)),
            Some(date(2024, 7, 15))
        );
    }

    #[test]
    fn accepts_abbreviations_without_weekday() {
        assert_eq!(
            normalize_delivery_date("Sept 3", date(2024, 1, 1)),
            Some(date(2024, 9, 3))
        );
        assert_eq!(
            normalize_delivery_date("tuesday dec 31", date(2024, 12, 30)),
            Some(date(2024, 12, 31))
        );
    }

    #[test]
    fn leap_day_rolls_to_next_valid_year() {
        assert_eq!(
            normalize_delivery_date("February 29", date(2027, 1, 10)),
            Some(date(2028, 2, 29))
        );
        assert_eq!(normalize_delivery_date("February 29", date(2025, 1, 10)), None);
    }

    #[test]
    fn unparseable_phrases_yield_none() {
        let reference = date(2024, 1, 1);
        assert_eq!(normalize_delivery_date("in 2", reference), None);
        assert_eq!(normalize_delivery_date("Smarch 4", reference), None);
        assert_eq!(normalize_delivery_date("July 45", reference), None);
        assert_eq!(normalize_delivery_date("", reference), None);
    }

    #[test]
    fn finds_first_date_shaped_fragment() {
        assert_eq!(
            find_delivery_phrase("FREE delivery Monday, July 15. Order within 3 hrs"),
            Some("Monday, July 15")
        );
        assert_eq!(find_delivery_phrase("Arrives in 2 days"), Some("in 2"));
        assert_eq!(find_delivery_phrase("Ships soon"), None);
    }
}
