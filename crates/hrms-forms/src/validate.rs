//! Shared field rules.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10,11}$").expect("mobile regex"));

/// Trimmed value has at least `min` characters.
#[must_use]
pub fn has_min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Trimmed value is non-empty.
#[must_use]
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Loose `local@domain.tld` check.
#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Ten or eleven ASCII digits, nothing else.
#[must_use]
pub fn is_mobile(value: &str) -> bool {
    MOBILE.is_match(value.trim())
}

/// Parse a percentage in `0..=100`.
///
/// # Errors
///
/// Returns a hint when the value is not a number or is out of range.
pub fn percent(value: &str) -> Result<f64, &'static str> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| "Enter a number between 0 and 100")?;
    if parsed.is_finite() && (0.0..=100.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err("Enter a number between 0 and 100")
    }
}

/// Parse a monthly working-day count in `1..=31`.
///
/// # Errors
///
/// Returns a hint when the value is not an integer in range.
pub fn working_days(value: &str) -> Result<u32, &'static str> {
    match value.trim().parse::<u32>() {
        Ok(days) if (1..=31).contains(&days) => Ok(days),
        _ => Err("Working days must be between 1 and 31"),
    }
}

/// Parse a positive amount.
///
/// # Errors
///
/// Returns a hint when the value is not a number above zero.
pub fn positive_amount(value: &str) -> Result<f64, &'static str> {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err("Amount must be greater than 0"),
    }
}

/// Parse a primary key; anything that is not a plain integer yields `None`.
#[must_use]
pub fn parse_id(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Normalise a date to `YYYY-MM-DD`.
///
/// Accepts ISO dates, RFC 3339 timestamps (the date part in the given
/// offset) and `MM/DD/YYYY`. Returns `None` for anything else.
#[must_use]
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|parsed| parsed.date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(value, "%m/%d/%Y").ok())?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_chars_ignores_surrounding_whitespace() {
        assert!(!has_min_chars("  a  ", 2));
        assert!(has_min_chars(" ab ", 2));
        assert!(has_min_chars("\u{e9}\u{e9}", 2));
    }

    #[test]
    fn email_and_mobile_rules() {
        assert!(is_email("priya@example.com"));
        assert!(!is_email("priya@example"));
        assert!(!is_email("pri ya@example.com"));
        assert!(is_mobile("9876543210"));
        assert!(is_mobile("09876543210"));
        assert!(!is_mobile("98765-43210"));
        assert!(!is_mobile("987654321"));
        assert!(!is_mobile("٩٨٧٦٥٤٣٢١٠"));
        assert!(!is_mobile("９８７６５４３２１０"));
    }

    #[test]
    fn numeric_ranges() {
        assert_eq!(percent("40"), Ok(40.0));
        assert!(percent("100.5").is_err());
        assert!(percent("-1").is_err());
        assert!(percent("abc").is_err());
        assert_eq!(working_days("26"), Ok(26));
        assert!(working_days("0").is_err());
        assert!(working_days("32").is_err());
        assert!(positive_amount("0").is_err());
        assert_eq!(positive_amount("1500.50"), Ok(1500.5));
    }

    #[test]
    fn dates_normalise_to_iso() {
        assert_eq!(normalize_date("2024-02-29"), Some("2024-02-29".into()));
        assert_eq!(
            normalize_date("2024-03-01T23:30:00+05:30"),
            Some("2024-03-01".into())
        );
        assert_eq!(normalize_date("03/15/2024"), Some("2024-03-15".into()));
        assert_eq!(normalize_date("2023-02-29"), None);
        assert_eq!(normalize_date("soon"), None);
    }

    #[test]
    fn ids_must_be_plain_integers() {
        assert_eq!(parse_id(" 12 "), Some(12));
        assert_eq!(parse_id("12abc"), None);
        assert_eq!(parse_id(""), None);
    }
}
