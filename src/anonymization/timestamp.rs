//! Fixed-width digit representation of timestamps
//!
//! Shuffling and anonymizing a timestamp both go through the 14-digit
//! `YYYYMMDDHHMMSS` form. Digit strings produced that way are frequently out of
//! range (month 00, day 99, hour 87). They are not rejected: each component
//! overflows into the next larger one.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Months, TimeZone};

/// chrono format of the digit representation
pub const DIGIT_FORMAT: &str = "%Y%m%d%H%M%S";

/// Number of digits in the digit representation
pub const DIGIT_COUNT: usize = 14;

/// Template whose characters are replaced one by one when anonymizing a
/// timestamp. Only its length matters; the original value is never consulted.
pub const ANONYMIZE_TEMPLATE: &str = "YYYYmmddHHiiss";

/// Formats a timestamp as `YYYYMMDDHHMMSS`
pub fn to_digits(value: &NaiveDateTime) -> String {
    value.format(DIGIT_FORMAT).to_string()
}

/// Parses a `YYYYMMDDHHMMSS` digit string, rolling over out-of-range fields
///
/// Returns `None` when the input is not exactly 14 ASCII digits or the result
/// is outside chrono's representable range.
///
/// # Examples
///
/// ```
/// use anonymizer::anonymization::timestamp::from_digits;
///
/// // Month 13 rolls into January of the following year
/// let ts = from_digits("20231305000000").unwrap();
/// assert_eq!(ts.to_string(), "2024-01-05 00:00:00");
/// ```
pub fn from_digits(digits: &str) -> Option<NaiveDateTime> {
    if digits.len() != DIGIT_COUNT || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let field = |start: usize, end: usize| -> Option<i64> { digits[start..end].parse().ok() };
    let year = field(0, 4)? as i32;
    let month = field(4, 6)?;
    let day = field(6, 8)?;
    let hour = field(8, 10)?;
    let minute = field(10, 12)?;
    let second = field(12, 14)?;

    let january_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let months_offset = month - 1;
    let date = if months_offset >= 0 {
        january_first.checked_add_months(Months::new(months_offset as u32))?
    } else {
        january_first.checked_sub_months(Months::new(months_offset.unsigned_abs() as u32))?
    };
    let date = date.checked_add_signed(Duration::days(day - 1))?;

    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::hours(hour))?
        .checked_add_signed(Duration::minutes(minute))?
        .checked_add_signed(Duration::seconds(second))
}

/// Parses an absolute timestamp literal from configuration
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (both with optional
/// fractional seconds), a bare `YYYY-MM-DD` (midnight) and RFC 3339 with an
/// offset, which is converted to local wall-clock time.
pub fn parse_literal(literal: &str) -> Option<NaiveDateTime> {
    let literal = literal.trim();

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(literal, format) {
            return Some(ts);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(literal, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    chrono::DateTime::parse_from_rfc3339(literal)
        .ok()
        .map(|ts| Local.from_utc_datetime(&ts.naive_utc()).naive_local())
}
