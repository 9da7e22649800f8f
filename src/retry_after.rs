//! `Retry-After` header parsing (RFC 7231 §7.1.3).

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::{Error, Result};

/// Parse a `Retry-After` value into the instant after which a retry is allowed.
///
/// The value is either an HTTP-date or a non-negative number of seconds,
/// counted from now.
pub fn parse_retry_after(value: &str) -> Result<DateTime<Utc>> {
    parse_retry_after_at(value, Utc::now())
}

/// [`parse_retry_after`] with an explicit clock.
pub fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::IsEmpty);
    }

    if let Ok(seconds) = value.parse::<i64>() {
        if seconds < 0 {
            return Err(Error::IsNegative);
        }
        let delay = TimeDelta::try_seconds(seconds)
            .ok_or_else(|| Error::InvalidRetryAfter(value.to_owned()))?;
        return now
            .checked_add_signed(delay)
            .ok_or_else(|| Error::InvalidRetryAfter(value.to_owned()));
    }

    parse_http_date(value).ok_or_else(|| Error::InvalidRetryAfter(value.to_owned()))
}

/// IMF-fixdate, then the obsolete RFC 850 and asctime forms.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
