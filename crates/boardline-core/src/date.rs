//! Calendar date helpers shared by extraction, layout and drag handling.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::error::DecodeError;

/// Start/end pair of a task. Either side may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// First day (inclusive).
    #[serde(with = "crate::iso_date::option", default)]
    pub start: Option<Date>,
    /// Last day (inclusive).
    #[serde(with = "crate::iso_date::option", default)]
    pub end: Option<Date>,
}

impl DateRange {
    /// Range with neither side set.
    pub const EMPTY: Self = Self {
        start: None,
        end: None,
    };

    /// Range with both sides set.
    #[must_use]
    pub const fn new(start: Date, end: Date) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Range covering a single day.
    #[must_use]
    pub const fn single(day: Date) -> Self {
        Self::new(day, day)
    }

    /// True when both sides are missing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both sides, when both are present.
    #[must_use]
    pub const fn bounds(&self) -> Option<(Date, Date)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Parse a `YYYY-MM-DD` date. Trailing time components are ignored.
///
/// # Errors
/// Returns [`DecodeError::InvalidDate`] when the leading ten characters are not a date.
pub fn parse_date(raw: &str) -> Result<Date, DecodeError> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(head, format_description!("[year]-[month]-[day]")).map_err(|_| {
        DecodeError::InvalidDate {
            raw: trimmed.to_owned(),
        }
    })
}

/// Parse an RFC 3339 timestamp down to its calendar date, falling back to a bare date.
///
/// # Errors
/// Returns [`DecodeError::InvalidDate`] when neither form parses.
pub fn parse_timestamp_date(raw: &str) -> Result<Date, DecodeError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_or_else(|_| parse_date(raw), |ts| Ok(ts.date()))
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
#[must_use]
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).whole_days()
}

/// Widest day offset between two representable dates, with some slack.
const MAX_SHIFT_DAYS: i64 = 8_000_000;

/// Shift a date by whole days, saturating at the representable range.
#[must_use]
pub fn shift(date: Date, days: i64) -> Date {
    let days = days.clamp(-MAX_SHIFT_DAYS, MAX_SHIFT_DAYS);
    date.checked_add(Duration::days(days)).unwrap_or(if days < 0 {
        Date::MIN
    } else {
        Date::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_plain_and_datetime_strings() {
        assert_eq!(parse_date("2024-01-10").ok(), Some(date!(2024 - 01 - 10)));
        assert_eq!(parse_date(" 2024-01-10 09:30:00 ").ok(), Some(date!(2024 - 01 - 10)));
        assert!(parse_date("10/01/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        assert_eq!(
            parse_timestamp_date("2024-03-05T23:10:00Z").ok(),
            Some(date!(2024 - 03 - 05))
        );
        assert_eq!(parse_timestamp_date("2024-03-05").ok(), Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn day_arithmetic() {
        assert_eq!(days_between(date!(2024 - 02 - 28), date!(2024 - 03 - 01)), 2);
        assert_eq!(days_between(date!(2024 - 03 - 01), date!(2024 - 02 - 28)), -2);
        assert_eq!(shift(date!(2024 - 03 - 01), -7), date!(2024 - 02 - 23));
        assert_eq!(shift(Date::MAX, 1), Date::MAX);
        assert_eq!(shift(date!(2024 - 01 - 01), i64::MAX), Date::MAX);
        assert_eq!(shift(date!(2024 - 01 - 01), i64::MIN), Date::MIN);
    }

    #[test]
    fn range_serializes_iso_dates() {
        let range = DateRange {
            start: Some(date!(2024 - 01 - 10)),
            end: None,
        };
        let json = serde_json::to_string(&range).unwrap_or_else(|err| panic!("serialize: {err}"));
        assert_eq!(json, r#"{"start":"2024-01-10","end":null}"#);
    }
}
