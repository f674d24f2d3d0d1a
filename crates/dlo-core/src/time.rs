//! Timestamp conventions for the store.
//!
//! Every instant is persisted as RFC 3339 in UTC with microsecond precision
//! and a `Z` suffix. Because the width is fixed, SQL string comparison
//! (`send_at <= ?`) orders the same way as the instants themselves.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{DloError, Result};

/// Current instant at storage precision, so a value read back compares
/// equal to the one written.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Canonical on-disk form of an instant.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Inverse of [`format_ts`]; accepts any RFC 3339 offset and converts to UTC.
pub fn parse_ts(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Range of years whose RFC 3339 form is four digits wide. Outside it
/// `format_ts` emits a signed, wider year that `parse_ts` rejects and that
/// breaks string ordering.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Accept `ts` only if it survives a `format_ts`/`parse_ts` round trip,
/// truncated to storage precision.
pub fn storable(ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if !STORABLE_YEARS.contains(&ts.year()) {
        return Err(DloError::InvalidTimestamp {
            input: ts.to_rfc3339(),
        });
    }
    Ok(ts.trunc_subsecs(6))
}

/// Parse a user-supplied send time.
///
/// Input carrying an offset is converted to UTC. Input without one (what a
/// browser `datetime-local` field sends) is taken as UTC wall-clock time
/// with no zone conversion.
pub fn parse_local_as_utc(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = parse_ts(trimmed) {
        return storable(dt).map_err(|_| DloError::InvalidTimestamp {
            input: input.to_string(),
        });
    }
    let naive = trimmed
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| DloError::InvalidTimestamp {
            input: input.to_string(),
        })?;
    storable(naive.and_utc()).map_err(|_| DloError::InvalidTimestamp {
        input: input.to_string(),
    })
}

/// Parse a `YYYY-MM-DD` delivery date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| DloError::InvalidDate {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let b = a + Duration::microseconds(1);
        let c = a + Duration::days(400);
        assert!(format_ts(a) < format_ts(b));
        assert!(format_ts(b) < format_ts(c));
        assert!(format_ts(a).ends_with('Z'));
    }

    #[test]
    fn format_parse_is_lossless_to_the_microsecond() {
        let t = Utc.with_ymd_and_hms(2030, 6, 15, 12, 30, 45).unwrap() + Duration::microseconds(123);
        assert_eq!(parse_ts(&format_ts(t)).unwrap(), t);
    }

    #[test]
    fn now_survives_a_round_trip() {
        let t = now();
        assert_eq!(parse_ts(&format_ts(t)).unwrap(), t);
    }

    #[test]
    fn naive_input_is_treated_as_utc() {
        let expected = Utc.with_ymd_and_hms(2031, 2, 3, 4, 5, 0).unwrap();
        assert_eq!(parse_local_as_utc("2031-02-03T04:05").unwrap(), expected);
        assert_eq!(parse_local_as_utc("2031-02-03 04:05").unwrap(), expected);
        assert_eq!(parse_local_as_utc("2031-02-03T04:05:00").unwrap(), expected);
    }

    #[test]
    fn offset_input_is_normalised_to_utc() {
        let dt = parse_local_as_utc("2031-02-03T06:05:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2031, 2, 3, 4, 5, 0).unwrap());
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = parse_local_as_utc("tomorrow-ish").unwrap_err();
        assert_eq!(err.code(), "INVALID_TIMESTAMP");
    }

    #[test]
    fn instants_past_year_9999_are_rejected() {
        // Still year 9999 locally, year 10000 once converted to UTC.
        let err = parse_local_as_utc("9999-12-31T23:59:59-05:00").unwrap_err();
        assert_eq!(err.code(), "INVALID_TIMESTAMP");

        let last = parse_local_as_utc("9999-12-31T23:59:59Z").unwrap();
        assert_eq!(parse_ts(&format_ts(last)).unwrap(), last);
    }

    #[test]
    fn storable_checks_range_and_truncates() {
        let far = Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap() + Duration::days(1);
        assert!(storable(far).is_err());

        let t = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::nanoseconds(1_234_567);
        let stored = storable(t).unwrap();
        assert_eq!(stored, t - Duration::nanoseconds(567));
        assert_eq!(parse_ts(&format_ts(stored)).unwrap(), stored);
    }

    #[test]
    fn delivery_date_parsing() {
        assert_eq!(
            parse_date("2025-12-24").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 24).unwrap()
        );
        assert!(parse_date("24/12/2025").is_err());
    }
}
