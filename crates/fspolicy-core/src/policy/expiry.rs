//! Expiry coercion: turn a caller-supplied value into an absolute instant.
//!
//! Tried in order:
//! 1. UTC instant, used as-is.
//! 2. Offset instant, converted to the same UTC point.
//! 3. Non-negative number (or numeric string), read as Unix epoch seconds.
//! 4. Anything else goes through the date/time string parser.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{PolicyError, Result};

use super::option::OptionValue;

/// Zone-less layouts accepted by the parser, read as UTC.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub(crate) fn coerce_expiry(value: &OptionValue) -> Result<DateTime<Utc>> {
    match value {
        OptionValue::Instant(t) => Ok(*t),
        OptionValue::ZonedInstant(t) => Ok(t.with_timezone(&Utc)),
        OptionValue::Integer(n) if *n >= 0 => from_epoch_secs(*n),
        OptionValue::Integer(n) => parse_datetime(&n.to_string()),
        OptionValue::Text(s) => match numeric(s) {
            Some(secs) => from_epoch_secs(secs),
            None => parse_datetime(s),
        },
        OptionValue::Json(Value::Number(n)) => match n.as_f64() {
            Some(f) if f >= 0.0 => from_epoch_secs(f.trunc() as i64),
            _ => parse_datetime(&n.to_string()),
        },
        OptionValue::List(_) | OptionValue::Json(_) => Err(PolicyError::expiry(
            "must be an instant, a unix timestamp, or a parseable date/time string",
        )),
    }
}

/// Non-negative numeric strings count as timestamps (`"1525500000"`).
fn numeric(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return (n >= 0).then_some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f.trunc() as i64),
        _ => None,
    }
}

fn from_epoch_secs(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| PolicyError::expiry("unknown issue parsing datetime"))
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();

    if let Some(secs) = s.strip_prefix('@') {
        return match secs.parse::<i64>() {
            Ok(n) => from_epoch_secs(n),
            Err(_) => Err(PolicyError::expiry(format!("invalid timestamp \"{raw}\""))),
        };
    }

    let err = match DateTime::parse_from_rfc3339(s) {
        Ok(t) => return Ok(t.with_timezone(&Utc)),
        Err(e) => e,
    };
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| PolicyError::expiry("unknown issue parsing datetime"));
    }

    Err(PolicyError::InvalidExpiry {
        reason: format!("could not parse \"{raw}\" as a date/time"),
        source: Some(err),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::error::Error as _;

    use chrono::FixedOffset;

    use super::*;
    use crate::error::ErrorKind;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn instants_pass_through() {
        let t = at(1_525_500_000);
        assert_eq!(coerce_expiry(&OptionValue::Instant(t)).unwrap(), t);

        let zoned = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2018, 5, 5, 8, 0, 0)
            .unwrap();
        assert_eq!(
            coerce_expiry(&OptionValue::ZonedInstant(zoned)).unwrap(),
            at(1_525_500_000)
        );
    }

    #[test]
    fn numbers_and_numeric_strings_are_epoch_seconds() {
        assert_eq!(coerce_expiry(&1_525_500_000i64.into()).unwrap(), at(1_525_500_000));
        assert_eq!(coerce_expiry(&"1525500000".into()).unwrap(), at(1_525_500_000));
        assert_eq!(coerce_expiry(&0i64.into()).unwrap(), at(0));
        assert_eq!(
            coerce_expiry(&OptionValue::Json(serde_json::json!(1525500000.9))).unwrap(),
            at(1_525_500_000)
        );
    }

    #[test]
    fn date_strings_are_parsed() {
        let expect = at(1_525_500_000);
        for s in [
            "2018-05-05T06:00:00Z",
            "2018-05-05T08:00:00+02:00",
            "Sat, 05 May 2018 06:00:00 +0000",
            "2018-05-05 06:00:00",
            "2018-05-05T06:00:00",
            "2018-05-05 06:00",
            "@1525500000",
        ] {
            assert_eq!(coerce_expiry(&s.into()).unwrap(), expect, "input={s}");
        }
        assert_eq!(
            coerce_expiry(&"2018-05-05".into()).unwrap(),
            at(1_525_478_400)
        );
    }

    #[test]
    fn garbage_is_invalid_expiry_with_source() {
        let err = coerce_expiry(&"next tuesday-ish".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpiry);
        assert!(err.source().is_some());
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let err = coerce_expiry(&(-5i64).into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpiry);
    }

    #[test]
    fn lists_are_rejected() {
        let err = coerce_expiry(&vec!["2018-05-05"].into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpiry);
    }
}
