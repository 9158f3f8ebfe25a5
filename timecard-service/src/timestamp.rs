//! Timestamp normalization
//!
//! Source timestamps arrive in a handful of loose string shapes. Every one of
//! them is read as a wall clock in UTC: an explicit offset or `Z` suffix is
//! dropped, never applied, and the local timezone of the process is never
//! consulted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Naive layouts tried after any zone suffix has been stripped.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a timestamp string to a UTC-anchored instant.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset), ISO-like strings without a
/// zone, with or without fractional seconds, a space instead of `T`, and bare
/// dates (midnight). Returns `None` for anything else.
pub fn normalize(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Offsets are a recording artifact; keep the wall clock as written.
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.naive_local().and_utc());
    }

    let body = strip_zone_suffix(trimmed);

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(body, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(body, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render an instant in the canonical form produced by [`normalize`].
///
/// Fractional digits are emitted only as far as the instant needs them, so
/// `normalize(&canonical(t)) == Some(t)` at any sub-second precision.
pub fn canonical(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Normalize and re-render in one step.
pub fn normalize_to_string(raw: &str) -> Option<String> {
    normalize(raw).map(|instant| canonical(&instant))
}

/// Drop a trailing `Z`, `UTC`, or `±HH:MM` / `±HHMM` / `±HH` offset that
/// follows the time portion.
fn strip_zone_suffix(value: &str) -> &str {
    let value = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .or_else(|| value.strip_suffix(" UTC"))
        .unwrap_or(value);

    // Only look for an offset sign after the time separator, so the date's
    // own dashes are left alone.
    let time_start = match value.find(['T', ' ']) {
        Some(idx) => idx,
        None => return value,
    };
    match value[time_start..].rfind(['+', '-']) {
        Some(rel) => value[..time_start + rel].trim_end(),
        None => value,
    }
}

/// Serde adapter for optional timestamps.
///
/// Deserialization never fails: a missing, null, non-string or unparseable
/// value becomes `None`.
pub mod optional {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => normalize(&s),
            Some(serde_json::Value::Number(n)) => {
                epoch_millis(&n).and_then(DateTime::<Utc>::from_timestamp_millis)
            }
            _ => None,
        })
    }

    /// Whole epoch milliseconds; `1.7e12` counts, `1.5` does not.
    fn epoch_millis(n: &serde_json::Number) -> Option<i64> {
        n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        })
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => serializer.serialize_str(&canonical(instant)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_accepts_common_shapes() {
        let expected = utc(2025, 6, 1, 8, 0);
        for raw in [
            "2025-06-01T08:00:00Z",
            "2025-06-01T08:00:00.000Z",
            "2025-06-01T08:00:00",
            "2025-06-01T08:00",
            "2025-06-01 08:00:00",
            "2025-06-01 08:00",
            "  2025-06-01T08:00:00.000  ",
        ] {
            assert_eq!(normalize(raw), Some(expected), "failed for {raw}");
        }
    }

    #[test]
    fn test_offset_is_ignored_not_applied() {
        assert_eq!(normalize("2025-06-01T08:00:00-07:00"), Some(utc(2025, 6, 1, 8, 0)));
        assert_eq!(normalize("2025-06-01T08:00:00+0530"), Some(utc(2025, 6, 1, 8, 0)));
        assert_eq!(normalize("2025-06-01 08:00:00+00"), Some(utc(2025, 6, 1, 8, 0)));
    }

    #[test]
    fn test_bare_date_is_midnight() {
        assert_eq!(normalize("2025-06-01"), Some(utc(2025, 6, 1, 0, 0)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("yesterday"), None);
        assert_eq!(normalize("2025-13-45T99:00:00Z"), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in [
            "2025-06-01T08:00:00Z",
            "2025-06-01T08:00:00.123",
            "2024-12-31 23:59",
            "2025-03-09T02:30:00-08:00",
        ] {
            let once = normalize_to_string(raw).unwrap();
            let twice = normalize_to_string(&once).unwrap();
            assert_eq!(once, twice);
            assert_eq!(normalize(&once), normalize(raw));
        }
    }

    #[test]
    fn test_subsecond_precision_is_kept() {
        let instant = normalize("2025-06-01T08:00:00.250Z").unwrap();
        assert_eq!(canonical(&instant), "2025-06-01T08:00:00.250Z");
    }

    #[test]
    fn test_microseconds_survive_round_trip() {
        let instant = normalize("2025-06-01T08:00:00.123456Z").unwrap();
        let rendered = canonical(&instant);
        assert_eq!(rendered, "2025-06-01T08:00:00.123456Z");
        assert_eq!(normalize(&rendered), Some(instant));

        assert_eq!(canonical(&utc(2025, 6, 1, 8, 0)), "2025-06-01T08:00:00Z");
    }

    #[derive(Debug, serde::Deserialize)]
    struct Stamped {
        #[serde(default, with = "optional")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_epoch_millis_as_integer_or_whole_float() {
        let expected = DateTime::<Utc>::from_timestamp_millis(1_748_764_800_000);

        let int: Stamped = serde_json::from_str(r#"{"at": 1748764800000}"#).unwrap();
        let float: Stamped = serde_json::from_str(r#"{"at": 1748764800000.0}"#).unwrap();
        let fractional: Stamped = serde_json::from_str(r#"{"at": 1748764800000.5}"#).unwrap();

        assert_eq!(int.at, expected);
        assert_eq!(float.at, expected);
        assert_eq!(fractional.at, None);
    }
}
