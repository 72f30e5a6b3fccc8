use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

// Naive layouts seen from the cleaning and forecasting services (pandas/Flask serializers).
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Smallest integer read as epoch milliseconds (1973-03-03). Smaller integers are day or row
/// numbers, not timestamps.
const MIN_EPOCH_MILLIS: i64 = 100_000_000_000;

/// Calendar date of a JSON date value, as written by the sender.
///
/// Time-of-day is dropped and any UTC offset is ignored rather than applied, so
/// `"2023-01-02T00:00:00+09:00"`, `"2023-01-02 00:00:00"` and `"2023-01-02"` all map to the
/// same key. Integer values are read as epoch milliseconds (UTC) when at least
/// [`MIN_EPOCH_MILLIS`].
pub fn canonical_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })?;
            if millis < MIN_EPOCH_MILLIS {
                return None;
            }
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(dt.date());
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return Some(d);
        }
    }

    // Offset styles chrono's RFC parsers reject, such as "2023-01-01T00:00Z": keep the date
    // part when a clock time follows it.
    let head = s.get(..10)?;
    let rest = &s[10..];
    let time = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;
    if !starts_with_clock(time) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// `HH:MM` at the start of `s`.
fn starts_with_clock(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 5
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[2] == b':'
        && b[3..5].iter().all(u8::is_ascii_digit)
}
