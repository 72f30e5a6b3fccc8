use crate::domain::{DataPoint, Dataset};
use crate::time::canonical_date;
use serde_json::{Map, Value};

const DATE_EXACT: &str = "ds";
const DATE_HINTS: &[&str] = &["date", "day", "time", "timestamp"];
const VALUE_EXACT: &str = "y";
const VALUE_HINTS: &[&str] = &["total", "sale", "amount", "revenue", "price", "value"];

/// Outcome of normalizing a cleaned batch. Rows that cannot be read are counted, not fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub dataset: Dataset,
    pub accepted: usize,
    pub dropped: usize,
}

pub fn normalize_rows(rows: &[Value]) -> Normalized {
    let mut points = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match row.as_object().and_then(normalize_row) {
            Some(p) => points.push(p),
            None => dropped += 1,
        }
    }

    let accepted = points.len();
    Normalized {
        dataset: Dataset::from_points(points),
        accepted,
        dropped,
    }
}

fn normalize_row(row: &Map<String, Value>) -> Option<DataPoint> {
    let (date_key, timestamp) = candidate_keys(row, DATE_EXACT, DATE_HINTS)
        .find_map(|k| canonical_date(&row[k]).map(|d| (k, d)))?;

    let actual = candidate_keys(row, VALUE_EXACT, VALUE_HINTS)
        .filter(|k| *k != date_key)
        .find_map(|k| parse_amount(&row[k]))?;

    Some(DataPoint::new(timestamp, actual))
}

/// Keys of `row` that may hold the wanted field: the exact name first, then the keys matching
/// each hint in hint order.
fn candidate_keys<'a>(
    row: &'a Map<String, Value>,
    exact: &'a str,
    hints: &'a [&'a str],
) -> impl Iterator<Item = &'a str> + 'a {
    let exact_match = row
        .keys()
        .filter(move |k| k.eq_ignore_ascii_case(exact))
        .map(String::as_str);

    let hinted = hints.iter().flat_map(move |hint| {
        row.keys()
            .filter(move |k| !k.eq_ignore_ascii_case(exact))
            .filter(move |k| k.to_ascii_lowercase().contains(hint))
            .map(String::as_str)
    });

    exact_match.chain(hinted)
}

/// Finite number from a JSON number or a decorated numeric string such as `"$1,200.50"`.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}
