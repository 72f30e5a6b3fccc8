use crate::domain::contract::ForecastResponse;
use crate::domain::{Dataset, ForecastPoint, ForecastResult};
use crate::error::ForecastError;
use crate::time::canonical_date;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Combines the uploaded history with the service's forecast rows.
///
/// Rows are keyed by canonical date. A row whose date is in the Dataset is history and keeps the
/// Dataset's value; every other row is horizon and must carry `yhat`. One bad horizon row
/// rejects the whole response.
pub fn merge_forecast(
    dataset: &Dataset,
    response: ForecastResponse,
) -> Result<ForecastResult, ForecastError> {
    if response.forecast.is_empty() {
        return Err(ForecastError::EmptyResult);
    }

    let mut merged: BTreeMap<NaiveDate, ForecastPoint> = BTreeMap::new();
    for p in dataset.points() {
        let Some(actual) = p.actual else { continue };
        let point = ForecastPoint::historical(p.timestamp, actual)
            .map_err(|e| malformed(format!("dataset point {}: {e}", p.timestamp)))?;
        merged.insert(p.timestamp, point);
    }

    let mut horizon = 0usize;
    for (idx, record) in response.forecast.into_iter().enumerate() {
        let date = canonical_date(&record.ds)
            .ok_or_else(|| malformed(format!("row {idx}: unreadable ds {}", record.ds)))?;

        if dataset.get(date).is_some() {
            continue;
        }

        let predicted = record
            .yhat
            .ok_or_else(|| malformed(format!("row {idx} ({date}): future row without yhat")))?;
        let point = ForecastPoint::forecast(date, predicted, record.yhat_lower, record.yhat_upper)
            .map_err(|e| malformed(format!("row {idx} ({date}): {e}")))?;

        if merged.insert(date, point).is_some() {
            return Err(malformed(format!("row {idx}: duplicate forecast date {date}")));
        }
        horizon += 1;
    }

    tracing::debug!(
        history = dataset.len(),
        horizon,
        low_confidence = response.low_confidence,
        "merged forecast response"
    );

    Ok(ForecastResult::new(
        merged.into_values().collect(),
        response.low_confidence,
    ))
}

fn malformed(detail: String) -> ForecastError {
    ForecastError::MalformedResponse { detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataPoint;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn response(v: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn merges_history_and_horizon_by_date() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 100.0)]);
        let res = response(json!({
            "forecast": [
                {"ds": "2023-01-01", "y": 100, "yhat": null, "yhat_lower": null, "yhat_upper": null},
                {"ds": "2023-01-02", "y": null, "yhat": 120, "yhat_lower": 100, "yhat_upper": 140},
            ],
            "low_confidence": false
        }));

        let out = merge_forecast(&ds, res).unwrap();
        assert!(!out.low_confidence());
        assert_eq!(
            out.points(),
            &[
                ForecastPoint::historical(d(2023, 1, 1), 100.0).unwrap(),
                ForecastPoint::forecast(d(2023, 1, 2), 120.0, Some(100.0), Some(140.0)).unwrap(),
            ]
        );
        assert_eq!(out.points()[1].actual(), None);
    }

    #[test]
    fn timezone_serialization_does_not_duplicate_history() {
        let ds = Dataset::from_points([
            DataPoint::new(d(2023, 1, 1), 10.0),
            DataPoint::new(d(2023, 1, 2), 20.0),
        ]);
        let res = response(json!({
            "forecast": [
                {"ds": "Sun, 01 Jan 2023 00:00:00 GMT", "y": 10, "yhat": 11},
                {"ds": "2023-01-02T00:00:00+09:00", "y": 20, "yhat": 19},
                {"ds": "2023-01-03T00:00:00Z", "yhat": 30, "yhat_lower": 25, "yhat_upper": 35},
            ],
            "low_confidence": true
        }));

        let out = merge_forecast(&ds, res).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.historical().count(), 2);
        assert_eq!(out.horizon().count(), 1);
        assert_eq!(out.points()[1].actual(), Some(20.0));
        assert!(out.low_confidence());
    }

    #[test]
    fn history_missing_from_response_is_still_included() {
        // Prophet-style responses only carry the future rows.
        let ds = Dataset::from_points([
            DataPoint::new(d(2023, 1, 1), 1.0),
            DataPoint::new(d(2023, 1, 2), 2.0),
        ]);
        let res = response(json!({
            "forecast": [{"ds": "2023-01-03", "yhat": 3, "yhat_lower": 2, "yhat_upper": 4}],
            "low_confidence": false
        }));
        let out = merge_forecast(&ds, res).unwrap();
        let dates: Vec<_> = out.points().iter().map(|p| p.timestamp()).collect();
        assert_eq!(dates, vec![d(2023, 1, 1), d(2023, 1, 2), d(2023, 1, 3)]);
    }

    #[test]
    fn missing_bounds_stay_none() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({
            "forecast": [{"ds": "2023-01-02", "yhat": 0}],
            "low_confidence": false
        }));
        let out = merge_forecast(&ds, res).unwrap();
        let p = out.points()[1];
        assert_eq!(p.predicted(), Some(0.0));
        assert_eq!(p.lower_bound(), None);
        assert_eq!(p.upper_bound(), None);
    }

    #[test]
    fn future_row_without_yhat_is_malformed() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({
            "forecast": [{"ds": "2023-01-02", "y": null, "yhat": null}],
            "low_confidence": false
        }));
        assert!(matches!(
            merge_forecast(&ds, res),
            Err(ForecastError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn unreadable_date_is_malformed() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({
            "forecast": [{"ds": "soon", "yhat": 5}],
            "low_confidence": false
        }));
        assert!(matches!(
            merge_forecast(&ds, res),
            Err(ForecastError::MalformedResponse { .. })
        ));

        let res = response(json!({
            "forecast": [{"ds": "2023-01-02garbage", "yhat": 5}],
            "low_confidence": false
        }));
        assert!(matches!(
            merge_forecast(&ds, res),
            Err(ForecastError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn inverted_bounds_are_malformed() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({
            "forecast": [{"ds": "2023-01-02", "yhat": 5, "yhat_lower": 6, "yhat_upper": 7}],
            "low_confidence": false
        }));
        assert!(matches!(
            merge_forecast(&ds, res),
            Err(ForecastError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn duplicate_horizon_dates_are_malformed() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({
            "forecast": [
                {"ds": "2023-01-02", "yhat": 5},
                {"ds": "2023-01-02T12:00:00", "yhat": 6},
            ],
            "low_confidence": false
        }));
        assert!(matches!(
            merge_forecast(&ds, res),
            Err(ForecastError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn empty_forecast_array_is_empty_result() {
        let ds = Dataset::from_points([DataPoint::new(d(2023, 1, 1), 1.0)]);
        let res = response(json!({"forecast": [], "low_confidence": false}));
        assert_eq!(merge_forecast(&ds, res), Err(ForecastError::EmptyResult));
    }
}
