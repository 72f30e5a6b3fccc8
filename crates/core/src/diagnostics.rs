//! Summaries shown next to the preview table and the forecast chart.

use crate::domain::{DataPoint, Dataset, ForecastResult};
use chrono::NaiveDate;
use serde::Serialize;

/// Below this many rows the forecast is flagged as unreliable in the preview.
pub const MIN_RELIABLE_ROWS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// Inclusive calendar span.
    pub num_days: i64,
    pub avg_sales: f64,
    pub median_sales: f64,
    /// Consecutive points more than one day apart.
    pub missing_gaps: usize,
    pub reliable: bool,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &Dataset) -> Option<Self> {
        let date_start = dataset.first_date()?;
        let date_end = dataset.last_date()?;

        let mut values: Vec<f64> = dataset.points().iter().filter_map(|p| p.actual).collect();
        if values.is_empty() {
            return None;
        }
        let avg_sales = values.iter().sum::<f64>() / values.len() as f64;
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        let median_sales = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        let missing_gaps = dataset
            .points()
            .windows(2)
            .filter(|w| (w[1].timestamp - w[0].timestamp).num_days() > 1)
            .count();

        Some(Self {
            rows: dataset.len(),
            date_start,
            date_end,
            num_days: (date_end - date_start).num_days() + 1,
            avg_sales,
            median_sales,
            missing_gaps,
            reliable: dataset.len() >= MIN_RELIABLE_ROWS,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub horizon_days: usize,
    pub average: Option<f64>,
    pub total: f64,
    pub low_confidence: bool,
}

impl ForecastSummary {
    pub fn from_result(result: &ForecastResult) -> Self {
        let predicted: Vec<f64> = result.horizon().filter_map(|p| p.predicted()).collect();
        let total: f64 = predicted.iter().sum();
        let average = (!predicted.is_empty()).then(|| total / predicted.len() as f64);

        Self {
            horizon_days: predicted.len(),
            average,
            total,
            low_confidence: result.low_confidence(),
        }
    }
}

/// First `limit` rows for the preview table.
pub fn preview_rows(dataset: &Dataset, limit: usize) -> &[DataPoint] {
    let points = dataset.points();
    &points[..points.len().min(limit)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastPoint;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    #[test]
    fn summarizes_span_gaps_and_center() {
        let ds = Dataset::from_points([
            DataPoint::new(d(1, 1), 10.0),
            DataPoint::new(d(1, 2), 20.0),
            DataPoint::new(d(1, 5), 40.0),
            DataPoint::new(d(1, 6), 30.0),
        ]);
        let s = DatasetSummary::from_dataset(&ds).unwrap();
        assert_eq!(s.rows, 4);
        assert_eq!(s.date_start, d(1, 1));
        assert_eq!(s.date_end, d(1, 6));
        assert_eq!(s.num_days, 6);
        assert_eq!(s.avg_sales, 25.0);
        assert_eq!(s.median_sales, 25.0);
        assert_eq!(s.missing_gaps, 1);
        assert!(!s.reliable);
    }

    #[test]
    fn thirty_daily_rows_are_reliable() {
        let ds = Dataset::from_points((1..=30).map(|day| DataPoint::new(d(1, day), 1.0)));
        let s = DatasetSummary::from_dataset(&ds).unwrap();
        assert!(s.reliable);
        assert_eq!(s.missing_gaps, 0);
        assert_eq!(s.median_sales, 1.0);
    }

    #[test]
    fn empty_dataset_has_no_summary() {
        assert_eq!(DatasetSummary::from_dataset(&Dataset::default()), None);
    }

    #[test]
    fn forecast_summary_covers_horizon_only() {
        let r = ForecastResult::new(
            vec![
                ForecastPoint::historical(d(1, 1), 1000.0).unwrap(),
                ForecastPoint::forecast(d(1, 2), 100.0, None, None).unwrap(),
                ForecastPoint::forecast(d(1, 3), 200.0, None, None).unwrap(),
            ],
            true,
        );
        let s = ForecastSummary::from_result(&r);
        assert_eq!(s.horizon_days, 2);
        assert_eq!(s.total, 300.0);
        assert_eq!(s.average, Some(150.0));
        assert!(s.low_confidence);
    }

    #[test]
    fn preview_is_capped() {
        let ds = Dataset::from_points((1..=12).map(|day| DataPoint::new(d(1, day), 1.0)));
        assert_eq!(preview_rows(&ds, 10).len(), 10);
        assert_eq!(preview_rows(&ds, 50).len(), 12);
    }
}
