use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// One historical sales observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: NaiveDate,
    pub actual: Option<f64>,
}

impl DataPoint {
    pub fn new(timestamp: NaiveDate, actual: f64) -> Self {
        Self {
            timestamp,
            actual: Some(actual),
        }
    }
}

/// Cleaned historical series: strictly increasing by timestamp, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset(Vec<DataPoint>);

impl Dataset {
    /// Sorts ascending and keeps the last point seen for each timestamp.
    pub fn from_points(points: impl IntoIterator<Item = DataPoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, DataPoint> =
            points.into_iter().map(|p| (p.timestamp, p)).collect();
        Self(by_date.into_values().collect())
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.first().map(|p| p.timestamp)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.last().map(|p| p.timestamp)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DataPoint> {
        self.0
            .binary_search_by_key(&date, |p| p.timestamp)
            .ok()
            .map(|idx| &self.0[idx])
    }
}

/// A point of the combined series. Historical points carry `actual`; horizon points carry
/// `predicted` and optional bounds. The constructors keep exactly one of the two populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    timestamp: NaiveDate,
    actual: Option<f64>,
    predicted: Option<f64>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointError {
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error(
        "bounds do not enclose prediction (lower={lower:?}, predicted={predicted}, upper={upper:?})"
    )]
    BoundsOutOfOrder {
        lower: Option<f64>,
        predicted: f64,
        upper: Option<f64>,
    },
}

impl ForecastPoint {
    pub fn historical(timestamp: NaiveDate, actual: f64) -> Result<Self, PointError> {
        ensure_finite("actual", actual)?;
        Ok(Self {
            timestamp,
            actual: Some(actual),
            predicted: None,
            lower_bound: None,
            upper_bound: None,
        })
    }

    pub fn forecast(
        timestamp: NaiveDate,
        predicted: f64,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    ) -> Result<Self, PointError> {
        ensure_finite("predicted", predicted)?;
        if let Some(lower) = lower_bound {
            ensure_finite("lower_bound", lower)?;
        }
        if let Some(upper) = upper_bound {
            ensure_finite("upper_bound", upper)?;
        }

        let lower_ok = lower_bound.map_or(true, |l| l <= predicted);
        let upper_ok = upper_bound.map_or(true, |u| predicted <= u);
        if !(lower_ok && upper_ok) {
            return Err(PointError::BoundsOutOfOrder {
                lower: lower_bound,
                predicted,
                upper: upper_bound,
            });
        }

        Ok(Self {
            timestamp,
            actual: None,
            predicted: Some(predicted),
            lower_bound,
            upper_bound,
        })
    }

    pub fn timestamp(&self) -> NaiveDate {
        self.timestamp
    }

    pub fn actual(&self) -> Option<f64> {
        self.actual
    }

    pub fn predicted(&self) -> Option<f64> {
        self.predicted
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.upper_bound
    }

    pub fn is_forecast(&self) -> bool {
        self.predicted.is_some()
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), PointError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PointError::NonFinite { field, value })
    }
}

/// Historical points followed (in date order) by the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    low_confidence: bool,
}

impl ForecastResult {
    /// `points` must already be ordered; the merge in `forecast::merge` guarantees it.
    pub fn new(points: Vec<ForecastPoint>, low_confidence: bool) -> Self {
        Self {
            points,
            low_confidence,
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn low_confidence(&self) -> bool {
        self.low_confidence
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn historical(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| !p.is_forecast())
    }

    pub fn horizon(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_forecast())
    }

    /// Keeps every historical point and the first `days` horizon points.
    pub fn with_horizon(&self, days: usize) -> Self {
        let mut kept = 0usize;
        let points = self
            .points
            .iter()
            .filter(|p| {
                if !p.is_forecast() {
                    return true;
                }
                kept += 1;
                kept <= days
            })
            .copied()
            .collect();

        Self {
            points,
            low_confidence: self.low_confidence,
        }
    }
}
