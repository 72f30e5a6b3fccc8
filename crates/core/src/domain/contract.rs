//! Wire schemas for the forecasting service. Decoding into these types is the only way a
//! response reaches the merge, so any shape mismatch surfaces as a decode error.

use crate::domain::Dataset;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRequest {
    pub data: Vec<ForecastInputRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastInputRow {
    pub ds: String,
    pub y: f64,
}

impl ForecastRequest {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let data = dataset
            .points()
            .iter()
            .filter_map(|p| {
                p.actual.map(|y| ForecastInputRow {
                    ds: p.timestamp.format("%Y-%m-%d").to_string(),
                    y,
                })
            })
            .collect();
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastRecord>,
    pub low_confidence: bool,
}

/// One row of the forecast array. Numeric fields are `None` when absent or `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastRecord {
    pub ds: Value,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub yhat: Option<f64>,
    #[serde(default)]
    pub yhat_lower: Option<f64>,
    #[serde(default)]
    pub yhat_upper: Option<f64>,
}
