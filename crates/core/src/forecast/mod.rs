//! Forecast pipeline: submit the Dataset to the forecasting service and merge its answer into
//! a combined historical + horizon series.

use crate::domain::contract::{ForecastRequest, ForecastResponse};
use crate::domain::{Dataset, ForecastResult};
use crate::error::{ForecastError, FORECAST_FALLBACK_MESSAGE};
use crate::http::TransportError;
use serde_json::Value;

pub mod http;
pub mod merge;

pub use http::HttpForecastService;
pub use merge::merge_forecast;

/// Fewest points the forecasting service is ever asked to work with.
pub const MIN_FORECAST_POINTS: usize = 2;

#[async_trait::async_trait]
pub trait ForecastService: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn forecast(&self, request: &ForecastRequest) -> Result<Value, TransportError>;
}

pub async fn run_forecast(
    service: &dyn ForecastService,
    dataset: &Dataset,
) -> Result<ForecastResult, ForecastError> {
    // Points without a value are not sent, so they do not count towards the minimum.
    let request = ForecastRequest::from_dataset(dataset);
    if request.data.len() < MIN_FORECAST_POINTS {
        return Err(ForecastError::InsufficientData {
            found: request.data.len(),
            required: MIN_FORECAST_POINTS,
        });
    }

    tracing::info!(
        service = service.service_name(),
        rows = request.data.len(),
        "requesting forecast"
    );

    let raw = service.forecast(&request).await.map_err(map_transport_error)?;
    let response = serde_json::from_value::<ForecastResponse>(raw).map_err(|e| {
        ForecastError::MalformedResponse {
            detail: format!("failed to decode forecast response: {e}"),
        }
    })?;

    merge_forecast(dataset, response)
}

fn map_transport_error(err: TransportError) -> ForecastError {
    match err {
        TransportError::Status { status, message } => ForecastError::ServiceRejected {
            status: Some(status),
            message: message.unwrap_or_else(|| FORECAST_FALLBACK_MESSAGE.to_string()),
        },
        TransportError::Network { detail, timed_out } => {
            ForecastError::NetworkFailure { detail, timed_out }
        }
        TransportError::Body { detail } => ForecastError::MalformedResponse { detail },
    }
}
