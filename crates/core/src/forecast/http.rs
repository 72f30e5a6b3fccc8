use crate::config::Settings;
use crate::domain::contract::ForecastRequest;
use crate::forecast::ForecastService;
use crate::http::{build_client, endpoint, send_json, TransportError};
use serde_json::Value;

const FORECAST_PATH: &str = "/forecast";

/// `POST /forecast` with a JSON `{ "data": [{ "ds", "y" }, ...] }` body.
#[derive(Debug, Clone)]
pub struct HttpForecastService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpForecastService {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_client(settings)?,
            base_url: settings.api_base_url.clone(),
        })
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self) -> String {
        endpoint(&self.base_url, FORECAST_PATH)
    }
}

#[async_trait::async_trait]
impl ForecastService for HttpForecastService {
    fn service_name(&self) -> &'static str {
        "http_forecast"
    }

    async fn forecast(&self, request: &ForecastRequest) -> Result<Value, TransportError> {
        send_json(self.http.post(self.url()).json(request)).await
    }
}
