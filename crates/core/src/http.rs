use crate::config::Settings;
use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single request, before a pipeline maps it onto its own error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Non-success HTTP status. `message` is the service's `{message}` field, if any.
    #[error("HTTP {status}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: u16,
        message: Option<String>,
    },
    /// Connection failure, timeout, or a body that could not be read.
    #[error("network failure (timed_out={timed_out}): {detail}")]
    Network { detail: String, timed_out: bool },
    /// Success status but the body is not JSON.
    #[error("invalid response body: {detail}")]
    Body { detail: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network {
            timed_out: err.is_timeout(),
            detail: err.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
}

/// `{ "message": "..." }` from an error body, if present and non-blank.
pub fn extract_service_message(text: &str) -> Option<String> {
    serde_json::from_str::<ServiceErrorBody>(text)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

pub fn build_client(settings: &Settings) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .context("failed to build http client")
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Sends a prepared request and returns the decoded JSON body of a success response.
pub async fn send_json(req: reqwest::RequestBuilder) -> Result<Value, TransportError> {
    let res = req.send().await?;

    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        return Err(status_error(status, &text));
    }

    serde_json::from_str::<Value>(&text).map_err(|e| TransportError::Body {
        detail: format!("{e}: {}", truncate(&text, 200)),
    })
}

fn status_error(status: StatusCode, text: &str) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        message: extract_service_message(text),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
