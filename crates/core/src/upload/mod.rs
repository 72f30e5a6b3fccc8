//! Upload pipeline: local checks, one multipart POST to the cleaning service, and
//! best-effort normalization of the cleaned rows into a [`Dataset`].

use crate::domain::Dataset;
use crate::error::{UploadError, UPLOAD_FALLBACK_MESSAGE};
use crate::http::TransportError;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

pub mod http;
pub mod normalize;

pub use http::HttpCleaningService;
pub use normalize::{normalize_rows, Normalized};

/// A user-selected file: its display name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn has_csv_extension(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".csv")
    }
}

#[async_trait::async_trait]
pub trait CleaningService: Send + Sync {
    fn service_name(&self) -> &'static str;

    /// Sends the raw file and returns the decoded JSON body of a success response.
    async fn clean(&self, file: &UploadFile) -> Result<Value, TransportError>;
}

pub async fn upload(
    service: &dyn CleaningService,
    file: Option<&UploadFile>,
) -> Result<Dataset, UploadError> {
    let file = file.ok_or(UploadError::NoFileSelected)?;
    if !file.has_csv_extension() {
        return Err(UploadError::UnsupportedFile {
            name: file.name.clone(),
        });
    }

    tracing::info!(
        service = service.service_name(),
        file = %file.name,
        bytes = file.bytes.len(),
        "uploading file for cleaning"
    );

    let body = service.clean(file).await.map_err(map_transport_error)?;
    let Value::Array(rows) = body else {
        tracing::warn!(service = service.service_name(), "cleaning response is not a JSON array");
        return Err(UploadError::ServiceRejected {
            status: None,
            message: UPLOAD_FALLBACK_MESSAGE.to_string(),
        });
    };

    let normalized = normalize_rows(&rows);
    if normalized.dropped > 0 {
        tracing::warn!(
            accepted = normalized.accepted,
            dropped = normalized.dropped,
            "dropped cleaned rows that could not be normalized"
        );
    }

    if normalized.dataset.is_empty() {
        return Err(UploadError::EmptyResult);
    }

    tracing::debug!(points = normalized.dataset.len(), "cleaned dataset ready");
    Ok(normalized.dataset)
}

fn map_transport_error(err: TransportError) -> UploadError {
    match err {
        TransportError::Status { status, message } => UploadError::ServiceRejected {
            status: Some(status),
            message: message.unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string()),
        },
        TransportError::Network { detail, timed_out } => {
            UploadError::NetworkFailure { detail, timed_out }
        }
        TransportError::Body { detail } => {
            tracing::warn!(%detail, "cleaning response body is not JSON");
            UploadError::ServiceRejected {
                status: None,
                message: UPLOAD_FALLBACK_MESSAGE.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCleaner {
        response: Result<Value, TransportError>,
        calls: AtomicUsize,
    }

    impl FakeCleaner {
        fn new(response: Result<Value, TransportError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CleaningService for FakeCleaner {
        fn service_name(&self) -> &'static str {
            "fake"
        }

        async fn clean(&self, _file: &UploadFile) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn csv() -> UploadFile {
        UploadFile::new("sales.csv", b"date,sales\n2023-01-01,100\n".to_vec())
    }

    #[tokio::test]
    async fn missing_file_fails_without_network_call() {
        let svc = FakeCleaner::new(Ok(json!([])));
        let err = upload(&svc, None).await.unwrap_err();
        assert_eq!(err, UploadError::NoFileSelected);
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_csv_file_fails_without_network_call() {
        let svc = FakeCleaner::new(Ok(json!([])));
        let file = UploadFile::new("sales.xlsx", vec![1, 2, 3]);
        let err = upload(&svc, Some(&file)).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFile { .. }));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upper_case_extension_is_accepted() {
        let svc = FakeCleaner::new(Ok(json!([{"ds": "2023-01-01", "y": 1}])));
        let file = UploadFile::new("SALES.CSV", b"x".to_vec());
        assert!(upload(&svc, Some(&file)).await.is_ok());
    }

    #[tokio::test]
    async fn returns_sorted_unique_dataset() {
        let svc = FakeCleaner::new(Ok(json!([
            {"ds": "2023-01-03", "y": 3},
            {"ds": "2023-01-01", "y": 1},
            {"ds": "2023-01-03", "y": 33},
            {"ds": "bad", "y": 0},
        ])));
        let ds = upload(&svc, Some(&csv())).await.unwrap();
        let values: Vec<_> = ds.points().iter().map(|p| p.actual.unwrap()).collect();
        assert_eq!(values, vec![1.0, 33.0]);
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_message_is_surfaced() {
        let svc = FakeCleaner::new(Err(TransportError::Status {
            status: 400,
            message: Some("Could not process file: bad header".to_string()),
        }));
        let err = upload(&svc, Some(&csv())).await.unwrap_err();
        assert_eq!(
            err,
            UploadError::ServiceRejected {
                status: Some(400),
                message: "Could not process file: bad header".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn missing_service_message_uses_fallback() {
        let svc = FakeCleaner::new(Err(TransportError::Status {
            status: 500,
            message: None,
        }));
        let err = upload(&svc, Some(&csv())).await.unwrap_err();
        assert_eq!(err.to_string(), UPLOAD_FALLBACK_MESSAGE);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn non_array_body_is_rejected() {
        let svc = FakeCleaner::new(Ok(json!({"rows": []})));
        let err = upload(&svc, Some(&csv())).await.unwrap_err();
        assert!(matches!(err, UploadError::ServiceRejected { status: None, .. }));
    }

    #[tokio::test]
    async fn timeout_maps_to_retryable_network_failure() {
        let svc = FakeCleaner::new(Err(TransportError::Network {
            detail: "operation timed out".to_string(),
            timed_out: true,
        }));
        let err = upload(&svc, Some(&csv())).await.unwrap_err();
        assert!(matches!(err, UploadError::NetworkFailure { timed_out: true, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn all_rows_dropped_is_empty_result() {
        let svc = FakeCleaner::new(Ok(json!([{"foo": "bar"}])));
        let err = upload(&svc, Some(&csv())).await.unwrap_err();
        assert_eq!(err, UploadError::EmptyResult);
    }
}
