//! Failure taxonomy shared by the pipelines, the state machine and the exporter.
//!
//! Nothing here is fatal: every variant is a state the workflow can sit in and leave again by
//! re-invoking the action that produced it.

use thiserror::Error;

/// Coarse classification used for logging and for deciding how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoFileSelected,
    UnsupportedFile,
    InsufficientData,
    ServiceRejected,
    EmptyResult,
    NetworkFailure,
    MalformedResponse,
    Io,
}

pub const UPLOAD_FALLBACK_MESSAGE: &str = "Upload failed. Please check your file and try again.";
pub const FORECAST_FALLBACK_MESSAGE: &str = "Forecast failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("Please select a CSV file first.")]
    NoFileSelected,

    #[error("Only .csv files are supported (got '{name}').")]
    UnsupportedFile { name: String },

    #[error("{message}")]
    ServiceRejected { status: Option<u16>, message: String },

    #[error("No usable rows were returned after cleaning.")]
    EmptyResult,

    #[error("Could not reach the cleaning service: {detail}")]
    NetworkFailure { detail: String, timed_out: bool },
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::NoFileSelected => ErrorKind::NoFileSelected,
            UploadError::UnsupportedFile { .. } => ErrorKind::UnsupportedFile,
            UploadError::ServiceRejected { .. } => ErrorKind::ServiceRejected,
            UploadError::EmptyResult => ErrorKind::EmptyResult,
            UploadError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
        }
    }

    /// Whether re-sending the same file may succeed without the user changing anything.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::NetworkFailure { .. } => true,
            UploadError::ServiceRejected { status, .. } => is_server_side(*status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("At least {required} data points are needed to forecast (got {found}).")]
    InsufficientData { found: usize, required: usize },

    #[error("{message}")]
    ServiceRejected { status: Option<u16>, message: String },

    #[error("The forecasting service returned no forecast.")]
    EmptyResult,

    #[error("Could not reach the forecasting service: {detail}")]
    NetworkFailure { detail: String, timed_out: bool },

    #[error("The forecasting service returned an unexpected response: {detail}")]
    MalformedResponse { detail: String },
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::InsufficientData { .. } => ErrorKind::InsufficientData,
            ForecastError::ServiceRejected { .. } => ErrorKind::ServiceRejected,
            ForecastError::EmptyResult => ErrorKind::EmptyResult,
            ForecastError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            ForecastError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ForecastError::NetworkFailure { .. } => true,
            ForecastError::ServiceRejected { status, .. } => is_server_side(*status),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the forecast result is empty.")]
    EmptyResult,

    #[error("failed to write export file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::EmptyResult => ErrorKind::EmptyResult,
            ExportError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// The last failure held by the workflow, tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Upload(e) => e.kind(),
            WorkflowError::Forecast(e) => e.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Upload(e) => e.is_retryable(),
            WorkflowError::Forecast(e) => e.is_retryable(),
        }
    }
}

fn is_server_side(status: Option<u16>) -> bool {
    matches!(status, Some(s) if s >= 500)
}
