use crate::config::Settings;
use crate::http::{build_client, endpoint, send_json, TransportError};
use crate::upload::{CleaningService, UploadFile};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

const CLEAN_PATH: &str = "/clean";
const FILE_FIELD: &str = "file";
const CSV_MIME: &str = "text/csv";

/// `POST /clean` with the raw CSV as multipart field `file`.
#[derive(Debug, Clone)]
pub struct HttpCleaningService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCleaningService {
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
        endpoint(&self.base_url, CLEAN_PATH)
    }

    fn form(file: &UploadFile) -> Result<Form, TransportError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)
            .map_err(|e| TransportError::Network {
                detail: format!("failed to build multipart body: {e}"),
                timed_out: false,
            })?;
        Ok(Form::new().part(FILE_FIELD, part))
    }
}

#[async_trait::async_trait]
impl CleaningService for HttpCleaningService {
    fn service_name(&self) -> &'static str {
        "http_clean"
    }

    async fn clean(&self, file: &UploadFile) -> Result<Value, TransportError> {
        let form = Self::form(file)?;
        send_json(self.http.post(self.url()).multipart(form)).await
    }
}
