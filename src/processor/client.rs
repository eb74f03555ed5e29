//! HTTP client for the PDF processing service.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use super::ProcessError;
use crate::config::ProcessorConfig;

/// Sends PDFs with their metadata as `multipart/form-data`
#[derive(Debug, Clone)]
pub struct ProcessingClient {
    client: Client,
    service_url: String,
}

impl ProcessingClient {
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProcessError::Service(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service_url: config.service_url.clone(),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Upload `pdf` as the `pdf` part and `metadata` as a JSON text field.
    ///
    /// Non-success statuses are errors; the response body must be JSON.
    pub async fn submit(&self, pdf: &Path, metadata: &Value) -> Result<Value, ProcessError> {
        let bytes = tokio::fs::read(pdf).await?;
        let file_name = pdf
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "paper.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("pdf", part)
            .text("metadata", metadata.to_string());

        tracing::info!("Sending {} to {}", pdf.display(), self.service_url);

        let response = self
            .client
            .post(&self.service_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
