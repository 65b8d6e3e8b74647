//! Single multipart exchange with the analysis backend.

use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{SubmissionInput, CSV_MIME_TYPE, PDF_MIME_TYPE},
    error::AnalyzeError,
    protocol::{ErrorBodySchema, FormFields},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{cancel::CancelToken, config::ClientSettings};

/// Fully buffered successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl PdfDocument {
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

#[async_trait]
pub trait AnalyzeTransport: Send + Sync {
    async fn analyze(
        &self,
        input: &SubmissionInput,
        cancel: &CancelToken,
    ) -> Result<PdfDocument, AnalyzeError>;
}

pub struct HttpAnalyzeClient {
    http: Client,
    endpoint: Url,
    fields: FormFields,
    error_schema: ErrorBodySchema,
}

impl HttpAnalyzeClient {
    pub fn new(endpoint: Url, fields: FormFields, error_schema: ErrorBodySchema) -> Self {
        Self::with_http(Client::new(), endpoint, fields, error_schema)
    }

    /// Uses a preconfigured `reqwest::Client` (proxy, timeouts, TLS).
    pub fn with_http(
        http: Client,
        endpoint: Url,
        fields: FormFields,
        error_schema: ErrorBodySchema,
    ) -> Self {
        Self {
            http,
            endpoint,
            fields,
            error_schema,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        Ok(Self::new(
            settings.analyze_endpoint()?,
            settings.fields.clone(),
            settings.error_message_keys.clone(),
        ))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    async fn exchange(&self, input: &SubmissionInput) -> Result<PdfDocument, AnalyzeError> {
        let form = build_form(&self.fields, input)?;
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, "analyze request failed before a response: {err}");
                AnalyzeError::network(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let err = match self.error_schema.extract_message(&body) {
                Some(message) => AnalyzeError::server(status.as_u16(), message),
                None => AnalyzeError::status_fallback(status.as_u16()),
            };
            warn!(status = status.as_u16(), "analysis backend rejected report: {err}");
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|value| value.starts_with(PDF_MIME_TYPE))
        {
            warn!(
                content_type = content_type.as_deref().unwrap_or("<none>"),
                "analysis backend answered with a non-PDF content type"
            );
        }

        let bytes = response.bytes().await.map_err(|err| {
            warn!("failed to read analysis response body: {err}");
            AnalyzeError::network(err.to_string())
        })?;
        info!(status = status.as_u16(), bytes = bytes.len(), "received report");

        Ok(PdfDocument {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[async_trait]
impl AnalyzeTransport for HttpAnalyzeClient {
    async fn analyze(
        &self,
        input: &SubmissionInput,
        cancel: &CancelToken,
    ) -> Result<PdfDocument, AnalyzeError> {
        if cancel.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        debug!(endpoint = %self.endpoint, title = %input.title, "posting report upload");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(endpoint = %self.endpoint, "analyze request cancelled");
                Err(AnalyzeError::Cancelled)
            }
            result = self.exchange(input) => result,
        }
    }
}

pub fn build_form(fields: &FormFields, input: &SubmissionInput) -> Result<Form, AnalyzeError> {
    let part = Part::bytes(input.file.bytes.clone())
        .file_name(input.file.filename.clone())
        .mime_str(CSV_MIME_TYPE)
        .map_err(|err| AnalyzeError::network(format!("failed to build multipart body: {err}")))?;

    Ok(Form::new()
        .part(fields.file.clone(), part)
        .text(fields.title.clone(), input.title.clone()))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
