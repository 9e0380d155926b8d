use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::FieldId,
    error::{ReportApiError, ReportException},
    protocol::receipt_part_name,
};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{attachments::AttachmentStore, validation::FormState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadAttachment {
    pub part_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Everything sent for one report: text answers keyed by field id and
/// attachments keyed `receipt_<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    pub fields: Vec<(FieldId, String)>,
    pub attachments: Vec<PayloadAttachment>,
}

impl ReportPayload {
    pub fn assemble(form: &FormState, attachments: &AttachmentStore) -> Self {
        Self {
            fields: FieldId::value_fields()
                .map(|field| (field, form.value(field).to_string()))
                .collect(),
            attachments: attachments
                .iter()
                .enumerate()
                .map(|(index, attachment)| PayloadAttachment {
                    part_name: receipt_part_name(index),
                    file_name: attachment.name().to_string(),
                    mime_type: attachment.mime_type().to_string(),
                    content: attachment.content().to_vec(),
                })
                .collect(),
        }
    }

    pub fn field(&self, field: FieldId) -> Option<&str> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("report endpoint rejected submission with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("report submission timed out after {0:?}")]
    Timeout(Duration),
    #[error("report transport unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn submit(&self, payload: &ReportPayload) -> Result<(), TransportError>;
}

/// Stand-in transport: waits, logs the payload shape and succeeds unless
/// built with [`SimulatedTransport::failing`].
pub struct SimulatedTransport {
    delay: Duration,
    fail: bool,
}

impl SimulatedTransport {
    pub fn new(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    pub fn failing(delay: Duration) -> Self {
        Self { delay, fail: true }
    }
}

#[async_trait]
impl ReportTransport for SimulatedTransport {
    async fn submit(&self, payload: &ReportPayload) -> Result<(), TransportError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(TransportError::Unavailable(
                "simulated transport configured to fail".into(),
            ));
        }
        info!(
            fields = payload.fields.len(),
            attachments = payload.attachments.len(),
            "simulated report submission accepted"
        );
        Ok(())
    }
}

/// Posts the report as `multipart/form-data` to a fixed endpoint.
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    fn build_form(payload: &ReportPayload) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (field, value) in &payload.fields {
            form = form.text(field.as_str(), value.clone());
        }
        for attachment in &payload.attachments {
            let part = Part::bytes(attachment.content.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)?;
            form = form.part(attachment.part_name.clone(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn submit(&self, payload: &ReportPayload) -> Result<(), TransportError> {
        let form = Self::build_form(payload)?;
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                attachments = payload.attachments.len(),
                "report delivered"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ReportApiError>(&body) {
            Ok(api_error) => ReportException::from(api_error).to_string(),
            Err(_) if body.trim().is_empty() => status.to_string(),
            Err(_) => body,
        };
        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
