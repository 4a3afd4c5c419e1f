//! Extraction endpoint client
//!
//! The runner only depends on [`ExtractionClient`]; the reqwest-backed
//! [`HttpExtractionClient`] is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ClientError;
use crate::suite::TestCase;

/// Request body for the extraction endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub model_name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_timings: Option<bool>,
}

impl ExtractionRequest {
    pub fn new(model_name: &str, text: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            text: text.trim().to_string(),
            transaction_type: None,
            include_timings: Some(true),
        }
    }

    pub fn for_case(model_name: &str, case: &TestCase) -> Self {
        Self {
            transaction_type: Some(case.transaction_type.as_str().to_string()),
            ..Self::new(model_name, &case.input)
        }
    }
}

/// Raw HTTP outcome: status code and body text, unparsed
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReply {
    pub status: u16,
    pub body: String,
}

impl ExtractionReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Issue one request. Non-2xx statuses are returned as replies, not errors.
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionReply, ClientError>;
}

pub struct HttpExtractionClient {
    endpoint: String,
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpExtractionClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout_ms)
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionReply, ClientError> {
        log::debug!(
            "POST {} (model={}, type={:?})",
            self.endpoint,
            request.model_name,
            request.transaction_type
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        log::debug!("Extraction reply: HTTP {} ({} bytes)", status, body.len());

        Ok(ExtractionReply { status, body })
    }
}
