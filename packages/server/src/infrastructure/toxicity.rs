//! HTTP client for the remote toxicity analysis service.
//!
//! `POST {base_url}/check-toxicity` with `{"message": text}`; the service
//! answers `{"allowed": bool, "reason"?: string, "score"?: number}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{ClassifierError, ToxicityClassifier, ToxicityVerdict};

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    message: &'a str,
}

/// Service response. Extra fields (e.g. `language`) are ignored.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
    #[serde(default)]
    reason: Option<String>,
    /// Omitted by the service when the language was not analysed
    #[serde(default)]
    score: Option<f64>,
}

impl From<CheckResponse> for ToxicityVerdict {
    fn from(response: CheckResponse) -> Self {
        Self {
            allowed: response.allowed,
            reason: response.reason,
            score: response.score.unwrap_or(0.0),
        }
    }
}

pub struct HttpToxicityClassifier {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpToxicityClassifier {
    /// Create a classifier client. `timeout` bounds the whole request.
    ///
    /// The service is an internal sidecar, so system proxy settings are ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/check-toxicity", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ToxicityClassifier for HttpToxicityClassifier {
    async fn classify(&self, text: &str) -> Result<ToxicityVerdict, ClassifierError> {
        tracing::debug!("Checking toxicity via {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&CheckRequest { message: text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    ClassifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body: CheckResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ClassifierError::InvalidResponse(e.to_string())
            }
        })?;
        Ok(body.into())
    }
}
