use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{secret_from_env, AssistantConfig};

#[derive(thiserror::Error, Debug)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Network(String),
    #[error("assistant returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("assistant returned an unexpected payload: {0}")]
    MalformedPayload(String),
}

/// Free-text in, free-text out language-model collaborator.
#[async_trait::async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, prompt: &str) -> Result<String, AssistantError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

/// Chat-completion client for a Cohere-style `/v1/chat` endpoint.
///
/// One attempt per prompt; there is no retry.
#[derive(Clone)]
pub struct HttpAssistant {
    base_url: String,
    api_key: String,
    model: Option<String>,
    client: Client,
}

impl HttpAssistant {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistantError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model,
            client,
        })
    }

    /// `None` when the configured API key variable is unset.
    pub fn from_config(cfg: &AssistantConfig) -> Result<Option<Self>, AssistantError> {
        let Some(api_key) = secret_from_env(&cfg.api_key_env) else {
            tracing::warn!(env = %cfg.api_key_env, "assistant API key not set; assistant disabled");
            return Ok(None);
        };

        Self::new(
            cfg.base_url.clone(),
            api_key,
            cfg.model.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
        .map(Some)
    }
}

#[async_trait::async_trait]
impl Assistant for HttpAssistant {
    async fn reply(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!("{}/v1/chat", self.base_url);
        metrics::counter!("assistant_requests_total").increment(1);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                message: prompt,
                model: self.model.as_deref(),
            })
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("assistant_failures_total").increment(1);
                AssistantError::Network(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            metrics::counter!("assistant_failures_total").increment(1);
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "assistant request rejected");
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            metrics::counter!("assistant_failures_total").increment(1);
            AssistantError::MalformedPayload(e.to_string())
        })?;

        Ok(parsed.text.trim().to_string())
    }
}
