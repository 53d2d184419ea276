//! Agent dispatch: one request to the backend agent endpoint per call.
//!
//! The dispatcher never retries and never touches session state; the
//! orchestrator decides what to do with the result.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use finch_core::config::ChatConfig;

use crate::error::{ChatError, DispatchError};
use crate::types::{AgentRequest, RawAgentResponse, SessionParams};

/// Sends a single utterance to the backend agent.
#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    /// `context` is attached to the payload only when `Some`.
    async fn ask(
        &self,
        text: &str,
        params: &SessionParams,
        context: Option<&Value>,
    ) -> Result<RawAgentResponse, DispatchError>;
}

/// HTTP dispatcher posting JSON to the agent endpoint.
#[derive(Clone)]
pub struct HttpAgentDispatcher {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpAgentDispatcher {
    pub fn new(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }

    /// Build a dispatcher that posts to `proxy_base + agent_path`.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Dispatch(DispatchError::Transport(e.to_string())))?;
        let endpoint = format!(
            "{}{}",
            config.proxy_base.trim_end_matches('/'),
            config.agent_path
        );
        Ok(Self::new(endpoint, http_client))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AgentDispatcher for HttpAgentDispatcher {
    async fn ask(
        &self,
        text: &str,
        params: &SessionParams,
        context: Option<&Value>,
    ) -> Result<RawAgentResponse, DispatchError> {
        let payload = AgentRequest {
            text,
            params,
            context,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            with_context = context.is_some(),
            "Posting agent request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Transport(format!("failed to read agent response: {e}")))?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, "Agent request failed");
            return Err(DispatchError::Status { status, body });
        }

        serde_json::from_str::<RawAgentResponse>(&body).map_err(|e| DispatchError::Malformed {
            status,
            reason: e.to_string(),
            body,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
