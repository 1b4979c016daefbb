//! HTTP access to the chat service.
//!
//! The service exposes two endpoints: `GET /health` for the startup
//! reachability probe and `POST /chat` for a single request/response
//! exchange. The [`ChatService`] trait keeps the conversation logic
//! independent of the transport so it can be driven by a stub in tests.

use crate::config::Config;
use crate::conversation::Role;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// A transcript entry in wire form, as the service expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
}

/// Reply from `POST /chat`. `metadata` is accepted but the client ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// The two failure kinds the client distinguishes. Both are non-fatal and
/// end up as fixed assistant-role transcript entries.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The startup health probe failed (transport error or non-2xx).
    #[error("chat service unreachable: {0}")]
    Connectivity(String),

    /// A chat request failed (transport error, non-2xx, or bad body).
    #[error("chat request failed: {0}")]
    Request(String),
}

/// Interface for exchanging messages with a chat service.
///
/// Implementors encapsulate transport and serialization; the conversation
/// core only sees `health` and `send`.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Probe the service's health endpoint.
    async fn health(&self) -> Result<HealthStatus, ApiError>;

    /// Send one message plus prior history and return the generated reply.
    async fn send(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<ChatResponse, ApiError>;
}

/// `ChatService` over HTTP, backed by reqwest.
#[derive(Clone)]
pub struct HttpChatService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Connectivity(format!(
                "health endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))
    }

    async fn send(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<ChatResponse, ApiError> {
        let url = format!("{}/chat", self.base_url);
        let payload = ChatRequest {
            message: message.to_string(),
            conversation_history: history.to_vec(),
        };

        tracing::debug!(history_len = history.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "chat endpoint returned an error");
            return Err(ApiError::Request(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_uses_wire_field_names() {
        let payload = ChatRequest {
            message: "What goes with navy blue?".to_string(),
            conversation_history: vec![HistoryEntry {
                role: Role::Assistant,
                content: "Hello!".to_string(),
            }],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["message"], "What goes with navy blue?");
        assert_eq!(json["conversation_history"][0]["role"], "assistant");
        assert_eq!(json["conversation_history"][0]["content"], "Hello!");
    }

    #[test]
    fn chat_response_metadata_is_optional() {
        let bare: ChatResponse = serde_json::from_str(r#"{"response": "Try grey or white."}"#).unwrap();
        assert_eq!(bare.response, "Try grey or white.");
        assert!(bare.metadata.is_none());

        let tagged: ChatResponse = serde_json::from_str(
            r#"{"response": "ok", "metadata": {"matcher": "keyword"}}"#,
        )
        .unwrap();
        assert_eq!(tagged.metadata.unwrap()["matcher"], "keyword");
    }

    #[test]
    fn history_request_accepts_missing_history() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.conversation_history.is_empty());
    }
}
