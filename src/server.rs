//! Bundled stub chat service.
//!
//! Serves the same contract the client consumes (`GET /health`,
//! `POST /chat`) so the app can be demoed and developed without a real
//! backend. Replies come from the keyword knowledge base.

use crate::api::{ChatRequest, ChatResponse};
use crate::knowledge;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/health", get(health))
}

/// Run the stub service until interrupted.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "stub advice service listening");
    println!("🧵 Modista stub service listening on http://{addr}");

    axum::serve(listener, router())
        .await
        .context("Server error")?;

    Ok(())
}

/// `GET /` — liveness banner.
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Modista advice service is running" }))
}

/// `GET /health` — reachability probe used by the client at startup.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// `POST /chat` — generate one reply for the submitted message.
async fn chat(Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    tracing::info!(
        message = %request.message,
        history_len = request.conversation_history.len(),
        "chat request"
    );

    let reply = knowledge::generate_response(&request.message);

    tracing::debug!(matcher = reply.matcher, score = ?reply.score, "generated reply");

    Json(ChatResponse {
        response: reply.response,
        metadata: Some(serde_json::json!({
            "matcher": reply.matcher,
            "score": reply.score,
        })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::api::HistoryEntry;

    #[tokio::test]
    async fn health_reports_healthy() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn root_reports_running() {
        let Json(body) = root().await;
        assert_eq!(body["message"], "Modista advice service is running");
    }

    #[tokio::test]
    async fn chat_returns_reply_with_metadata() {
        let request = ChatRequest {
            message: "hello".to_string(),
            conversation_history: vec![HistoryEntry {
                role: Role::Assistant,
                content: "Hello! I'm your fashion assistant.".to_string(),
            }],
        };

        let Json(reply) = chat(Json(request)).await;

        assert!(!reply.response.is_empty());
        let metadata = reply.metadata.expect("stub always tags replies");
        assert_eq!(metadata["matcher"], "greeting");
    }

    #[tokio::test]
    async fn chat_accepts_empty_history() {
        let request = ChatRequest {
            message: "what colors are in?".to_string(),
            conversation_history: Vec::new(),
        };

        let Json(reply) = chat(Json(request)).await;
        assert!(!reply.response.is_empty());
    }
}
