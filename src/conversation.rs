//! Conversation state and the request/response exchange protocol.
//!
//! A [`Conversation`] owns the session transcript, the connectivity state
//! from the startup health probe, and the in-flight guard that keeps at
//! most one send pending. The transcript is append-only: past messages are
//! never reordered or mutated, and every accepted send appends exactly one
//! user message followed by exactly one assistant message (reply or error).

use crate::api::{ApiError, ChatResponse, ChatService, HistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Welcome message seeded after a successful health probe.
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your fashion assistant. How can I help you with fashion today?";

/// Prefix identifying the locally-generated connectivity notice. Messages
/// starting with this text are excluded from outgoing history.
pub const CONNECTIVITY_NOTICE_PREFIX: &str = "I'm having trouble connecting";

/// Notice seeded when the startup health probe fails.
pub const CONNECTIVITY_NOTICE: &str = "I'm having trouble connecting to the fashion advice \
     service. Make sure the backend is running, then restart the app.";

/// Generic notice appended when a send fails.
pub const SEND_ERROR_MESSAGE: &str =
    "Sorry, something went wrong on my end. Please try sending that again.";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Backend reachability, derived solely from the single startup probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// The probe has not run yet.
    Unknown,
    Reachable,
    Unreachable,
}

/// Everything needed to issue an accepted send: the message text and a
/// snapshot of the prior history, filtered per the transcript invariant.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Session-local chat state. Dropped when the process exits.
pub struct Conversation {
    transcript: Vec<Message>,
    connectivity: Connectivity,
    in_flight: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            connectivity: Connectivity::Unknown,
            in_flight: false,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Whether a send is currently pending.
    pub fn is_sending(&self) -> bool {
        self.in_flight
    }

    /// Probe the service once and seed the transcript with either the
    /// welcome message or the connectivity notice. Runs at most once per
    /// session; later calls are no-ops. A failed probe never blocks
    /// subsequent sends.
    pub async fn check_connection<S: ChatService + ?Sized>(&mut self, service: &S) {
        if self.connectivity != Connectivity::Unknown {
            return;
        }

        match service.health().await {
            Ok(health) => {
                tracing::info!(status = %health.status, "chat service reachable");
                self.connectivity = Connectivity::Reachable;
                self.transcript.push(Message::assistant(WELCOME_MESSAGE));
            }
            Err(err) => {
                tracing::warn!(error = %err, "health probe failed");
                self.connectivity = Connectivity::Unreachable;
                self.transcript.push(Message::assistant(CONNECTIVITY_NOTICE));
            }
        }
    }

    /// Accept a send: append the user message optimistically, raise the
    /// in-flight flag, and hand back the outgoing request. Returns `None`
    /// (and leaves the transcript untouched) for blank input or while a
    /// send is already pending; a second submit is dropped, not queued.
    pub fn begin_send(&mut self, text: &str) -> Option<Outgoing> {
        let text = text.trim();
        if text.is_empty() || self.in_flight {
            return None;
        }

        // History snapshot is taken before the new user message is
        // appended; the message itself travels in its own field.
        let history = self.outgoing_history();
        let message = Message::user(text);
        tracing::debug!(id = %message.id, "user message appended");
        self.transcript.push(message);
        self.in_flight = true;

        Some(Outgoing {
            message: text.to_string(),
            history,
        })
    }

    /// Finish a pending send: append exactly one assistant message (the
    /// reply on success, the fixed error notice on failure) and clear the
    /// in-flight flag. Ignored when no send is pending.
    pub fn complete_send(&mut self, result: Result<ChatResponse, ApiError>) {
        if !self.in_flight {
            return;
        }

        let content = match result {
            Ok(reply) => reply.response,
            Err(err) => {
                tracing::warn!(error = %err, "send failed");
                SEND_ERROR_MESSAGE.to_string()
            }
        };

        let message = Message::assistant(content);
        tracing::debug!(id = %message.id, "assistant message appended");
        self.transcript.push(message);
        self.in_flight = false;
    }

    /// Run a whole exchange against the service. Returns `false` when the
    /// send was not accepted (blank input or one already in flight). All
    /// service failures are absorbed into the transcript; nothing
    /// propagates to the caller.
    pub async fn send_message<S: ChatService + ?Sized>(
        &mut self,
        text: &str,
        service: &S,
    ) -> bool {
        let Some(outgoing) = self.begin_send(text) else {
            return false;
        };

        let result = service.send(&outgoing.message, &outgoing.history).await;
        self.complete_send(result);
        true
    }

    /// Transcript in wire form, minus any locally-generated connectivity
    /// notice, order preserved.
    fn outgoing_history(&self) -> Vec<HistoryEntry> {
        self.transcript
            .iter()
            .filter(|m| !m.content.starts_with(CONNECTIVITY_NOTICE_PREFIX))
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HealthStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted stand-in for the chat service. Records the history passed
    /// to `send` so tests can check the filter invariant.
    struct StubService {
        healthy: bool,
        reply: Result<String, String>,
        seen_history: Mutex<Vec<Vec<HistoryEntry>>>,
    }

    impl StubService {
        fn replying(text: &str) -> Self {
            Self {
                healthy: true,
                reply: Ok(text.to_string()),
                seen_history: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                healthy: false,
                reply: Err("connection refused".to_string()),
                seen_history: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatService for StubService {
        async fn health(&self) -> Result<HealthStatus, ApiError> {
            if self.healthy {
                Ok(HealthStatus {
                    status: "healthy".to_string(),
                })
            } else {
                Err(ApiError::Connectivity("connection refused".to_string()))
            }
        }

        async fn send(
            &self,
            _message: &str,
            history: &[HistoryEntry],
        ) -> Result<ChatResponse, ApiError> {
            self.seen_history.lock().unwrap().push(history.to_vec());
            match &self.reply {
                Ok(text) => Ok(ChatResponse {
                    response: text.clone(),
                    metadata: None,
                }),
                Err(reason) => Err(ApiError::Request(reason.clone())),
            }
        }
    }

    #[tokio::test]
    async fn successful_probe_seeds_single_welcome_message() {
        let service = StubService::replying("unused");
        let mut conversation = Conversation::new();

        conversation.check_connection(&service).await;

        assert_eq!(conversation.connectivity(), Connectivity::Reachable);
        assert_eq!(conversation.transcript().len(), 1);
        let seeded = &conversation.transcript()[0];
        assert_eq!(seeded.role, Role::Assistant);
        assert_eq!(seeded.content, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn failed_probe_seeds_notice_and_sending_still_works() {
        let failing = StubService::failing();
        let mut conversation = Conversation::new();

        conversation.check_connection(&failing).await;

        assert_eq!(conversation.connectivity(), Connectivity::Unreachable);
        assert_eq!(conversation.transcript().len(), 1);
        assert!(conversation.transcript()[0]
            .content
            .starts_with(CONNECTIVITY_NOTICE_PREFIX));

        // The probe outcome does not gate sends.
        let service = StubService::replying("Try grey or white.");
        let accepted = conversation.send_message("What goes with navy blue?", &service).await;
        assert!(accepted);
        assert_eq!(conversation.transcript().len(), 3);
    }

    #[tokio::test]
    async fn probe_runs_at_most_once_per_session() {
        let service = StubService::replying("unused");
        let mut conversation = Conversation::new();

        conversation.check_connection(&service).await;
        conversation.check_connection(&service).await;

        assert_eq!(conversation.transcript().len(), 1);
    }

    #[tokio::test]
    async fn send_appends_user_then_assistant_in_order() {
        let service = StubService::replying("Try grey or white.");
        let mut conversation = Conversation::new();

        let accepted = conversation.send_message("What goes with navy blue?", &service).await;

        assert!(accepted);
        assert!(!conversation.is_sending());
        let transcript = conversation.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "What goes with navy blue?");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "Try grey or white.");
    }

    #[tokio::test]
    async fn blank_input_leaves_transcript_untouched() {
        let service = StubService::replying("unused");
        let mut conversation = Conversation::new();

        assert!(!conversation.send_message("", &service).await);
        assert!(!conversation.send_message("   \n\t", &service).await);
        assert!(conversation.transcript().is_empty());
        assert!(!conversation.is_sending());
    }

    #[test]
    fn second_send_while_in_flight_is_dropped() {
        let mut conversation = Conversation::new();

        let first = conversation.begin_send("first message");
        assert!(first.is_some());
        assert!(conversation.is_sending());

        let second = conversation.begin_send("second message");
        assert!(second.is_none());
        // Only the accepted send's user message was appended.
        assert_eq!(conversation.transcript().len(), 1);
        assert_eq!(conversation.transcript()[0].content, "first message");
    }

    #[tokio::test]
    async fn failed_send_appends_error_notice_and_clears_flag() {
        let failing = StubService {
            healthy: true,
            reply: Err("boom".to_string()),
            seen_history: Mutex::new(Vec::new()),
        };
        let mut conversation = Conversation::new();

        let accepted = conversation.send_message("hello there", &failing).await;

        assert!(accepted);
        assert!(!conversation.is_sending());
        let transcript = conversation.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, SEND_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn outgoing_history_never_contains_connectivity_notice() {
        let failing = StubService::failing();
        let mut conversation = Conversation::new();
        conversation.check_connection(&failing).await;

        let service = StubService::replying("Casual works best.");
        conversation.send_message("What should I wear today?", &service).await;
        conversation.send_message("And for the evening?", &service).await;

        let seen = service.seen_history.lock().unwrap();
        assert_eq!(seen.len(), 2);

        // First send: transcript held only the notice, which is filtered.
        assert!(seen[0].is_empty());

        // Second send: the earlier exchange is present, order preserved,
        // the notice still absent.
        let history = &seen[1];
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "What should I wear today?");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "Casual works best.");
        assert!(history
            .iter()
            .all(|h| !h.content.starts_with(CONNECTIVITY_NOTICE_PREFIX)));
    }

    #[tokio::test]
    async fn welcome_message_is_included_in_history() {
        let service = StubService::replying("Sure!");
        let mut conversation = Conversation::new();
        conversation.check_connection(&service).await;

        conversation.send_message("hi", &service).await;

        let seen = service.seen_history.lock().unwrap();
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].content, WELCOME_MESSAGE);
    }

    #[test]
    fn complete_send_without_pending_send_is_ignored() {
        let mut conversation = Conversation::new();
        conversation.complete_send(Ok(ChatResponse {
            response: "stray".to_string(),
            metadata: None,
        }));
        assert!(conversation.transcript().is_empty());
    }

    #[test]
    fn input_is_trimmed_before_appending() {
        let mut conversation = Conversation::new();
        let outgoing = conversation.begin_send("  padded question  ").unwrap();
        assert_eq!(outgoing.message, "padded question");
        assert_eq!(conversation.transcript()[0].content, "padded question");
    }
}
