use crate::api::{ChatService, HttpChatService};
use crate::config::Config;
use crate::conversation::Conversation;
use anyhow::Result;

/// Send a single message and print the reply. Exercises the same
/// conversation flow as the chat screen, minus the startup probe.
pub async fn ask(config: &Config, message: &str) -> Result<()> {
    let service = HttpChatService::new(config)?;
    let mut conversation = Conversation::new();

    if !conversation.send_message(message, &service).await {
        println!("🤔 Nothing to send. Give me a question about fashion!");
        return Ok(());
    }

    if let Some(reply) = conversation.transcript().last() {
        println!("{}", reply.content);
    }

    Ok(())
}

/// Probe the service's health endpoint once and report the outcome.
pub async fn health(config: &Config) -> Result<()> {
    let service = HttpChatService::new(config)?;

    match service.health().await {
        Ok(status) => {
            println!("✅ {} is reachable (status: {})", service.base_url(), status.status);
        }
        Err(err) => {
            println!("❌ {} is unreachable: {}", service.base_url(), err);
            println!("Run 'modista serve' to start the bundled stub service.");
        }
    }

    Ok(())
}
