//! Chat screen components: transcript view, composer, slash commands.

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;

pub use manager::{ChatAction, ChatManager};
