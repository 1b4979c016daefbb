//! Terminal UI components for the chat screen

pub mod chat;
