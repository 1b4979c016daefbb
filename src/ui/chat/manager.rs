//! Wires the conversation core to the chat screen.
//!
//! The draw loop stays responsive by running each send on a spawned task
//! and polling a oneshot receiver every tick; the conversation's in-flight
//! guard drops any submit that arrives while a reply is pending.

use crate::api::{ApiError, ChatResponse, ChatService, HttpChatService};
use crate::config::Config;
use crate::conversation::{Connectivity, Conversation, Message};
use crate::ui::chat::commands::{SlashCommand, get_help_text};
use crate::ui::chat::composer::{Composer, ComposerResult};
use crate::ui::chat::history::TranscriptView;
use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Actions the chat screen asks the event loop to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    None,
    Exit,
}

struct Overlay {
    title: &'static str,
    body: String,
}

/// Owns the conversation, the service handle, and the screen components.
pub struct ChatManager {
    conversation: Conversation,
    service: Arc<HttpChatService>,
    composer: Composer,
    pending: Option<oneshot::Receiver<Result<ChatResponse, ApiError>>>,
    overlay: Option<Overlay>,
    show_timestamps: bool,
}

impl ChatManager {
    pub fn new(service: Arc<HttpChatService>, config: &Config) -> Self {
        Self {
            conversation: Conversation::new(),
            service,
            composer: Composer::new(
                "Ask me anything about fashion — outfits, colors, trends...".to_string(),
            ),
            pending: None,
            overlay: None,
            show_timestamps: config.ui.show_timestamps,
        }
    }

    /// Run the single startup health probe.
    pub async fn check_connection(&mut self) {
        let service = self.service.clone();
        self.conversation.check_connection(service.as_ref()).await;
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ChatAction {
        if self.overlay.is_some() {
            // Any of the usual dismiss keys closes the overlay.
            use crossterm::event::{KeyCode, KeyEventKind};
            if key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q'))
            {
                self.overlay = None;
            }
            return ChatAction::None;
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.submit(text);
                ChatAction::None
            }
            ComposerResult::Command(command) => self.handle_command(command),
            ComposerResult::None => ChatAction::None,
        }
    }

    /// Kick off a send. The user message appears immediately; the reply
    /// arrives through `poll_reply`. A submit while a send is pending is
    /// dropped and the composer keeps its text.
    fn submit(&mut self, text: String) {
        let Some(outgoing) = self.conversation.begin_send(&text) else {
            return;
        };

        self.composer.clear();

        let (tx, rx) = oneshot::channel();
        let service = self.service.clone();
        tokio::spawn(async move {
            let result = service.send(&outgoing.message, &outgoing.history).await;
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
    }

    /// Deliver a finished reply into the transcript. Called every tick.
    pub fn poll_reply(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.conversation.complete_send(result);
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                // The reply task died; surface it like any failed send.
                self.conversation
                    .complete_send(Err(ApiError::Request("reply task dropped".to_string())));
                self.pending = None;
            }
        }
    }

    fn handle_command(&mut self, command: SlashCommand) -> ChatAction {
        self.composer.clear();
        match command {
            SlashCommand::Help => {
                self.overlay = Some(Overlay {
                    title: "Help",
                    body: get_help_text(),
                });
                ChatAction::None
            }
            SlashCommand::Status => {
                self.overlay = Some(Overlay {
                    title: "Status",
                    body: self.status_text(),
                });
                ChatAction::None
            }
            SlashCommand::Bye => ChatAction::Exit,
        }
    }

    fn status_text(&self) -> String {
        let connectivity = match self.conversation.connectivity() {
            Connectivity::Reachable => "reachable",
            Connectivity::Unreachable => "unreachable",
            Connectivity::Unknown => "not yet probed",
        };

        format!(
            "Service: {}\nConnectivity: {}\nMessages this session: {}\nSend in flight: {}",
            self.service.base_url(),
            connectivity,
            self.conversation.transcript().len(),
            if self.conversation.is_sending() { "yes" } else { "no" },
        )
    }

    /// Build the widget for this frame.
    pub fn view(&self) -> ChatScreen<'_> {
        ChatScreen {
            messages: self.conversation.transcript(),
            connectivity: self.conversation.connectivity(),
            sending: self.conversation.is_sending(),
            composer: &self.composer,
            overlay: self.overlay.as_ref(),
            show_timestamps: self.show_timestamps,
        }
    }
}

/// One frame of the chat screen: header, transcript, composer, overlay.
pub struct ChatScreen<'a> {
    messages: &'a [Message],
    connectivity: Connectivity,
    sending: bool,
    composer: &'a Composer,
    overlay: Option<&'a Overlay>,
    show_timestamps: bool,
}

impl Widget for ChatScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        let (indicator, style) = match self.connectivity {
            Connectivity::Reachable => ("● online", Style::default().fg(Color::Green)),
            Connectivity::Unreachable => ("● offline", Style::default().fg(Color::Red)),
            Connectivity::Unknown => ("○ connecting", Style::default().fg(Color::DarkGray)),
        };

        let header = Line::from(vec![
            Span::styled(
                "🧵 Modista",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(indicator, style),
            Span::styled("   /help for commands", Style::default().fg(Color::DarkGray)),
        ]);
        buf.set_line(chunks[0].x, chunks[0].y, &header, chunks[0].width);

        TranscriptView::new(self.messages, self.sending, self.show_timestamps)
            .render(chunks[1], buf);

        self.composer.render(chunks[2], buf);

        if let Some(overlay) = self.overlay {
            render_overlay(overlay, area, buf);
        }
    }
}

fn render_overlay(overlay: &Overlay, area: Rect, buf: &mut Buffer) {
    let lines: Vec<&str> = overlay.body.lines().collect();
    let width = (area.width.saturating_sub(4)).min(64).max(20);
    let height = ((lines.len() + 2) as u16).min(area.height.saturating_sub(2));

    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(overlay.title)
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    block.render(popup, buf);

    for (i, text) in lines.iter().enumerate() {
        if i >= inner.height as usize {
            break;
        }
        let line = Line::from(vec![Span::raw((*text).to_string())]);
        buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
    }
}
