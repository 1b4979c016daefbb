//! Transcript display component

use crate::conversation::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the conversation transcript, newest messages anchored at the
/// bottom, with a typing indicator while a send is in flight.
pub struct TranscriptView<'a> {
    messages: &'a [Message],
    sending: bool,
    show_timestamps: bool,
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message], sending: bool, show_timestamps: bool) -> Self {
        Self {
            messages,
            sending,
            show_timestamps,
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            Role::User => "👤",
            Role::Assistant => "🧵",
        };

        let header = if self.show_timestamps {
            let timestamp = message.timestamp.format("%H:%M:%S").to_string();
            format!("{} {} {}", role_icon, timestamp, "─".repeat(20))
        } else {
            format!("{} {}", role_icon, "─".repeat(24))
        };

        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let content_style = match message.role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Assistant => Style::default().fg(Color::Green),
        };

        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style),
            ]));
        }

        lines
    }

    /// Typing indicator with animated dots while a reply is pending.
    fn render_pending(&self) -> Line<'static> {
        let dots = match (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            / 300)
            % 4
        {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        };

        Line::from(vec![
            Span::styled("🧵 ", Style::default().fg(Color::Green)),
            Span::styled("thinking", Style::default().fg(Color::Green)),
            Span::styled(dots.to_string(), Style::default().fg(Color::Yellow)),
        ])
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(self.render_message(message, inner_area.width));
            // spacing between messages
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        if self.sending {
            all_lines.push(self.render_pending());
        }

        // Show the tail of the conversation that fits.
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);

        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.len() + word.len() + 1 <= width || current_line.is_empty() {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("pair tailored trousers with a blouse and a blazer", 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 20));
    }

    #[test]
    fn wrap_text_keeps_explicit_newlines() {
        let lines = wrap_text("first\nsecond", 40);
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn wrap_text_handles_zero_width() {
        assert_eq!(wrap_text("anything", 0), vec!["anything".to_string()]);
    }
}
