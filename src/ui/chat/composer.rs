use crate::ui::chat::commands::{CommandEntry, SlashCommand, command_entries, parse_slash_command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
struct TextAreaState {
    content: String,
    /// Byte offset into `content`, always on a char boundary.
    cursor: usize,
}

/// Message input box with a slash-command palette.
///
/// Submitting does NOT clear the input; the caller clears it once the
/// send is accepted, so a dropped submit keeps the user's text.
pub struct Composer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl Composer {
    pub fn new(placeholder: String) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                } else if !state.content.trim().is_empty() {
                    let content = state.content.clone();
                    drop(state);
                    if let Some(command) = parse_slash_command(&content) {
                        return ComposerResult::Command(command);
                    }
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);

                if c == '/' && state.content == "/" {
                    self.open_command_palette(&state);
                } else if self.show_command_palette.get() {
                    if state.content.starts_with('/') && !c.is_whitespace() {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) && self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) && self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Left => {
                state.cursor = prev_boundary(&state.content, state.cursor);
            }
            KeyCode::Right => {
                state.cursor = next_boundary(&state.content, state.cursor);
            }
            KeyCode::Home => {
                state.cursor = 0;
            }
            KeyCode::End => {
                state.cursor = state.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor, c);
        state.cursor += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor == 0 {
            return false;
        }
        let start = prev_boundary(&state.content, state.cursor);
        state.content.replace_range(start..state.cursor, "");
        state.cursor = start;
        true
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor >= state.content.len() {
            return false;
        }
        let end = next_boundary(&state.content, state.cursor);
        state.content.replace_range(state.cursor..end, "");
        true
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.refresh_command_palette(state);
        self.selected_command.set(Some(0));
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            self.selected_command.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let current = self.selected_command.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let mut next = current + delta;

        if next < 0 {
            next = len - 1;
        } else if next >= len {
            next = 0;
        }

        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) {
        let filtered = self.filtered_commands.borrow();
        let Some(index) = self.selected_command.get() else {
            return;
        };
        let Some(entry) = filtered.get(index).copied() else {
            return;
        };

        drop(filtered);
        state.content = format!("/{}", entry.keyword);
        state.cursor = state.content.len();
        self.close_command_palette();
    }

    /// Get current content
    #[allow(dead_code)]
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Clear content
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.content.clear();
        state.cursor = 0;
        self.close_command_palette();
    }
}

/// Byte offset of the char boundary before `pos`.
fn prev_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map_or(0, |(i, _)| i)
}

/// Byte offset of the char boundary after `pos`.
fn next_boundary(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8())
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("✍️  Your message")
            .style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            // Render content with cursor indicator
            let mut content = state.content.clone();
            content.insert(state.cursor.min(content.len()), '▌');

            for (i, line_text) in content.split('\n').enumerate() {
                if i < inner_area.height as usize {
                    let line = Line::from(vec![Span::raw(line_text.to_string())]);
                    buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
                }
            }
        }

        // Render command palette if active
        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: inner_area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if selected == Some(index) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" — ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_accumulates_and_enter_submits() {
        let composer = Composer::new("...".to_string());
        type_text(&composer, "navy blue");

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Submitted("navy blue".to_string()));
        // The caller clears on accept; the text survives a dropped submit.
        assert_eq!(composer.content(), "navy blue");
    }

    #[test]
    fn enter_on_blank_input_submits_nothing() {
        let composer = Composer::new("...".to_string());
        type_text(&composer, "   ");
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::None);
    }

    #[test]
    fn slash_input_parses_as_command() {
        let composer = Composer::new("...".to_string());
        type_text(&composer, "/bye");
        composer.handle_key(press(KeyCode::Esc));

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Command(SlashCommand::Bye));
    }

    #[test]
    fn backspace_handles_multibyte_chars() {
        let composer = Composer::new("...".to_string());
        type_text(&composer, "café");
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "caf");
    }

    #[test]
    fn clear_resets_content_and_palette() {
        let composer = Composer::new("...".to_string());
        type_text(&composer, "/he");
        composer.clear();
        assert_eq!(composer.content(), "");
        assert!(!composer.show_command_palette.get());
    }
}
