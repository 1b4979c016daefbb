//! Interactive chat session: terminal lifecycle and the event loop.

use crate::api::HttpChatService;
use crate::config::Config;
use crate::ui::chat::{ChatAction, ChatManager};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Run the chat screen until the user exits.
pub async fn run(config: Config) -> Result<()> {
    let service = Arc::new(HttpChatService::new(&config)?);
    let mut manager = ChatManager::new(service, &config);

    // Single startup probe; seeds the welcome message or the
    // connectivity notice before the first frame.
    manager.check_connection().await;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let tick = Duration::from_millis(config.ui.tick_rate_ms.max(10));
    let result = run_loop(&mut terminal, &mut manager, tick).await;

    // Restore the terminal even when the loop errored.
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    manager: &mut ChatManager,
    tick: Duration,
) -> Result<()> {
    loop {
        manager.poll_reply();

        terminal
            .draw(|f| f.render_widget(manager.view(), f.size()))
            .context("Failed to draw frame")?;

        if !event::poll(tick).context("Failed to poll terminal events")? {
            continue;
        }

        match event::read().context("Failed to read terminal event")? {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Press
                    && key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if manager.handle_key(key) == ChatAction::Exit {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}
