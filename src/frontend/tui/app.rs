use crate::core::DemoApp;
use crate::data::page::PageLayout;
use crate::frontend::{Frontend, FrontendEvent};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// TUI Frontend using ratatui
///
/// Renders the demo page with ratatui and handles events via crossterm.
pub struct TuiFrontend {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    poll_timeout: Duration,
    restored: bool,
}

impl TuiFrontend {
    /// Create a new TUI frontend
    ///
    /// Initializes terminal in raw mode, enables mouse capture and bracketed
    /// paste, and enters alternate screen.
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )
        .context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor()?;

        Ok(Self {
            terminal,
            poll_timeout: Duration::from_millis(16), // ~60 FPS
            restored: false,
        })
    }

    /// Set poll timeout (for controlling frame rate)
    pub fn set_poll_timeout(&mut self, timeout: Duration) {
        self.poll_timeout = timeout;
    }

    /// Convert crossterm event to FrontendEvent
    fn convert_event(event: Event) -> Option<FrontendEvent> {
        match event {
            Event::Key(key_event) => {
                // Only process key press events (ignore repeats and releases)
                if key_event.kind != KeyEventKind::Press {
                    return None;
                }
                Some(FrontendEvent::key(key_event.code, key_event.modifiers))
            }
            Event::Mouse(mouse_event) => Some(FrontendEvent::mouse(
                mouse_event.kind,
                mouse_event.column,
                mouse_event.row,
                mouse_event.modifiers,
            )),
            Event::Resize(w, h) => Some(FrontendEvent::resize(w, h)),
            Event::Paste(text) => Some(FrontendEvent::paste(text)),
            _ => None,
        }
    }
}

/// Draw the page into `area`, with an optional one-line status bar on top
pub fn draw_page(
    frame: &mut Frame,
    area: Rect,
    page: &PageLayout,
    scroll: usize,
    status: Option<&str>,
) {
    let mut body = area;
    if let Some(text) = status {
        if area.height > 0 {
            let bar = Rect::new(area.x, area.y, area.width, 1);
            let line = Line::from(vec![
                Span::raw(" "),
                Span::styled(text.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            ]);
            frame.render_widget(
                Paragraph::new(line).style(Style::default().fg(Color::Black).bg(Color::Gray)),
                bar,
            );
            body = Rect::new(area.x, area.y + 1, area.width, area.height - 1);
        }
    }

    let visible: Vec<Line<'static>> = page
        .lines
        .iter()
        .skip(scroll)
        .take(usize::from(body.height))
        .cloned()
        .collect();
    frame.render_widget(Paragraph::new(visible), body);
}

impl Frontend for TuiFrontend {
    fn poll_events(&mut self) -> Result<Vec<FrontendEvent>> {
        let mut events = Vec::new();

        // Block for the first event, then drain whatever else is queued
        let mut timeout = self.poll_timeout;
        while event::poll(timeout)? {
            if let Ok(ev) = event::read() {
                if let Some(frontend_event) = Self::convert_event(ev) {
                    events.push(frontend_event);
                }
            }
            timeout = Duration::ZERO;
        }

        Ok(events)
    }

    fn render(&mut self, app: &mut dyn std::any::Any) -> Result<()> {
        let app = app
            .downcast_mut::<DemoApp>()
            .context("render() called with wrong type - expected DemoApp")?;

        let size = self.terminal.size()?;
        app.refresh_layout(size.width, size.height);
        let status = app.config.ui.show_status_bar.then(|| app.status_line());

        self.terminal.draw(|f| {
            draw_page(f, f.area(), app.page(), app.scroll(), status.as_deref());
        })?;

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TuiFrontend {
    fn drop(&mut self) {
        // Ensure terminal is restored even if cleanup() wasn't called
        let _ = self.cleanup();
    }
}
