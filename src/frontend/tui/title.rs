//! Document title port backed by the terminal window title.

use crate::core::ports::DocumentMeta;
use crossterm::{execute, terminal::SetTitle};
use std::cell::RefCell;
use std::io;

/// Writes titles to the terminal (OSC 0) and remembers the last one for the
/// status bar
#[derive(Debug, Default)]
pub struct TerminalTitle {
    current: RefCell<Option<String>>,
    emit: bool,
}

impl TerminalTitle {
    pub fn new() -> Self {
        Self {
            current: RefCell::new(None),
            emit: true,
        }
    }

    /// Track titles without touching the terminal
    #[cfg(test)]
    pub fn detached() -> Self {
        Self::default()
    }
}

impl DocumentMeta for TerminalTitle {
    fn set_title(&self, title: &str) {
        if self.emit {
            if let Err(e) = execute!(io::stdout(), SetTitle(title)) {
                tracing::warn!("Failed to set terminal title: {}", e);
            }
        }
        tracing::debug!(title, "document title changed");
        *self.current.borrow_mut() = Some(title.to_string());
    }

    fn title(&self) -> Option<String> {
        self.current.borrow().clone()
    }
}
