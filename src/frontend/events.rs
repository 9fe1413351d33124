//! Frontend-agnostic input events.
//!
//! The terminal frontend translates its native crossterm stream into this enum
//! so the application only handles one event shape.

use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};

/// Events emitted by the frontend, in a unified format
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendEvent {
    /// Keyboard input
    Key {
        code: KeyCode,
        modifiers: KeyModifiers,
    },
    /// Mouse input
    Mouse {
        kind: MouseEventKind,
        x: u16,
        y: u16,
        modifiers: KeyModifiers,
    },
    /// Terminal resize
    Resize { width: u16, height: u16 },
    /// Bracketed paste
    Paste { text: String },
}

impl FrontendEvent {
    /// Create a key event
    pub fn key(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::Key { code, modifiers }
    }

    /// Create a mouse event
    pub fn mouse(kind: MouseEventKind, x: u16, y: u16, modifiers: KeyModifiers) -> Self {
        Self::Mouse {
            kind,
            x,
            y,
            modifiers,
        }
    }

    pub fn resize(width: u16, height: u16) -> Self {
        Self::Resize { width, height }
    }

    pub fn paste(text: String) -> Self {
        Self::Paste { text }
    }
}
