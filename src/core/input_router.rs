//! Input routing for the demo page
//!
//! Routes keyboard input to an `InputAction` based on:
//! - Global keys (quit, focus cycling, paging)
//! - The kind of node holding focus (buttons activate, inputs edit)

use crate::data::element::ElementKind;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    FocusNext,
    FocusPrev,
    /// Click the focused button
    Activate,
    /// Forward to the focused input's editor
    Edit(KeyEvent),
    ScrollLines(i32),
    ScrollPages(i32),
    None,
}

/// Route a key event given the kind of the focused node (if any)
pub fn route_key(key: KeyEvent, focused: Option<ElementKind>) -> InputAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return InputAction::Quit,
        KeyCode::Char('c') if ctrl => return InputAction::Quit,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
            return InputAction::FocusPrev
        }
        KeyCode::Tab => return InputAction::FocusNext,
        KeyCode::BackTab => return InputAction::FocusPrev,
        KeyCode::PageUp => return InputAction::ScrollPages(-1),
        KeyCode::PageDown => return InputAction::ScrollPages(1),
        _ => {}
    }

    match focused {
        Some(ElementKind::Button) => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => InputAction::Activate,
            KeyCode::Up => InputAction::ScrollLines(-1),
            KeyCode::Down => InputAction::ScrollLines(1),
            _ => InputAction::None,
        },
        Some(ElementKind::TextInput) => match key.code {
            // Single-line fields
            KeyCode::Enter | KeyCode::Up | KeyCode::Down => InputAction::None,
            // The editor reads these as newlines
            KeyCode::Char('m' | 'j') if ctrl => InputAction::None,
            KeyCode::Char(_)
            | KeyCode::Backspace
            | KeyCode::Delete
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End => InputAction::Edit(key),
            _ => InputAction::None,
        },
        _ => match key.code {
            KeyCode::Up => InputAction::ScrollLines(-1),
            KeyCode::Down => InputAction::ScrollLines(1),
            _ => InputAction::None,
        },
    }
}
