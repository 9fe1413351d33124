//! Frontend abstraction layer
//!
//! This module defines the `Frontend` trait the terminal frontend implements.
//! It provides a unified interface for event polling, rendering, and cleanup.

pub mod events;
pub mod tui;

use anyhow::Result;
pub use events::FrontendEvent;
pub use tui::{TerminalTitle, TuiFrontend};

/// Frontend trait
///
/// Separates drawing and input capture from the demo application, which only
/// ever sees `FrontendEvent`s.
pub trait Frontend {
    /// Poll for user input events
    ///
    /// Returns all pending events converted to `FrontendEvent` (empty if none
    /// arrived within the poll timeout).
    fn poll_events(&mut self) -> Result<Vec<FrontendEvent>>;

    /// Render the current application state
    ///
    /// `app` is the `DemoApp`; a mutable reference lets the frontend store the
    /// page layout (click targets, scroll clamp) back into it.
    fn render(&mut self, app: &mut dyn std::any::Any) -> Result<()>;

    /// Restore the terminal before the application exits
    fn cleanup(&mut self) -> Result<()>;
}
