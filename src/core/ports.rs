//! Side-effect ports for host document metadata
//!
//! Components never write the title themselves; they are handed a
//! `DocumentMeta` so the terminal and tests can supply their own.

use std::cell::RefCell;

/// Host document metadata (the title)
pub trait DocumentMeta {
    fn set_title(&self, title: &str);

    /// Last title written, if any
    fn title(&self) -> Option<String>;
}

/// Keeps every title written, in order
#[derive(Debug, Default)]
pub struct RecordingMeta {
    titles: RefCell<Vec<String>>,
}

impl RecordingMeta {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn history(&self) -> Vec<String> {
        self.titles.borrow().clone()
    }

    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.titles.borrow().len()
    }
}

impl DocumentMeta for RecordingMeta {
    fn set_title(&self, title: &str) {
        self.titles.borrow_mut().push(title.to_string());
    }

    fn title(&self) -> Option<String> {
        self.titles.borrow().last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_meta_history() {
        let meta = RecordingMeta::new();
        assert_eq!(meta.title(), None);

        meta.set_title("Width:104");
        meta.set_title("Width:160");

        assert_eq!(meta.title().as_deref(), Some("Width:160"));
        assert_eq!(meta.history(), vec!["Width:104", "Width:160"]);
        assert_eq!(meta.writes(), 2);
    }
}
