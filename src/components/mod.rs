//! The demo components
//!
//! Each leaf shows one way of using a ref; `RefExamples` stacks them with
//! headings and rules. Leaves share nothing with each other.

pub mod app;
pub mod dom_focus;
pub mod imperative_counter;
pub mod instance_variable;
pub mod ref_read;
pub mod ref_read_state_write;
pub mod ref_read_write;

pub use app::RefExamples;
pub use dom_focus::{FocusInputProps, FocusOnMountInput};
pub use imperative_counter::ImperativeCounter;
pub use instance_variable::InstanceVariableCounter;
pub use ref_read::MeasureToTitle;
pub use ref_read_state_write::MeasureToState;
pub use ref_read_write::MeasureToStyle;

use ratatui::style::Color;

/// Width (in measurement units) at which text counts as large
pub const LARGE_WIDTH_THRESHOLD: u32 = 150;

/// Initial text of the measuring components
pub const INITIAL_TEXT: &str = "Some text ...";

/// Threshold and colors shared by the measuring components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSettings {
    pub large_threshold: u32,
    pub large_color: Color,
    pub small_color: Color,
}

impl MeasureSettings {
    pub fn is_large(&self, width: u32) -> bool {
        width >= self.large_threshold
    }

    pub fn color_for(&self, large: bool) -> Color {
        if large {
            self.large_color
        } else {
            self.small_color
        }
    }
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            large_threshold: LARGE_WIDTH_THRESHOLD,
            large_color: Color::Red,
            small_color: Color::Blue,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::runtime::Runtime;
    use crate::data::document::{Metrics, NodeId};
    use crate::data::element::ElementKind;

    pub fn runtime() -> Runtime {
        Runtime::new(Metrics::default())
    }

    /// First node of `kind` in document order
    pub fn first(runtime: &Runtime, kind: ElementKind) -> NodeId {
        runtime.document().find_by_kind(kind)[0]
    }

    pub fn text_of(runtime: &Runtime, id: NodeId) -> String {
        runtime.document().node(id).map(|n| n.text.clone()).unwrap_or_default()
    }

    /// Texts of all nodes of `kind`, in document order
    pub fn texts(runtime: &Runtime, kind: ElementKind) -> Vec<String> {
        let doc = runtime.document();
        let texts = doc
            .find_by_kind(kind)
            .into_iter()
            .filter_map(|id| doc.node(id).map(|n| n.text.clone()))
            .collect();
        texts
    }
}
