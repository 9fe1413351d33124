//! Counter whose value lives only in the displayed node's text.
//! Clicking never renders; the node is read, parsed and written back.

use crate::core::hooks::{EffectDeps, RefHandle};
use crate::core::runtime::{Component, RenderContext};
use crate::data::document::NodeHandle;
use crate::data::element::Element;
use std::any::Any;

/// Read the displayed integer, add one, write it back
pub fn increment_display(display: &RefHandle<Option<NodeHandle>>) {
    let Some(node) = display.get() else {
        return;
    };
    let current = node.text_content();
    let value = match current.trim().parse::<i64>() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(text = %current, error = %e, "display is not a number, restarting at 0");
            0
        }
    };
    node.set_text_content((value + 1).to_string());
}

pub struct ImperativeCounter {
    display: RefHandle<Option<NodeHandle>>,
}

impl ImperativeCounter {
    pub fn new() -> Self {
        Self {
            display: RefHandle::default(),
        }
    }
}

impl Default for ImperativeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ImperativeCounter {
    fn name(&self) -> &'static str {
        "imperative-state"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let display = self.display.clone();
        cx.effect(EffectDeps::Once, move || {
            if let Some(node) = display.get() {
                node.set_text_content("0");
            }
        });

        let display = self.display.clone();
        Element::container()
            .child(Element::container().child(Element::span().node_ref(self.display.clone())))
            .child(Element::button("Increase").on_click(move || increment_display(&display)))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
