//! Measures its text on every attach and stores "is large" in state;
//! the color comes from a declarative style.
//!
//! The callback only commits when the measured value differs from the one
//! this render saw, otherwise attach -> render -> attach never settles.

use super::{MeasureSettings, INITIAL_TEXT};
use crate::core::hooks::StateCell;
use crate::core::runtime::{Component, RenderContext};
use crate::data::document::NodeHandle;
use crate::data::element::{Element, NodeStyle};
use std::any::Any;

/// Attachment callback body. `rendered` is the value the current render used.
pub fn store_is_large(
    settings: &MeasureSettings,
    rendered: bool,
    is_large: &StateCell<bool>,
    node: Option<NodeHandle>,
) {
    let Some(node) = node else {
        return;
    };
    let value = settings.is_large(node.width());
    if value != rendered {
        tracing::debug!(large = value, "measured width crossed threshold");
        is_large.set(value);
    }
}

pub struct MeasureToState {
    text: StateCell<String>,
    is_large: StateCell<bool>,
    settings: MeasureSettings,
}

impl MeasureToState {
    pub fn new(settings: MeasureSettings) -> Self {
        Self {
            text: StateCell::new(INITIAL_TEXT.to_string()),
            is_large: StateCell::new(false),
            settings,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_large_cell(&self) -> StateCell<bool> {
        self.is_large.clone()
    }
}

impl Component for MeasureToState {
    fn name(&self) -> &'static str {
        "ref-read-state-write"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let text = cx.read(&self.text);
        let is_large = cx.read(&self.is_large);
        let settings = self.settings;

        let text_cell = self.text.clone();
        let large_cell = self.is_large.clone();
        let style = NodeStyle::fg(settings.color_for(is_large));

        Element::container()
            .child(Element::text_input(text.clone()).on_change(move |value| text_cell.set(value)))
            .child(
                Element::container().child(
                    Element::span()
                        .text(text)
                        .style(style)
                        .attach(move |node| store_is_large(&settings, is_large, &large_cell, node)),
                ),
            )
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
