//! Measures its text on every attach and colors the node directly.

use super::{MeasureSettings, INITIAL_TEXT};
use crate::core::hooks::StateCell;
use crate::core::runtime::{Component, RenderContext};
use crate::data::document::NodeHandle;
use crate::data::element::Element;
use std::any::Any;

/// Attachment callback body: paint large/small by width, nothing on detach
pub fn paint_by_width(settings: &MeasureSettings, node: Option<NodeHandle>) {
    let Some(node) = node else {
        return;
    };
    let large = settings.is_large(node.width());
    node.set_color(settings.color_for(large));
}

pub struct MeasureToStyle {
    text: StateCell<String>,
    settings: MeasureSettings,
}

impl MeasureToStyle {
    pub fn new(settings: MeasureSettings) -> Self {
        Self {
            text: StateCell::new(INITIAL_TEXT.to_string()),
            settings,
        }
    }
}

impl Component for MeasureToStyle {
    fn name(&self) -> &'static str {
        "ref-read-write"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let text = cx.read(&self.text);
        let cell = self.text.clone();
        let settings = self.settings;

        // No declarative style on the span: the color is owned by the callback
        Element::container()
            .child(Element::text_input(text.clone()).on_change(move |value| cell.set(value)))
            .child(
                Element::container().child(
                    Element::span()
                        .text(text)
                        .attach(move |node| paint_by_width(&settings, node)),
                ),
            )
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
