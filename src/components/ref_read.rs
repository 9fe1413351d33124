//! Measures its text on every attach and writes the width to the document title.

use super::INITIAL_TEXT;
use crate::core::hooks::StateCell;
use crate::core::ports::DocumentMeta;
use crate::core::runtime::{Component, RenderContext};
use crate::data::document::NodeHandle;
use crate::data::element::Element;
use std::any::Any;
use std::rc::Rc;

/// Attachment callback body: `Width:<w>` into the title, nothing on detach
pub fn write_width_title(meta: &dyn DocumentMeta, node: Option<NodeHandle>) {
    let Some(node) = node else {
        return;
    };
    let width = node.width();
    meta.set_title(&format!("Width:{}", width));
}

pub struct MeasureToTitle {
    text: StateCell<String>,
    meta: Rc<dyn DocumentMeta>,
}

impl MeasureToTitle {
    pub fn new(meta: Rc<dyn DocumentMeta>) -> Self {
        Self {
            text: StateCell::new(INITIAL_TEXT.to_string()),
            meta,
        }
    }
}

impl Component for MeasureToTitle {
    fn name(&self) -> &'static str {
        "ref-read"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let text = cx.read(&self.text);
        let cell = self.text.clone();
        let meta = Rc::clone(&self.meta);

        Element::container()
            .child(Element::text_input(text.clone()).on_change(move |value| cell.set(value)))
            .child(
                Element::container().child(
                    Element::span()
                        .text(text)
                        .attach(move |node| write_width_title(meta.as_ref(), node)),
                ),
            )
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
