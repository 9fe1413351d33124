//! Counter with a first-render flag kept in a ref.
//!
//! Flipping the flag never schedules a render. The label only changes because
//! the counter's own re-render happens to read the flag again.

use crate::core::hooks::{EffectDeps, RefHandle, StateCell};
use crate::core::runtime::{Component, RenderContext};
use crate::data::element::Element;
use std::any::Any;

pub const FIRST_RENDER_LABEL: &str = "First render.";
pub const RE_RENDER_LABEL: &str = "Re-render.";

pub struct InstanceVariableCounter {
    count: StateCell<i64>,
    is_first_render: RefHandle<bool>,
}

impl InstanceVariableCounter {
    pub fn new() -> Self {
        Self {
            count: StateCell::new(0),
            is_first_render: RefHandle::new(true),
        }
    }

    #[cfg(test)]
    pub(crate) fn first_render_flag(&self) -> RefHandle<bool> {
        self.is_first_render.clone()
    }
}

impl Default for InstanceVariableCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for InstanceVariableCounter {
    fn name(&self) -> &'static str {
        "instance-variable"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let count = cx.read(&self.count);

        let flag = self.is_first_render.clone();
        cx.effect(EffectDeps::Always, move || {
            if flag.get() {
                flag.set(false);
            } else {
                tracing::info!(count, "post-render effect ran after a re-render");
            }
        });

        let cell = self.count.clone();
        let label = if self.is_first_render.get() {
            FIRST_RENDER_LABEL
        } else {
            RE_RENDER_LABEL
        };

        Element::container()
            .child(Element::paragraph(count.to_string()))
            .child(Element::button("Increase").on_click(move || cell.set(count + 1)))
            .child(Element::paragraph(label))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{first, runtime, texts};
    use crate::data::element::ElementKind;

    #[test]
    fn test_flag_flips_without_render() {
        let counter = InstanceVariableCounter::new();
        let flag = counter.first_render_flag();
        let mut rt = runtime();
        rt.mount(counter).unwrap();

        // The effect cleared the flag but nothing re-rendered
        assert!(!flag.get());
        assert_eq!(rt.render_passes(), 1);
        assert_eq!(texts(&rt, ElementKind::Paragraph), vec!["0", FIRST_RENDER_LABEL]);
    }

    #[test]
    fn test_increments_and_label_never_reverts() {
        let mut rt = runtime();
        rt.mount(InstanceVariableCounter::new()).unwrap();
        let button = first(&rt, ElementKind::Button);

        rt.click(button).unwrap();
        assert_eq!(texts(&rt, ElementKind::Paragraph), vec!["1", RE_RENDER_LABEL]);

        for _ in 0..4 {
            rt.click(button).unwrap();
        }
        assert_eq!(texts(&rt, ElementKind::Paragraph), vec!["5", RE_RENDER_LABEL]);
        assert_eq!(rt.render_passes(), 6);
    }
}
