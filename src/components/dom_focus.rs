//! Labelled input that grabs focus through its node handle.

use crate::core::hooks::{EffectDeps, RefHandle};
use crate::core::runtime::{Component, RenderContext};
use crate::data::document::NodeHandle;
use crate::data::element::Element;
use std::any::Any;

/// Parent-supplied props. The input value is controlled by the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusInputProps {
    pub label: String,
    pub value: String,
    pub is_focus: bool,
}

pub struct FocusOnMountInput {
    props: FocusInputProps,
    input: RefHandle<Option<NodeHandle>>,
}

impl FocusOnMountInput {
    pub fn new(props: FocusInputProps) -> Self {
        Self {
            props,
            input: RefHandle::default(),
        }
    }
}

impl Component for FocusOnMountInput {
    fn name(&self) -> &'static str {
        "dom-api"
    }

    fn render(&mut self, cx: &mut RenderContext) -> Element {
        let is_focus = self.props.is_focus;
        let input = self.input.clone();
        // Only a change of `is_focus` reruns this
        cx.effect(EffectDeps::on(&is_focus), move || {
            if is_focus {
                if let Some(node) = input.get() {
                    node.focus();
                }
            }
        });

        Element::label()
            .child(Element::raw(format!("{}: ", self.props.label)))
            .child(Element::text_input(self.props.value.clone()).node_ref(self.input.clone()))
    }

    fn receive(&mut self, next: &mut dyn Component) -> bool {
        match next.as_any_mut().downcast_mut::<FocusOnMountInput>() {
            Some(next) if next.props != self.props => {
                self.props = next.props.clone();
                true
            }
            _ => false,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
