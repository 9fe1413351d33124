//! Root view: every demo in a fixed order, each under its heading.

use super::{
    FocusInputProps, FocusOnMountInput, ImperativeCounter, InstanceVariableCounter,
    MeasureSettings, MeasureToState, MeasureToStyle, MeasureToTitle,
};
use crate::core::ports::DocumentMeta;
use crate::core::runtime::{Component, RenderContext};
use crate::data::element::Element;
use std::any::Any;
use std::rc::Rc;

pub const TITLE: &str = "React Ref Examples";

/// Section headings in display order, paired with the child component key
pub const SECTIONS: [(&str, &str); 6] = [
    ("Component With Ref with Instance Variable", "instance-variable"),
    ("Component With Ref with DOM API", "dom-api"),
    ("Component With Ref Read", "ref-read"),
    ("Component With Ref Read & Ref Write", "ref-read-write"),
    ("Component With Ref Read & State Write", "ref-read-state-write"),
    ("Component With Ref for imperative State", "imperative-state"),
];

pub struct RefExamples {
    meta: Rc<dyn DocumentMeta>,
    settings: MeasureSettings,
}

impl RefExamples {
    pub fn new(meta: Rc<dyn DocumentMeta>, settings: MeasureSettings) -> Self {
        Self { meta, settings }
    }

    fn section(&self, key: &'static str) -> Element {
        match key {
            "instance-variable" => Element::component(key, InstanceVariableCounter::new()),
            "dom-api" => Element::component(
                key,
                FocusOnMountInput::new(FocusInputProps {
                    label: "Label".to_string(),
                    value: "Value".to_string(),
                    is_focus: true,
                }),
            ),
            "ref-read" => Element::component(key, MeasureToTitle::new(Rc::clone(&self.meta))),
            "ref-read-write" => Element::component(key, MeasureToStyle::new(self.settings)),
            "ref-read-state-write" => Element::component(key, MeasureToState::new(self.settings)),
            _ => Element::component(key, ImperativeCounter::new()),
        }
    }
}

impl Component for RefExamples {
    fn name(&self) -> &'static str {
        "ref-examples"
    }

    fn render(&mut self, _cx: &mut RenderContext) -> Element {
        let mut root = Element::container()
            .child(Element::heading(1, TITLE))
            .child(Element::rule());

        for (index, &(heading, key)) in SECTIONS.iter().enumerate() {
            if index > 0 {
                root = root.child(Element::rule());
            }
            root = root
                .child(Element::heading(2, heading))
                .child(self.section(key));
        }
        root
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::instance_variable::{FIRST_RENDER_LABEL, RE_RENDER_LABEL};
    use crate::components::test_support::runtime;
    use crate::core::ports::RecordingMeta;
    use crate::core::runtime::Runtime;
    use crate::data::element::ElementKind;

    fn mounted() -> (Runtime, Rc<RecordingMeta>) {
        let meta = Rc::new(RecordingMeta::new());
        let mut rt = runtime();
        rt.mount(RefExamples::new(meta.clone(), MeasureSettings::default()))
            .unwrap();
        (rt, meta)
    }

    /// Texts of paragraphs inside the component mounted under `key`
    fn paragraphs_in(rt: &Runtime, key: &str) -> Vec<String> {
        let doc = rt.document();
        let Some(scope) = doc.find_component(key) else {
            return Vec::new();
        };
        let texts = doc
            .descendants(scope)
            .into_iter()
            .filter_map(|id| doc.node(id))
            .filter(|n| n.kind == ElementKind::Paragraph)
            .map(|n| n.text.clone())
            .collect();
        texts
    }

    #[test]
    fn test_layout_order() {
        let (rt, _) = mounted();
        let doc = rt.document();

        let headings: Vec<String> = doc
            .find_by_kind(ElementKind::Heading(2))
            .into_iter()
            .map(|id| doc.node(id).unwrap().text.clone())
            .collect();
        let expected: Vec<&str> = SECTIONS.iter().map(|(h, _)| *h).collect();
        assert_eq!(headings, expected);

        assert_eq!(doc.find_by_kind(ElementKind::Heading(1)).len(), 1);
        assert_eq!(doc.find_by_kind(ElementKind::Rule).len(), 6);
        for (_, key) in SECTIONS {
            assert!(doc.find_component(key).is_some(), "missing {}", key);
        }
        assert_eq!(rt.instance_count(), 7);
    }

    #[test]
    fn test_mount_side_effects() {
        let (rt, meta) = mounted();
        let doc = rt.document();

        // DOM API section focused its input
        let dom_api = doc.find_component("dom-api").unwrap();
        let input = doc
            .descendants(dom_api)
            .into_iter()
            .find(|id| doc.node(*id).unwrap().kind == ElementKind::TextInput);
        assert_eq!(doc.focused(), input);

        // Title came from the ref-read section
        assert_eq!(meta.title().as_deref(), Some("Width:104"));

        // Imperative counter starts at zero
        let imperative = doc.find_component("imperative-state").unwrap();
        let span = doc
            .descendants(imperative)
            .into_iter()
            .find(|id| doc.node(*id).unwrap().kind == ElementKind::Span)
            .unwrap();
        assert_eq!(doc.node(span).unwrap().text, "0");
    }

    #[test]
    fn test_end_to_end_increment() {
        let (mut rt, _) = mounted();
        assert_eq!(
            paragraphs_in(&rt, "instance-variable"),
            vec!["0", FIRST_RENDER_LABEL]
        );

        let button = {
            let doc = rt.document();
            let scope = doc.find_component("instance-variable").unwrap();
            let button = doc
                .descendants(scope)
                .into_iter()
                .find(|id| doc.node(*id).unwrap().kind == ElementKind::Button)
                .unwrap();
            button
        };
        rt.click(button).unwrap();

        assert_eq!(
            paragraphs_in(&rt, "instance-variable"),
            vec!["1", RE_RENDER_LABEL]
        );
    }
}
