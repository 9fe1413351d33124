//! Declarative element descriptions
//!
//! Components return an `Element` tree from `render`; the runtime reconciles it
//! against the realized [`Document`](super::document::Document).

use super::document::NodeHandle;
use crate::core::hooks::RefHandle;
use crate::core::runtime::Component;
use ratatui::style::Color;
use serde::Serialize;
use std::rc::Rc;

pub type ClickHandler = Rc<dyn Fn()>;
pub type ChangeHandler = Rc<dyn Fn(String)>;
pub type AttachCallback = Rc<dyn Fn(Option<NodeHandle>)>;

/// Types of nodes the host knows how to realize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Container,
    Heading(u8),
    Paragraph,
    Label,
    Span,
    Text,
    TextInput,
    Button,
    Rule,
    /// Placeholder owning a child component instance
    Component,
}

impl ElementKind {
    /// Block nodes start on a new line
    pub fn is_block(self) -> bool {
        matches!(
            self,
            ElementKind::Container
                | ElementKind::Heading(_)
                | ElementKind::Paragraph
                | ElementKind::Label
                | ElementKind::Rule
        )
    }

    pub fn is_focusable(self) -> bool {
        matches!(self, ElementKind::TextInput | ElementKind::Button)
    }
}

/// Inline visual style of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStyle {
    pub fg: Option<Color>,
}

impl NodeStyle {
    pub fn fg(color: Color) -> Self {
        Self { fg: Some(color) }
    }
}

/// How a node is bound back to its component
#[derive(Clone)]
pub enum NodeRef {
    /// Object handle: set to the node on attach, cleared on detach
    Handle(RefHandle<Option<NodeHandle>>),
    /// Attachment callback: invoked with the node on attach, `None` on detach
    Callback(AttachCallback),
}

/// Child component carried by an element
pub struct ComponentSlot {
    pub key: &'static str,
    pub component: Box<dyn Component>,
}

/// A declarative node description
pub struct Element {
    pub kind: ElementKind,
    pub text: Option<String>,
    pub style: Option<NodeStyle>,
    pub node_ref: Option<NodeRef>,
    pub on_click: Option<ClickHandler>,
    pub on_change: Option<ChangeHandler>,
    pub children: Vec<Element>,
    pub slot: Option<ComponentSlot>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            text: None,
            style: None,
            node_ref: None,
            on_click: None,
            on_change: None,
            children: Vec::new(),
            slot: None,
        }
    }

    pub fn container() -> Self {
        Self::new(ElementKind::Container)
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(ElementKind::Heading(level)).text(text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Paragraph).text(text)
    }

    pub fn label() -> Self {
        Self::new(ElementKind::Label)
    }

    pub fn span() -> Self {
        Self::new(ElementKind::Span)
    }

    /// Bare inline text
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Text).text(text)
    }

    /// Text field showing `value`
    pub fn text_input(value: impl Into<String>) -> Self {
        Self::new(ElementKind::TextInput).text(value)
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Button).text(label)
    }

    pub fn rule() -> Self {
        Self::new(ElementKind::Rule)
    }

    /// Mount (or keep) a child component under `key`
    pub fn component(key: &'static str, component: impl Component) -> Self {
        let mut element = Self::new(ElementKind::Component);
        element.slot = Some(ComponentSlot {
            key,
            component: Box::new(component),
        });
        element
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn node_ref(mut self, handle: RefHandle<Option<NodeHandle>>) -> Self {
        self.node_ref = Some(NodeRef::Handle(handle));
        self
    }

    /// Attach a callback invoked with the realized node (or `None` on detach)
    pub fn attach(mut self, callback: impl Fn(Option<NodeHandle>) + 'static) -> Self {
        self.node_ref = Some(NodeRef::Callback(Rc::new(callback)));
        self
    }

    pub fn on_click(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    pub fn on_change(mut self, handler: impl Fn(String) + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn slot_key(&self) -> Option<&'static str> {
        self.slot.as_ref().map(|slot| slot.key)
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("text", &self.text)
            .field("style", &self.style)
            .field("slot", &self.slot_key())
            .field("children", &self.children)
            .finish()
    }
}
