//! Realized output tree
//!
//! The document is an arena of nodes with stable ids. Components never own
//! nodes; they reach them through [`NodeHandle`]s bound by the runtime.

use super::element::{AttachCallback, ChangeHandler, ClickHandler, ElementKind, NodeStyle};
use crate::core::hooks::{InstanceId, RefHandle};
use ratatui::style::Color;
use ratatui::text::Span;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type SharedDocument = Rc<RefCell<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Geometry conversion for measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    /// Width units per terminal cell
    pub units_per_cell: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { units_per_cell: 8 }
    }
}

/// A realized node
pub struct Node {
    pub id: NodeId,
    pub kind: ElementKind,
    /// Text content (the value for inputs, the label for buttons)
    pub text: String,
    pub style: NodeStyle,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    // Last declarative props applied, so imperative writes survive
    // re-renders that don't mention them
    pub(crate) applied_text: Option<String>,
    pub(crate) applied_style: Option<NodeStyle>,

    pub(crate) on_click: Option<ClickHandler>,
    pub(crate) on_change: Option<ChangeHandler>,
    pub(crate) attach: Option<AttachCallback>,
    pub(crate) handle: Option<RefHandle<Option<NodeHandle>>>,

    /// Set on `Component` placeholders
    pub(crate) slot: Option<(&'static str, InstanceId)>,
}

impl Node {
    fn new(id: NodeId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            text: String::new(),
            style: NodeStyle::default(),
            parent: None,
            children: Vec::new(),
            applied_text: None,
            applied_style: None,
            on_click: None,
            on_change: None,
            attach: None,
            handle: None,
            slot: None,
        }
    }

    pub fn slot_key(&self) -> Option<&'static str> {
        self.slot.map(|(key, _)| key)
    }
}

/// Serializable view of a subtree
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub focused: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[derive(Default)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
    root: Option<NodeId>,
    focused: Option<NodeId>,
    metrics: Metrics,
}

impl Document {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    pub fn shared(metrics: Metrics) -> SharedDocument {
        Rc::new(RefCell::new(Self::new(metrics)))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn create(&mut self, kind: ElementKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind));
        id
    }

    /// Drop a single node from the arena. Callers handle children and refs.
    pub(crate) fn discard(&mut self, id: NodeId) -> Option<Node> {
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.nodes.remove(&id)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move input focus. Non-focusable or missing nodes are ignored.
    pub fn focus(&mut self, id: NodeId) -> bool {
        match self.nodes.get(&id) {
            Some(node) if node.kind.is_focusable() => {
                self.focused = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Rendered width of a node's text, in measurement units
    pub fn measure_width(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(&id).map(|node| {
            let cells = u32::try_from(Span::raw(node.text.as_str()).width()).unwrap_or(u32::MAX);
            cells.saturating_mul(self.metrics.units_per_cell)
        })
    }

    /// Node ids in document order (pre-order), descending through component slots
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root {
            self.walk_from(root, &mut order);
        }
        order
    }

    fn walk_from(&self, id: NodeId, order: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            order.push(id);
            for child in &node.children {
                self.walk_from(*child, order);
            }
        }
    }

    pub fn focusable(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.nodes[id].kind.is_focusable())
            .collect()
    }

    pub fn find_by_kind(&self, kind: ElementKind) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.nodes[id].kind == kind)
            .collect()
    }

    #[cfg(test)]
    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        self.walk().into_iter().find(|id| self.nodes[id].text == text)
    }

    /// Placeholder node of the child component mounted under `key`
    #[cfg(test)]
    pub fn find_component(&self, key: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.nodes[id].slot_key() == Some(key))
    }

    /// Restrict a document-order search to the subtree under `scope`
    #[cfg(test)]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.walk_from(scope, &mut order);
        order
    }

    pub fn snapshot(&self) -> Option<NodeSnapshot> {
        self.root.map(|root| self.snapshot_from(root))
    }

    fn snapshot_from(&self, id: NodeId) -> NodeSnapshot {
        let node = &self.nodes[&id];
        NodeSnapshot {
            id,
            kind: node.kind,
            text: node.text.clone(),
            color: node.style.fg.map(|c| c.to_string()),
            component: node.slot_key(),
            focused: self.focused == Some(id),
            children: node
                .children
                .iter()
                .filter(|c| self.nodes.contains_key(*c))
                .map(|c| self.snapshot_from(*c))
                .collect(),
        }
    }
}

/// Imperative access to a realized node.
///
/// Holds the document weakly: once the node (or the document) is gone every
/// read returns a neutral value and every write is dropped.
#[derive(Clone)]
pub struct NodeHandle {
    document: Weak<RefCell<Document>>,
    id: NodeId,
}

impl NodeHandle {
    pub fn new(document: &SharedDocument, id: NodeId) -> Self {
        Self {
            document: Rc::downgrade(document),
            id,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.document
            .upgrade()
            .is_some_and(|doc| doc.borrow().contains(self.id))
    }

    /// Bounding width in measurement units
    pub fn width(&self) -> u32 {
        self.document
            .upgrade()
            .and_then(|doc| doc.borrow().measure_width(self.id))
            .unwrap_or(0)
    }

    pub fn focus(&self) {
        if let Some(doc) = self.document.upgrade() {
            let focused = doc.borrow_mut().focus(self.id);
            tracing::debug!(node = self.id.0, focused, "imperative focus");
        }
    }

    pub fn text_content(&self) -> String {
        self.document
            .upgrade()
            .and_then(|doc| doc.borrow().node(self.id).map(|n| n.text.clone()))
            .unwrap_or_default()
    }

    pub fn set_text_content(&self, text: impl Into<String>) {
        if let Some(doc) = self.document.upgrade() {
            if let Some(node) = doc.borrow_mut().node_mut(self.id) {
                node.text = text.into();
            }
        }
    }

    pub fn color(&self) -> Option<Color> {
        self.document
            .upgrade()
            .and_then(|doc| doc.borrow().node(self.id).and_then(|n| n.style.fg))
    }

    pub fn set_color(&self, color: Color) {
        if let Some(doc) = self.document.upgrade() {
            if let Some(node) = doc.borrow_mut().node_mut(self.id) {
                node.style.fg = Some(color);
            }
        }
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeHandle").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_span(text: &str) -> (SharedDocument, NodeId) {
        let doc = Document::shared(Metrics::default());
        let id = {
            let mut d = doc.borrow_mut();
            let id = d.create(ElementKind::Span);
            d.node_mut(id).unwrap().text = text.to_string();
            d.set_root(Some(id));
            id
        };
        (doc, id)
    }

    #[test]
    fn test_measure_width_uses_cell_width() {
        let (doc, id) = doc_with_span("Some text ...");
        assert_eq!(doc.borrow().measure_width(id), Some(13 * 8));

        // Wide glyphs take two cells
        doc.borrow_mut().node_mut(id).unwrap().text = "日本".to_string();
        assert_eq!(doc.borrow().measure_width(id), Some(4 * 8));
    }

    #[test]
    fn test_measure_width_saturates() {
        let doc = Document::shared(Metrics {
            units_per_cell: 400_000_000,
        });
        let id = {
            let mut d = doc.borrow_mut();
            let id = d.create(ElementKind::Span);
            d.node_mut(id).unwrap().text = "Some text ...".to_string();
            id
        };
        assert_eq!(doc.borrow().measure_width(id), Some(u32::MAX));
    }

    #[test]
    fn test_handle_reads_and_writes() {
        let (doc, id) = doc_with_span("0");
        let handle = NodeHandle::new(&doc, id);

        assert!(handle.is_attached());
        handle.set_text_content("41");
        assert_eq!(handle.text_content(), "41");
        handle.set_color(Color::Red);
        assert_eq!(handle.color(), Some(Color::Red));
        assert_eq!(handle.width(), 16);
    }

    #[test]
    fn test_handle_after_discard_is_inert() {
        let (doc, id) = doc_with_span("text");
        let handle = NodeHandle::new(&doc, id);
        doc.borrow_mut().discard(id);

        assert!(!handle.is_attached());
        assert_eq!(handle.width(), 0);
        handle.set_text_content("ignored");
        assert_eq!(handle.text_content(), "");
    }

    #[test]
    fn test_focus_only_focusable() {
        let doc = Document::shared(Metrics::default());
        let mut d = doc.borrow_mut();
        let span = d.create(ElementKind::Span);
        let input = d.create(ElementKind::TextInput);

        assert!(!d.focus(span));
        assert_eq!(d.focused(), None);
        assert!(d.focus(input));
        assert_eq!(d.focused(), Some(input));

        d.discard(input);
        assert_eq!(d.focused(), None);
    }
}
