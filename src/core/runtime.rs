//! Single-threaded render runtime
//!
//! Mounts a component tree into a [`Document`], reconciles re-renders against the
//! realized nodes, and runs the commit phase in a fixed order:
//! node mutations, ref detachments, ref attachments, then post-commit effects.
//!
//! State changes made anywhere (handlers, attachment callbacks, effects) only
//! enqueue the owning instance; `flush` drains the queue until it settles.

use super::hooks::{
    EffectDeps, InstanceId, InstanceObserver, Observer, RefHandle, RenderQueue, StateCell,
};
use crate::data::document::{Document, Metrics, NodeHandle, NodeId, SharedDocument};
use crate::data::element::{AttachCallback, Element, ElementKind, NodeRef};
use anyhow::{bail, Context, Result};
use std::any::Any;
use std::cell::Ref;
use std::collections::HashMap;
use std::rc::Rc;

/// Re-render passes allowed in a single flush before it is treated as a loop
pub const MAX_RENDER_PASSES: usize = 50;

/// Deepest chain of nested component renders before mounting gives up
pub const MAX_NESTING: usize = 64;

/// A view unit with its own local state.
///
/// Components keep their state cells and handles as fields; constructing a
/// component and handing it to the runtime is mounting it.
pub trait Component: Any {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Describe the output for the current state
    fn render(&mut self, cx: &mut RenderContext) -> Element;

    /// Take new props from a parent re-render.
    /// Returns true when the component must re-render.
    fn receive(&mut self, _next: &mut dyn Component) -> bool {
        false
    }

    /// Downcast to concrete type (for `receive`)
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type EffectFn = Box<dyn FnOnce()>;

/// Per-render access to runtime services
pub struct RenderContext {
    observer: Rc<dyn Observer>,
    effects: Vec<(EffectDeps, EffectFn)>,
}

impl RenderContext {
    fn new(observer: Rc<dyn Observer>) -> Self {
        Self {
            observer,
            effects: Vec::new(),
        }
    }

    /// Read a state cell and re-render this instance whenever it is replaced
    pub fn read<T: Clone + 'static>(&mut self, cell: &StateCell<T>) -> T {
        cell.subscribe(&self.observer);
        cell.get()
    }

    /// Schedule `effect` to run after this render commits, gated by `deps`.
    /// Effects are matched across renders by declaration order.
    pub fn effect(&mut self, deps: EffectDeps, effect: impl FnOnce() + 'static) {
        self.effects.push((deps, Box::new(effect)));
    }
}

struct Instance {
    component: Box<dyn Component>,
    // Strong owner of the observer; state cells only hold it weakly
    observer: Rc<dyn Observer>,
    root: Option<NodeId>,
    /// Placeholder node in the parent's tree (None for the root instance)
    slot: Option<NodeId>,
    effect_deps: Vec<EffectDeps>,
    commits: u64,
}

/// Ref work gathered while reconciling, applied after mutations
#[derive(Default)]
struct Commit {
    cleared: Vec<RefHandle<Option<NodeHandle>>>,
    detached: Vec<AttachCallback>,
    bound: Vec<(RefHandle<Option<NodeHandle>>, NodeId)>,
    attached: Vec<(AttachCallback, NodeId)>,
}

pub struct Runtime {
    document: SharedDocument,
    instances: HashMap<InstanceId, Instance>,
    queue: Rc<RenderQueue>,
    next_instance: u32,
    root: Option<InstanceId>,
    render_passes: u64,
    depth: usize,
}

impl Runtime {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            document: Document::shared(metrics),
            instances: HashMap::new(),
            queue: Rc::new(RenderQueue::default()),
            next_instance: 0,
            root: None,
            render_passes: 0,
            depth: 0,
        }
    }

    /// Borrow the realized document
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    #[cfg(test)]
    pub fn shared_document(&self) -> SharedDocument {
        Rc::clone(&self.document)
    }

    /// Total component renders since creation
    #[cfg(test)]
    pub fn render_passes(&self) -> u64 {
        self.render_passes
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Mount `component` as the document root, replacing any previous tree
    pub fn mount(&mut self, component: impl Component) -> Result<()> {
        self.unmount();

        let id = self.spawn_instance(Box::new(component), None);
        tracing::debug!(instance = id.0, "mounting root component");
        self.root = Some(id);
        self.render_instance(id)
            .context("Failed to mount root component")?;

        let root_node = self.instances.get(&id).and_then(|i| i.root);
        self.document.borrow_mut().set_root(root_node);

        self.flush()
    }

    /// Tear down the whole tree, detaching every ref
    pub fn unmount(&mut self) {
        let Some(id) = self.root.take() else {
            return;
        };
        let mut commit = Commit::default();
        self.unmount_instance(id, &mut commit);
        self.document.borrow_mut().set_root(None);
        self.apply_refs(commit);
        self.queue.clear();
    }

    /// Render queued instances until nothing is pending
    pub fn flush(&mut self) -> Result<()> {
        let mut passes = 0;
        while let Some(id) = self.queue.pop() {
            if !self.instances.contains_key(&id) {
                continue; // unmounted while queued
            }
            passes += 1;
            if passes > MAX_RENDER_PASSES {
                self.queue.clear();
                bail!(
                    "render loop: more than {} re-renders without settling (last instance {})",
                    MAX_RENDER_PASSES,
                    id.0
                );
            }
            self.render_instance(id)?;
        }
        if passes > 0 {
            tracing::trace!(passes, total = self.render_passes, "flush settled");
        }
        Ok(())
    }

    /// Dispatch a click to `node` and settle
    pub fn click(&mut self, node: NodeId) -> Result<()> {
        let handler = self
            .document
            .borrow()
            .node(node)
            .and_then(|n| n.on_click.clone());
        match handler {
            Some(handler) => {
                tracing::debug!(node = node.0, "click");
                handler();
                self.flush()
            }
            None => Ok(()),
        }
    }

    /// Dispatch an input change to `node` and settle.
    /// Inputs without a change handler are read-only and ignore the edit.
    pub fn change(&mut self, node: NodeId, value: String) -> Result<()> {
        let handler = self
            .document
            .borrow()
            .node(node)
            .and_then(|n| n.on_change.clone());
        match handler {
            Some(handler) => {
                tracing::trace!(node = node.0, value = %value, "change");
                handler(value);
                self.flush()
            }
            None => {
                tracing::trace!(node = node.0, "change ignored on controlled input");
                Ok(())
            }
        }
    }

    pub fn focus(&mut self, node: NodeId) -> bool {
        self.document.borrow_mut().focus(node)
    }

    #[cfg(test)]
    pub fn blur(&mut self) {
        self.document.borrow_mut().blur();
    }

    fn spawn_instance(&mut self, component: Box<dyn Component>, slot: Option<NodeId>) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let observer: Rc<dyn Observer> = Rc::new(InstanceObserver {
            id,
            queue: Rc::downgrade(&self.queue),
        });
        self.instances.insert(
            id,
            Instance {
                component,
                observer,
                root: None,
                slot,
                effect_deps: Vec::new(),
                commits: 0,
            },
        );
        id
    }

    fn render_instance(&mut self, id: InstanceId) -> Result<()> {
        if self.depth >= MAX_NESTING {
            bail!(
                "component nesting deeper than {} (instance {})",
                MAX_NESTING,
                id.0
            );
        }
        self.depth += 1;
        let result = self.render_nested(id);
        self.depth -= 1;
        result
    }

    fn render_nested(&mut self, id: InstanceId) -> Result<()> {
        let Some(mut instance) = self.instances.remove(&id) else {
            return Ok(());
        };
        self.render_passes += 1;

        let mut cx = RenderContext::new(Rc::clone(&instance.observer));
        let element = instance.component.render(&mut cx);
        tracing::trace!(
            instance = id.0,
            component = instance.component.name(),
            commit = instance.commits,
            "render"
        );

        let mut commit = Commit::default();
        let previous_root = instance.root;
        // Put the instance back so child mounts and unmounts can see the map whole
        self.instances.insert(id, instance);

        let new_root = self.reconcile(previous_root, element, &mut commit)?;

        let slot = match self.instances.get_mut(&id) {
            Some(instance) => {
                instance.root = Some(new_root);
                instance.slot
            }
            None => bail!("instance {} vanished during its own render", id.0),
        };
        if previous_root != Some(new_root) {
            let mut doc = self.document.borrow_mut();
            match slot {
                Some(slot) => {
                    if let Some(placeholder) = doc.node_mut(slot) {
                        placeholder.children = vec![new_root];
                    }
                    if let Some(node) = doc.node_mut(new_root) {
                        node.parent = Some(slot);
                    }
                }
                None if self.root == Some(id) => doc.set_root(Some(new_root)),
                None => {}
            }
        }

        self.apply_refs(commit);
        self.run_effects(id, cx.effects);
        Ok(())
    }

    /// Realize `element` in place of `previous`, returning the node now standing there
    fn reconcile(
        &mut self,
        previous: Option<NodeId>,
        element: Element,
        commit: &mut Commit,
    ) -> Result<NodeId> {
        if element.kind == ElementKind::Component {
            return self.reconcile_slot(previous, element, commit);
        }

        let reusable = previous.filter(|prev| {
            self.document
                .borrow()
                .node(*prev)
                .is_some_and(|n| n.kind == element.kind)
        });
        if let Some(prev) = previous {
            if reusable.is_none() {
                self.remove_subtree(prev, commit);
            }
        }

        let Element {
            kind,
            text,
            style,
            node_ref,
            on_click,
            on_change,
            children,
            ..
        } = element;

        let (id, old_children) = {
            let mut doc = self.document.borrow_mut();
            let id = match reusable {
                Some(id) => id,
                None => doc.create(kind),
            };
            let Some(node) = doc.node_mut(id) else {
                bail!("node {} missing from the document", id.0);
            };

            if node.applied_text != text {
                node.text = text.clone().unwrap_or_default();
                node.applied_text = text;
            }
            if node.applied_style != style {
                node.style = style.unwrap_or_default();
                node.applied_style = style;
            }
            node.on_click = on_click;
            node.on_change = on_change;

            // Callbacks have no identity: every commit detaches the old one
            // and attaches the new one
            if let Some(old) = node.attach.take() {
                commit.detached.push(old);
            }
            match node_ref {
                Some(NodeRef::Callback(callback)) => {
                    node.attach = Some(Rc::clone(&callback));
                    commit.attached.push((callback, id));
                }
                Some(NodeRef::Handle(handle)) => {
                    let same = node.handle.as_ref().is_some_and(|h| h.same_as(&handle));
                    if !same {
                        if let Some(old) = node.handle.replace(handle.clone()) {
                            commit.cleared.push(old);
                        }
                        commit.bound.push((handle, id));
                    }
                }
                None => {
                    if let Some(old) = node.handle.take() {
                        commit.cleared.push(old);
                    }
                }
            }

            (id, std::mem::take(&mut node.children))
        };

        let mut old_children = old_children.into_iter();
        let mut new_children = Vec::with_capacity(children.len());
        for child in children {
            let child_id = self.reconcile(old_children.next(), child, commit)?;
            new_children.push(child_id);
        }
        for leftover in old_children {
            self.remove_subtree(leftover, commit);
        }

        let mut doc = self.document.borrow_mut();
        for child in &new_children {
            if let Some(node) = doc.node_mut(*child) {
                node.parent = Some(id);
            }
        }
        if let Some(node) = doc.node_mut(id) {
            node.children = new_children;
        }
        Ok(id)
    }

    fn reconcile_slot(
        &mut self,
        previous: Option<NodeId>,
        element: Element,
        commit: &mut Commit,
    ) -> Result<NodeId> {
        let Some(mut slot) = element.slot else {
            // A Component element without a slot renders as an empty placeholder
            if let Some(prev) = previous {
                self.remove_subtree(prev, commit);
            }
            return Ok(self.document.borrow_mut().create(ElementKind::Component));
        };

        let existing = previous.and_then(|prev| {
            self.document
                .borrow()
                .node(prev)
                .and_then(|n| n.slot)
                .filter(|(key, _)| *key == slot.key)
                .map(|(_, instance)| (prev, instance))
        });

        if let Some((placeholder, instance_id)) = existing {
            let rerender = match self.instances.get_mut(&instance_id) {
                Some(instance) => instance.component.receive(slot.component.as_mut()),
                None => false,
            };
            if rerender {
                // Props changed: render now so the parent commit sees the result
                self.render_instance(instance_id)
                    .with_context(|| format!("Failed to re-render child component {:?}", slot.key))?;
            }
            return Ok(placeholder);
        }

        if let Some(prev) = previous {
            self.remove_subtree(prev, commit);
        }

        let placeholder = self.document.borrow_mut().create(ElementKind::Component);
        let instance_id = self.spawn_instance(slot.component, Some(placeholder));
        if let Some(node) = self.document.borrow_mut().node_mut(placeholder) {
            node.slot = Some((slot.key, instance_id));
        }
        tracing::debug!(key = slot.key, instance = instance_id.0, "mounting child component");
        self.render_instance(instance_id)
            .with_context(|| format!("Failed to mount child component {:?}", slot.key))?;
        Ok(placeholder)
    }

    /// Remove a node and everything under it, unmounting child instances
    fn remove_subtree(&mut self, id: NodeId, commit: &mut Commit) {
        let Some(node) = self.document.borrow_mut().discard(id) else {
            return;
        };
        if let Some(callback) = node.attach {
            commit.detached.push(callback);
        }
        if let Some(handle) = node.handle {
            commit.cleared.push(handle);
        }
        if let Some((_, instance)) = node.slot {
            self.unmount_instance(instance, commit);
        }
        for child in node.children {
            self.remove_subtree(child, commit);
        }
    }

    fn unmount_instance(&mut self, id: InstanceId, commit: &mut Commit) {
        if let Some(instance) = self.instances.remove(&id) {
            tracing::debug!(
                instance = id.0,
                component = instance.component.name(),
                "unmounting"
            );
            if let Some(root) = instance.root {
                self.remove_subtree(root, commit);
            }
        }
    }

    fn apply_refs(&self, commit: Commit) {
        let Commit {
            cleared,
            detached,
            bound,
            attached,
        } = commit;

        for handle in cleared {
            handle.set(None);
        }
        for callback in detached {
            callback(None);
        }
        for (handle, id) in bound {
            if self.document.borrow().contains(id) {
                handle.set(Some(NodeHandle::new(&self.document, id)));
            }
        }
        for (callback, id) in attached {
            if self.document.borrow().contains(id) {
                tracing::trace!(node = id.0, "attachment callback");
                callback(Some(NodeHandle::new(&self.document, id)));
            }
        }
    }

    fn run_effects(&mut self, id: InstanceId, effects: Vec<(EffectDeps, EffectFn)>) {
        let previous = match self.instances.get_mut(&id) {
            Some(instance) => {
                instance.commits += 1;
                std::mem::take(&mut instance.effect_deps)
            }
            None => return,
        };

        let mut recorded = Vec::with_capacity(effects.len());
        for (index, (deps, effect)) in effects.into_iter().enumerate() {
            if deps.should_run(previous.get(index)) {
                effect();
            }
            recorded.push(deps);
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.effect_deps = recorded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Shows a count and a button; optionally bound to a handle
    struct Tally {
        count: StateCell<i32>,
        handle: RefHandle<Option<NodeHandle>>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Tally {
        fn new(log: Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                count: StateCell::new(0),
                handle: RefHandle::default(),
                log,
            }
        }
    }

    impl Component for Tally {
        fn name(&self) -> &'static str {
            "tally"
        }

        fn render(&mut self, cx: &mut RenderContext) -> Element {
            let count = cx.read(&self.count);
            let log = Rc::clone(&self.log);
            cx.effect(EffectDeps::Always, move || log.borrow_mut().push(format!("effect {}", count)));

            let attach_log = Rc::clone(&self.log);
            let cell = self.count.clone();
            Element::container()
                .child(Element::paragraph(count.to_string()).node_ref(self.handle.clone()))
                .child(Element::span().text("measured").attach(move |node| {
                    attach_log
                        .borrow_mut()
                        .push(if node.is_some() { "attach" } else { "detach" }.to_string());
                }))
                .child(Element::button("Increase").on_click(move || cell.set(count + 1)))
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_mount_realizes_tree_and_binds_refs() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let tally = Tally::new(Rc::clone(&log));
        let handle = tally.handle.clone();

        let mut runtime = Runtime::new(Metrics::default());
        runtime.mount(tally).unwrap();

        let doc = runtime.document();
        let paragraph = doc.find_by_kind(ElementKind::Paragraph)[0];
        assert_eq!(doc.node(paragraph).unwrap().text, "0");
        assert_eq!(handle.get().map(|h| h.id()), Some(paragraph));
        assert_eq!(*log.borrow(), vec!["attach", "effect 0"]);
    }

    #[test]
    fn test_commit_order_detach_attach_effect() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut runtime = Runtime::new(Metrics::default());
        runtime.mount(Tally::new(Rc::clone(&log))).unwrap();
        log.borrow_mut().clear();

        let button = runtime.document().find_by_kind(ElementKind::Button)[0];
        runtime.click(button).unwrap();

        assert_eq!(*log.borrow(), vec!["detach", "attach", "effect 1"]);
        let doc = runtime.document();
        assert!(doc.find_by_text("1").is_some());
    }

    #[test]
    fn test_nodes_are_reused_across_renders() {
        let mut runtime = Runtime::new(Metrics::default());
        runtime
            .mount(Tally::new(Rc::new(RefCell::new(Vec::new()))))
            .unwrap();
        let before = runtime.document().walk();

        let button = runtime.document().find_by_kind(ElementKind::Button)[0];
        runtime.click(button).unwrap();

        assert_eq!(runtime.document().walk(), before);
    }

    #[test]
    fn test_unmount_clears_handles_and_detaches() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let tally = Tally::new(Rc::clone(&log));
        let handle = tally.handle.clone();
        let count = tally.count.clone();

        let mut runtime = Runtime::new(Metrics::default());
        runtime.mount(tally).unwrap();
        runtime.unmount();

        assert!(handle.get().is_none());
        assert_eq!(log.borrow().last().map(String::as_str), Some("detach"));
        assert_eq!(runtime.instance_count(), 0);
        assert_eq!(runtime.document().len(), 0);
        // Observer went away with the instance
        assert_eq!(count.observer_count(), 0);
    }

    /// Sets state from its attachment callback without comparing first
    struct Unguarded {
        wide: StateCell<bool>,
    }

    impl Component for Unguarded {
        fn name(&self) -> &'static str {
            "unguarded"
        }

        fn render(&mut self, cx: &mut RenderContext) -> Element {
            let _ = cx.read(&self.wide);
            let cell = self.wide.clone();
            Element::span().text("x").attach(move |node| {
                if let Some(node) = node {
                    cell.set(node.width() > 0);
                }
            })
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_unguarded_state_write_is_a_render_loop() {
        let mut runtime = Runtime::new(Metrics::default());
        let err = runtime
            .mount(Unguarded {
                wide: StateCell::new(false),
            })
            .unwrap_err();
        assert!(err.to_string().contains("render loop"));
    }

    struct Child {
        label: String,
        renders: Rc<Cell<u32>>,
    }

    impl Component for Child {
        fn name(&self) -> &'static str {
            "child"
        }

        fn render(&mut self, _cx: &mut RenderContext) -> Element {
            self.renders.set(self.renders.get() + 1);
            Element::paragraph(self.label.clone())
        }

        fn receive(&mut self, next: &mut dyn Component) -> bool {
            match next.as_any_mut().downcast_mut::<Child>() {
                Some(next) if next.label != self.label => {
                    self.label = std::mem::take(&mut next.label);
                    true
                }
                _ => false,
            }
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Parent {
        label: StateCell<String>,
        renders: Rc<Cell<u32>>,
    }

    impl Component for Parent {
        fn name(&self) -> &'static str {
            "parent"
        }

        fn render(&mut self, cx: &mut RenderContext) -> Element {
            let label = cx.read(&self.label);
            Element::container().child(Element::component(
                "child",
                Child {
                    label,
                    renders: Rc::clone(&self.renders),
                },
            ))
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_child_instance_survives_parent_render() {
        let renders = Rc::new(Cell::new(0));
        let label = StateCell::new("a".to_string());
        let mut runtime = Runtime::new(Metrics::default());
        runtime
            .mount(Parent {
                label: label.clone(),
                renders: Rc::clone(&renders),
            })
            .unwrap();
        assert_eq!(runtime.instance_count(), 2);
        let placeholder = runtime.document().find_component("child").unwrap();

        // Same props: the child keeps its instance and skips rendering
        label.set("a".to_string());
        runtime.flush().unwrap();
        assert_eq!(renders.get(), 1);

        label.set("b".to_string());
        runtime.flush().unwrap();
        assert_eq!(renders.get(), 2);
        assert_eq!(runtime.instance_count(), 2);

        let doc = runtime.document();
        assert_eq!(doc.find_component("child"), Some(placeholder));
        assert!(doc.find_by_text("b").is_some());
    }

    /// Mounts another copy of itself under every render
    struct Endless;

    impl Component for Endless {
        fn name(&self) -> &'static str {
            "endless"
        }

        fn render(&mut self, _cx: &mut RenderContext) -> Element {
            Element::container().child(Element::component("inner", Endless))
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_nested_mount_failure_reaches_caller() {
        let mut runtime = Runtime::new(Metrics::default());
        let err = runtime.mount(Endless).unwrap_err();

        assert!(format!("{:#}", err).contains("component nesting deeper than"));
        assert!(format!("{:#}", err).contains("Failed to mount child component \"inner\""));
        assert_eq!(runtime.depth, 0);
    }
}
