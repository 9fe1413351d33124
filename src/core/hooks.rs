//! Reactive primitives owned by component instances
//!
//! - [`StateCell`]: a value whose replacement notifies its observers (re-render)
//! - [`RefHandle`]: a mutable box that never notifies anyone
//! - [`EffectDeps`]: gating for post-commit effects
//!
//! Observers are held weakly, so an unmounted instance drops out of every cell
//! it was subscribed to without explicit cleanup.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Identifies a mounted component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

/// Something that wants to hear about state replacements
pub trait Observer {
    fn notify(&self);
}

/// Reactive local value. Cloning shares the same underlying cell.
pub struct StateCell<T> {
    inner: Rc<StateInner<T>>,
}

struct StateInner<T> {
    value: RefCell<T>,
    observers: RefCell<Vec<Weak<dyn Observer>>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(StateInner {
                value: RefCell::new(initial),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Read the current value without subscribing
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and request a re-render from every observer.
    ///
    /// There is no equality bail-out: callers that must not cause another
    /// pass (attachment callbacks) compare before calling.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Register an observer (deduplicated)
    pub fn subscribe(&self, observer: &Rc<dyn Observer>) {
        let weak = Rc::downgrade(observer);
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|w| w.strong_count() > 0);
        if !observers.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            observers.push(weak);
        }
    }

    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        // Collect first so observers may touch this cell again
        let live: Vec<Rc<dyn Observer>> = {
            let mut observers = self.inner.observers.borrow_mut();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.notify();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateCell")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

/// Persistent mutable value that lives as long as its owner.
/// Writing to it never schedules a render.
pub struct RefHandle<T> {
    current: Rc<RefCell<T>>,
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            current: Rc::clone(&self.current),
        }
    }
}

impl<T> RefHandle<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: Rc::new(RefCell::new(initial)),
        }
    }

    pub fn set(&self, value: T) {
        *self.current.borrow_mut() = value;
    }

    /// True when both handles share the same slot
    pub fn same_as(&self, other: &RefHandle<T>) -> bool {
        Rc::ptr_eq(&self.current, &other.current)
    }
}

impl<T: Clone> RefHandle<T> {
    pub fn get(&self) -> T {
        self.current.borrow().clone()
    }
}

impl<T: Default> Default for RefHandle<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// When a post-commit effect runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectDeps {
    /// After every commit
    Always,
    /// After the first commit only
    Once,
    /// After the first commit and whenever the hashed value changes
    On(u64),
}

impl EffectDeps {
    pub fn on<T: Hash + ?Sized>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        EffectDeps::On(hasher.finish())
    }

    /// Decide whether the effect runs given what was recorded last commit
    pub(crate) fn should_run(&self, previous: Option<&EffectDeps>) -> bool {
        match (self, previous) {
            (EffectDeps::Always, _) => true,
            (_, None) => true,
            (EffectDeps::Once, Some(_)) => false,
            (EffectDeps::On(now), Some(EffectDeps::On(before))) => now != before,
            (EffectDeps::On(_), Some(_)) => true,
        }
    }
}

/// FIFO of instances waiting to re-render, without duplicates
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: RefCell<VecDeque<InstanceId>>,
}

impl RenderQueue {
    pub fn schedule(&self, id: InstanceId) {
        let mut pending = self.pending.borrow_mut();
        if !pending.contains(&id) {
            pending.push_back(id);
        }
    }

    pub fn pop(&self) -> Option<InstanceId> {
        self.pending.borrow_mut().pop_front()
    }

    pub fn clear(&self) {
        self.pending.borrow_mut().clear();
    }
}

/// Observer that enqueues its instance on the runtime's render queue
pub(crate) struct InstanceObserver {
    pub id: InstanceId,
    pub queue: Weak<RenderQueue>,
}

impl Observer for InstanceObserver {
    fn notify(&self) {
        if let Some(queue) = self.queue.upgrade() {
            tracing::trace!(instance = self.id.0, "state change scheduled re-render");
            queue.schedule(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Cell<u32>);

    impl Observer for Counter {
        fn notify(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_state_cell_notifies_observers() {
        let cell = StateCell::new(0);
        let counter = Rc::new(Counter(Cell::new(0)));
        let observer: Rc<dyn Observer> = counter.clone();

        cell.subscribe(&observer);
        cell.subscribe(&observer);
        assert_eq!(cell.observer_count(), 1);

        cell.set(5);
        cell.set(5);
        assert_eq!(cell.get(), 5);
        assert_eq!(counter.0.get(), 2);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let cell = StateCell::new(String::from("a"));
        {
            let observer: Rc<dyn Observer> = Rc::new(Counter(Cell::new(0)));
            cell.subscribe(&observer);
            assert_eq!(cell.observer_count(), 1);
        }
        assert_eq!(cell.observer_count(), 0);
        // Nothing left to notify, must not panic
        cell.set(String::from("b"));
    }

    #[test]
    fn test_ref_handle_is_shared_and_silent() {
        let handle = RefHandle::new(true);
        let alias = handle.clone();
        alias.set(false);
        assert!(!handle.get());
        assert!(handle.same_as(&alias));
        assert!(!handle.same_as(&RefHandle::new(false)));
    }

    #[test]
    fn test_effect_deps_gating() {
        let a = EffectDeps::on(&true);
        let b = EffectDeps::on(&false);

        assert!(EffectDeps::Always.should_run(Some(&EffectDeps::Always)));
        assert!(EffectDeps::Once.should_run(None));
        assert!(!EffectDeps::Once.should_run(Some(&EffectDeps::Once)));
        assert!(a.should_run(None));
        assert!(!a.should_run(Some(&EffectDeps::on(&true))));
        assert!(a.should_run(Some(&b)));
    }

    #[test]
    fn test_render_queue_dedup() {
        let queue = RenderQueue::default();
        queue.schedule(InstanceId(1));
        queue.schedule(InstanceId(2));
        queue.schedule(InstanceId(1));
        assert_eq!(queue.pop(), Some(InstanceId(1)));
        assert_eq!(queue.pop(), Some(InstanceId(2)));
        assert!(queue.pop().is_none());
    }
}
