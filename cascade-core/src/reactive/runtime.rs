//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and
//! computations. It owns the node arena, the dependency tracker and the
//! stale registry, and runs the propagation protocol when a signal is
//! written.
//!
//! # How a Write Propagates
//!
//! 1. **Stale broadcast.** Every child of the written signal is told it is
//!    stale. A node forwards the notification to its own children only on
//!    its first one (staleness 0 -> 1), and takes a slot in the registry.
//!    A node reachable along two paths therefore counts two notifications
//!    but broadcasts once.
//!
//! 2. **Mutation.** The signal takes its new value.
//!
//! 3. **Ready broadcast.** Every child is told one of its stale parents is
//!    ready. A computation whose last outstanding notification is being
//!    matched re-derives first, then settles: it frees its slot, forwards
//!    ready to its children and queues its subscribers. With two stale
//!    parents it settles only after the second one is ready, so it derives
//!    once and only ever sees settled inputs.
//!
//! 4. **Validation.** A node still stale once the outermost write has
//!    delivered every ready signal is waiting on itself, and so is a node
//!    the stale broadcast reached while it was deriving. Either fails the
//!    write with a circular dependency.
//!
//! 5. **Commit.** Queued subscribers run, the written signal's last.
//!
//! Writes may nest (a derivation writing while another write is in
//! flight). Nested writes share the staleness counters and registry, and
//! their subscribers wait for the outermost write to commit.
//!
//! Every value replaced during a write is journaled. If the write fails,
//! the ready broadcast still runs to the end without deriving anything
//! more, then the journal is unwound. Written signals and re-derived
//! computations, edges included, end up as they were before the write,
//! and no subscriber runs.
//!
//! # Ownership
//!
//! Nothing here is global: each [`Runtime`] is an independent graph, and
//! handles keep their runtime alive. The runtime is single-threaded and not
//! `Send`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::{debug_span, trace, warn};

use super::computed::Computed;
use super::context::Tracker;
use super::signal::Signal;
use super::subscriber::SubscriberId;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result, SubscriberError};
use crate::graph::{
    AnyValue, ChildList, Derivation, ErasedCallback, Node, NodeArena, NodeId, NodeKind,
    StaleRegistry,
};
use crate::value::Value;

/// A reactive graph.
///
/// Cloning a `Runtime` yields another handle to the same graph.
///
/// # Example
///
/// ```rust
/// use cascade_core::Runtime;
///
/// let runtime = Runtime::new();
/// let a = runtime.signal(1);
///
/// let b = runtime.computed({
///     let a = a.clone();
///     move || a.get() + 1
/// })?;
/// let c = runtime.computed({
///     let a = a.clone();
///     move || a.get() + 1
/// })?;
/// let d = runtime.computed({
///     let (b, c) = (b.clone(), c.clone());
///     move || b.get() + c.get()
/// })?;
///
/// assert_eq!(d.get(), 4);
/// a.set(5)?;
/// assert_eq!(d.get(), 12);
/// # Ok::<(), cascade_core::Error>(())
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(config)),
        }
    }

    /// The configuration this runtime was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Create a signal holding `value`.
    pub fn signal<T: Value>(&self, value: T) -> Signal<T> {
        let id = self.inner.create_source(Rc::new(value));
        Signal::from_handle(NodeHandle::new(id, Rc::clone(&self.inner)))
    }

    /// Create a signal holding `T::default()`.
    pub fn signal_default<T: Value + Default>(&self) -> Signal<T> {
        self.signal(T::default())
    }

    /// Create a signal and hand it to `source`, which may keep it and write
    /// into it whenever its own events occur.
    ///
    /// ```rust
    /// use cascade_core::Runtime;
    ///
    /// let runtime = Runtime::new();
    /// let mut feed = None;
    /// let latest = runtime.from_source(0, |signal| feed = Some(signal.clone()));
    ///
    /// feed.unwrap().set(9)?;
    /// assert_eq!(latest.get(), 9);
    /// # Ok::<(), cascade_core::Error>(())
    /// ```
    pub fn from_source<T, F>(&self, initial: T, source: F) -> Signal<T>
    where
        T: Value,
        F: FnOnce(&Signal<T>),
    {
        let signal = self.signal(initial);
        source(&signal);
        signal
    }

    /// Create a computation from an infallible derivation.
    ///
    /// The derivation runs once immediately. Construction fails only on a
    /// circular dependency.
    pub fn computed<T, F>(&self, derive: F) -> Result<Computed<T>>
    where
        T: Value,
        F: Fn() -> T + 'static,
    {
        self.try_computed(move || Ok(derive()))
    }

    /// Create a computation whose derivation may fail.
    ///
    /// The derivation runs once immediately; if it fails, so does
    /// construction, and no node is left behind.
    pub fn try_computed<T, F>(&self, derive: F) -> Result<Computed<T>>
    where
        T: Value,
        F: Fn() -> Result<T> + 'static,
    {
        let derivation: Derivation =
            Rc::new(move || derive().map(|value| Rc::new(value) as AnyValue));
        let id = self.inner.create_derived(derivation)?;
        Ok(Computed::from_handle(NodeHandle::new(id, Rc::clone(&self.inner))))
    }

    /// Run `f` without recording any reads as dependencies.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = self.inner.tracker.suspend();
        f()
    }

    /// Take the subscriber failures collected since the last call.
    pub fn take_unhandled_errors(&self) -> Vec<SubscriberError> {
        self.inner.unhandled.borrow_mut().drain(..).collect()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.inner.arena.borrow().node_count()
    }

    /// True when no derivation is running and no node is stale.
    pub fn is_idle(&self) -> bool {
        self.inner.tracker.is_empty() && self.inner.is_settled()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("node_count", &self.node_count())
            .field("write_depth", &self.inner.write_depth.get())
            .field("idle", &self.is_idle())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Node handles
// ----------------------------------------------------------------------------

/// Keeps a node alive. Dropping the last handle removes the node.
pub(crate) struct NodeHandle {
    id: NodeId,
    runtime: Rc<RuntimeInner>,
}

impl NodeHandle {
    fn new(id: NodeId, runtime: Rc<RuntimeInner>) -> Rc<Self> {
        Rc::new(Self { id, runtime })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn runtime(&self) -> &RuntimeInner {
        &self.runtime
    }

    /// Read with dependency tracking.
    pub fn with<T: Value, R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        self.with_untracked(f)
    }

    /// Read without dependency tracking.
    ///
    /// The value is cloned out of the arena before `f` runs, so `f` is free
    /// to read or write other nodes.
    pub fn with_untracked<T: Value, R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self
            .runtime
            .value_of(self.id)
            .expect("a node has a value while a handle to it is alive");
        let value = value
            .downcast_ref::<T>()
            .expect("a node's value has the type of its handle");
        f(value)
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.runtime.remove_node(self.id);
    }
}

/// Holds a counter incremented for as long as it lives.
struct Nested<'a> {
    counter: &'a Cell<usize>,
}

impl<'a> Nested<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self { counter }
    }
}

impl Drop for Nested<'_> {
    fn drop(&mut self) {
        self.counter.set(self.counter.get() - 1);
    }
}

/// Undo record for a value installed while a write was propagating.
struct JournalEntry {
    node: NodeId,
    value: Option<AnyValue>,
    last_value: Option<AnyValue>,
    /// Sources before a re-derivation; `None` for a written signal.
    sources: Option<IndexSet<NodeId>>,
}

/// Where a write's share of the shared bookkeeping begins.
#[derive(Debug, Clone, Copy)]
struct WriteMarks {
    /// No other write was propagating when this one started.
    outermost: bool,
    registry: usize,
    journal: usize,
    notifications: usize,
}

// ----------------------------------------------------------------------------
// Propagation
// ----------------------------------------------------------------------------

/// Shared state behind a [`Runtime`] and every handle it issued.
///
/// No `RefCell` borrow is ever held while user code runs or while a value
/// is dropped: values, children and subscribers are copied out first.
pub(crate) struct RuntimeInner {
    config: RuntimeConfig,
    arena: RefCell<NodeArena>,
    tracker: Tracker,
    registry: RefCell<StaleRegistry>,
    /// Values replaced by the writes in flight, oldest first.
    journal: RefCell<Vec<JournalEntry>>,
    /// Settled nodes whose subscribers run once the outermost write commits.
    notifications: RefCell<IndexSet<NodeId>>,
    write_depth: Cell<usize>,
    propagating: Cell<usize>,
    unhandled: RefCell<VecDeque<SubscriberError>>,
}

impl RuntimeInner {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            arena: RefCell::new(NodeArena::new()),
            tracker: Tracker::new(),
            registry: RefCell::new(StaleRegistry::new()),
            journal: RefCell::new(Vec::new()),
            notifications: RefCell::new(IndexSet::new()),
            write_depth: Cell::new(0),
            propagating: Cell::new(0),
            unhandled: RefCell::new(VecDeque::new()),
        }
    }

    fn create_source(&self, value: AnyValue) -> NodeId {
        self.arena.borrow_mut().add_node(Node::source(value))
    }

    fn create_derived(&self, derivation: Derivation) -> Result<NodeId> {
        let id = self.arena.borrow_mut().add_node(Node::derived(derivation));
        if let Err(error) = self.derive(id) {
            self.remove_node(id);
            return Err(error);
        }
        Ok(id)
    }

    /// Remove a node and its edges. Ids still listed elsewhere are skipped
    /// by propagation from now on.
    fn remove_node(&self, id: NodeId) {
        let removed = self.arena.borrow_mut().remove_node(id);
        if let Some(slot) = removed.as_ref().and_then(Node::registry_slot) {
            self.registry.borrow_mut().clear_slot(slot);
        }
        // Dropping the node may drop handles captured by its derivation,
        // which re-enter here; the arena is no longer borrowed.
        drop(removed);
    }

    fn value_of(&self, id: NodeId) -> Option<AnyValue> {
        self.arena.borrow().get(id).and_then(|node| node.value().cloned())
    }

    /// Inspect a node, if it still exists.
    pub(crate) fn inspect<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.arena.borrow().get(id).map(f)
    }

    fn is_settled(&self) -> bool {
        self.registry.borrow().is_empty()
            && self.journal.borrow().is_empty()
            && self.notifications.borrow().is_empty()
    }

    /// Install `value` on `id`, returning the pair it replaces. A node that
    /// is gone hands `value` back, so either way the caller drops it after
    /// the arena borrow has ended.
    fn install(
        &self,
        id: NodeId,
        value: AnyValue,
    ) -> std::result::Result<(Option<AnyValue>, Option<AnyValue>), AnyValue> {
        let mut arena = self.arena.borrow_mut();
        match arena.get_mut(id) {
            Some(node) => Ok(node.replace_value(value)),
            None => Err(value),
        }
    }

    /// Record that the running derivation, if any, read `id`.
    fn track_read(&self, id: NodeId) {
        let Some(reader) = self.tracker.current() else {
            return;
        };
        let attached_to_stale = {
            let mut arena = self.arena.borrow_mut();
            arena.add_edge(id, reader) && arena.get(id).is_some_and(Node::is_stale)
        };
        // A reader that attaches mid-propagation must not miss the stale
        // signal already broadcast by this node.
        if attached_to_stale {
            trace!(node = %id, reader = %reader, "reader attached to stale node");
            self.set_stale(reader, &mut Vec::new());
        }
    }

    /// Count a stale notification on `id`, forwarding it on the 0 -> 1 step.
    ///
    /// Nodes that are in the middle of their own derivation when the
    /// broadcast reaches them are pushed onto `reentered`.
    fn set_stale(&self, id: NodeId, reentered: &mut Vec<NodeId>) {
        if self.tracker.contains(id) {
            reentered.push(id);
        }
        let children = {
            let mut arena = self.arena.borrow_mut();
            let Some(node) = arena.get_mut(id) else {
                return;
            };
            if !node.mark_stale() {
                return;
            }
            let slot = self.registry.borrow_mut().register(id);
            node.set_registry_slot(slot);
            node.children_snapshot()
        };
        trace!(node = %id, "stale");
        for child in children {
            self.set_stale(child, reentered);
        }
    }

    /// Match one stale notification on `id`.
    ///
    /// On the last one a computation re-derives before settling; a settled
    /// node forwards ready to its children and queues its subscribers.
    ///
    /// The broadcast always runs to the end so every stale notification
    /// this write sent is matched. Once `failure` is set nothing derives any
    /// more: the write is going to be rolled back.
    fn set_ready(&self, id: NodeId, failure: &mut Option<Error>) {
        let needs_derive = match self.inspect(id, |node| (node.staleness(), node.kind())) {
            Some((0, _)) | None => return,
            Some((staleness, kind)) => staleness == 1 && kind == NodeKind::Derived,
        };

        if needs_derive && failure.is_none() {
            if let Err(error) = self.derive(id) {
                *failure = Some(error);
            }
        }

        let children = {
            let mut arena = self.arena.borrow_mut();
            let Some(node) = arena.get_mut(id) else {
                return;
            };
            if !node.mark_ready() {
                return;
            }
            if let Some(slot) = node.take_registry_slot() {
                self.registry.borrow_mut().clear_slot(slot);
            }
            node.children_snapshot()
        };
        trace!(node = %id, "ready");

        for child in children {
            self.set_ready(child, failure);
        }
        self.notifications.borrow_mut().insert(id);
    }

    /// Re-run the derivation of `id`, rebuilding its dependency edges.
    ///
    /// On failure the previous value stays and the previous edges are
    /// restored. On success inside a write, the replaced value and edges are
    /// journaled so the write can undo them.
    fn derive(&self, id: NodeId) -> Result<()> {
        if self.tracker.contains(id) {
            warn!(node = %id, "circular computation detected");
            return Err(Error::CircularComputation { node: id });
        }

        let (derivation, previous_sources) = {
            let mut arena = self.arena.borrow_mut();
            let Some(derivation) = arena.get(id).and_then(|node| node.derivation().cloned()) else {
                return Ok(());
            };
            (derivation, arena.detach_sources(id))
        };

        trace!(node = %id, "deriving");
        let result = {
            let _scope = self.tracker.enter(id);
            derivation()
        };
        drop(derivation);

        match result {
            Ok(value) => {
                match self.install(id, value) {
                    Ok((Some(value), last_value)) if self.propagating.get() > 0 => {
                        self.journal.borrow_mut().push(JournalEntry {
                            node: id,
                            value: Some(value),
                            last_value,
                            sources: Some(previous_sources),
                        });
                    }
                    replaced => drop(replaced),
                }
                Ok(())
            }
            Err(error) => {
                {
                    let mut arena = self.arena.borrow_mut();
                    for source in previous_sources {
                        arena.add_edge(source, id);
                    }
                }
                trace!(node = %id, %error, "derivation failed");
                Err(error)
            }
        }
    }

    /// Write `value` into the source node `id` and propagate.
    ///
    /// A failed write undoes every value it (and any write nested in it)
    /// installed, and none of its subscribers run.
    pub(crate) fn write(&self, id: NodeId, value: AnyValue) -> Result<()> {
        let limit = self.config.max_write_depth;
        if self.write_depth.get() >= limit {
            return Err(Error::DepthExceeded { limit });
        }
        let _depth = Nested::enter(&self.write_depth);
        let _span = debug_span!("write", node = %id, depth = self.write_depth.get()).entered();

        let Some(children) = self.inspect(id, Node::children_snapshot) else {
            return Ok(());
        };
        let marks = WriteMarks {
            outermost: self.propagating.get() == 0,
            registry: self.registry.borrow().mark(),
            journal: self.journal.borrow().len(),
            notifications: self.notifications.borrow().len(),
        };

        let outcome = {
            let _propagating = Nested::enter(&self.propagating);
            self.propagate(id, value, &children, &marks)
        };

        if let Err(error) = outcome {
            self.abort(&marks);
            return Err(error);
        }
        if marks.outermost {
            self.commit(&marks);
        }
        Ok(())
    }

    /// Stale broadcast, mutation, ready broadcast and validation.
    fn propagate(
        &self,
        id: NodeId,
        value: AnyValue,
        children: &ChildList,
        marks: &WriteMarks,
    ) -> Result<()> {
        let mut reentered = Vec::new();
        for &child in children {
            self.set_stale(child, &mut reentered);
        }

        match self.install(id, value) {
            Ok((value, last_value)) => self.journal.borrow_mut().push(JournalEntry {
                node: id,
                value,
                last_value,
                sources: None,
            }),
            Err(value) => drop(value),
        }

        let mut failure = None;
        for &child in children {
            self.set_ready(child, &mut failure);
        }
        if let Some(error) = failure {
            return Err(error);
        }

        // A nested write may leave readers waiting on nodes the enclosing
        // write has yet to settle, so only the outermost write sweeps the
        // registry.
        let mut unsettled = reentered;
        if marks.outermost {
            for node in self.registry.borrow().pending_since(marks.registry) {
                if !unsettled.contains(&node) {
                    unsettled.push(node);
                }
            }
        }
        if !unsettled.is_empty() {
            warn!(nodes = ?unsettled, "circular dependency detected");
            return Err(Error::CircularDependency { nodes: unsettled });
        }

        self.notifications.borrow_mut().insert(id);
        Ok(())
    }

    /// Undo everything installed since `marks` and forget its subscribers.
    fn abort(&self, marks: &WriteMarks) {
        let entries = self.journal.borrow_mut().split_off(marks.journal);
        for entry in entries.into_iter().rev() {
            if let Some(sources) = entry.sources {
                let mut arena = self.arena.borrow_mut();
                arena.detach_sources(entry.node);
                for source in sources {
                    arena.add_edge(source, entry.node);
                }
            }
            let discarded = {
                let mut arena = self.arena.borrow_mut();
                match arena.get_mut(entry.node) {
                    Some(node) => node.restore_value(entry.value, entry.last_value),
                    None => (entry.value, entry.last_value),
                }
            };
            drop(discarded);
        }
        trace!(journal = marks.journal, "write rolled back");

        self.notifications.borrow_mut().truncate(marks.notifications);

        if marks.outermost {
            // Whatever is still stale waits on a cycle and will never be
            // told it is ready.
            let leftover = self.registry.borrow_mut().drain_since(marks.registry);
            let mut arena = self.arena.borrow_mut();
            for node_id in leftover {
                if let Some(node) = arena.get_mut(node_id) {
                    node.reset_staleness();
                }
            }
        }
    }

    /// Release the journal and run the queued subscribers.
    fn commit(&self, marks: &WriteMarks) {
        let leftover = self.registry.borrow_mut().drain_since(marks.registry);
        debug_assert!(leftover.is_empty(), "validated write left stale nodes behind");

        let released = std::mem::take(&mut *self.journal.borrow_mut());
        drop(released);

        // Subscribers may write; those writes queue behind whatever is left.
        while let Some(id) = self.next_notification() {
            self.notify_subscribers(id);
        }
    }

    fn next_notification(&self) -> Option<NodeId> {
        self.notifications.borrow_mut().shift_remove_index(0)
    }

    pub(crate) fn subscribe(
        &self,
        id: NodeId,
        subscriber: SubscriberId,
        callback: ErasedCallback,
        run_immediately: bool,
    ) {
        let current = {
            let mut arena = self.arena.borrow_mut();
            let Some(node) = arena.get_mut(id) else {
                return;
            };
            node.add_subscriber(subscriber, Rc::clone(&callback));
            (node.value().cloned(), node.last_value().cloned())
        };
        if !run_immediately {
            return;
        }
        if let (Some(value), last_value) = current {
            self.invoke(id, subscriber, &callback, &value, last_value.as_ref());
        }
    }

    pub(crate) fn unsubscribe(&self, id: NodeId, subscriber: SubscriberId) {
        let removed = self
            .arena
            .borrow_mut()
            .get_mut(id)
            .and_then(|node| node.remove_subscriber(subscriber));
        drop(removed);
    }

    /// Run the subscribers of `id` against its settled value.
    ///
    /// The list is copied first, so a callback may unsubscribe itself (or
    /// others) without disturbing this pass.
    fn notify_subscribers(&self, id: NodeId) {
        let Some((subscribers, value, last_value)) = self.inspect(id, |node| {
            (
                node.subscribers_snapshot(),
                node.value().cloned(),
                node.last_value().cloned(),
            )
        }) else {
            return;
        };
        let Some(value) = value else {
            return;
        };
        for (subscriber, callback) in subscribers {
            self.invoke(id, subscriber, &callback, &value, last_value.as_ref());
        }
    }

    fn invoke(
        &self,
        id: NodeId,
        subscriber: SubscriberId,
        callback: &ErasedCallback,
        value: &AnyValue,
        last_value: Option<&AnyValue>,
    ) {
        let value: &dyn Any = &**value;
        let last_value: Option<&dyn Any> = last_value.map(|last| &**last);
        let outcome = {
            let _scope = self.tracker.suspend();
            callback(value, last_value)
        };
        if let Err(source) = outcome {
            self.report(SubscriberError {
                node: id,
                subscriber,
                source,
            });
        }
    }

    /// Log a subscriber failure and queue it for the owner of the runtime.
    fn report(&self, failure: SubscriberError) {
        tracing::error!(
            node = %failure.node,
            subscriber = %failure.subscriber,
            error = %failure.source,
            "subscriber failed"
        );
        let capacity = self.config.unhandled_error_capacity;
        if capacity == 0 {
            return;
        }
        let mut queue = self.unhandled.borrow_mut();
        while queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(failure);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subscriber;

    #[test]
    fn runtime_creates_and_removes_nodes() {
        let runtime = Runtime::new();
        assert_eq!(runtime.node_count(), 0);

        let signal = runtime.signal(1);
        let copy = signal.clone();
        assert_eq!(runtime.node_count(), 1);

        drop(signal);
        assert_eq!(runtime.node_count(), 1);
        drop(copy);
        assert_eq!(runtime.node_count(), 0);
    }

    #[test]
    fn dropping_a_computation_releases_its_sources() {
        let runtime = Runtime::new();
        let a = runtime.signal(1);
        let doubled = runtime
            .computed({
                let a = a.clone();
                move || a.get() * 2
            })
            .unwrap();

        assert_eq!(a.child_count(), 1);
        assert_eq!(runtime.node_count(), 2);

        drop(doubled);
        assert_eq!(a.child_count(), 0);
        assert_eq!(runtime.node_count(), 1);

        // Writing after the dependent is gone is fine.
        a.set(2).unwrap();
        assert!(runtime.is_idle());
    }

    #[test]
    fn write_marks_and_settles() {
        let runtime = Runtime::new();
        let a = runtime.signal(1);
        let b = runtime
            .computed({
                let a = a.clone();
                move || a.get() + 1
            })
            .unwrap();

        a.set(10).unwrap();
        assert_eq!(b.get(), 11);
        assert_eq!(b.staleness(), 0);
        assert!(runtime.is_idle());
    }

    #[test]
    fn untracked_reads_do_not_attach() {
        let runtime = Runtime::new();
        let a = runtime.signal(1);
        let b = runtime.signal(100);
        let sum = runtime
            .computed({
                let (a, b, runtime) = (a.clone(), b.clone(), runtime.clone());
                move || a.get() + runtime.untracked(|| b.get())
            })
            .unwrap();

        assert_eq!(sum.dependency_count(), 1);
        b.set(200).unwrap();
        assert_eq!(sum.get(), 101);
        a.set(2).unwrap();
        assert_eq!(sum.get(), 202);
    }

    #[test]
    fn depth_limit_stops_runaway_writes() {
        let runtime = Runtime::with_config(RuntimeConfig::default().max_write_depth(4));
        let a = runtime.signal(0);
        let bump = Subscriber::fallible({
            let a = a.clone();
            move |value: &i32, _| {
                a.set(value + 1)?;
                Ok(())
            }
        });
        a.subscribe(&bump, false);

        a.set(1).unwrap();

        let failures = runtime.take_unhandled_errors();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].source.to_string().contains("limit of 4"));
        assert_eq!(a.get(), 4);
        assert!(runtime.is_idle());
    }

    #[test]
    fn unhandled_error_queue_is_bounded() {
        let runtime = Runtime::with_config(RuntimeConfig::default().unhandled_error_capacity(2));
        let a = runtime.signal(0);
        let calls = Rc::new(Cell::new(0));
        let failing = Subscriber::fallible({
            let calls = Rc::clone(&calls);
            move |value: &i32, _| {
                calls.set(calls.get() + 1);
                Err(format!("failure {value}").into())
            }
        });
        a.subscribe(&failing, false);

        for i in 1..=3 {
            a.set(i).unwrap();
        }

        assert_eq!(calls.get(), 3);
        let failures = runtime.take_unhandled_errors();
        let messages: Vec<String> = failures.iter().map(|f| f.source.to_string()).collect();
        assert_eq!(messages, vec!["failure 2", "failure 3"]);
        assert!(runtime.take_unhandled_errors().is_empty());
    }

    #[test]
    fn from_source_hands_out_the_signal() {
        let runtime = Runtime::new();
        let kept = Rc::new(RefCell::new(None));
        let signal = runtime.from_source(String::from("idle"), {
            let kept = Rc::clone(&kept);
            move |signal: &Signal<String>| *kept.borrow_mut() = Some(signal.clone())
        });

        if let Some(writer) = kept.borrow().as_ref() {
            writer.set(String::from("busy")).unwrap();
        }
        assert_eq!(signal.get(), "busy");
    }
}
