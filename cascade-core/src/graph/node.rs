//! Graph Nodes
//!
//! This module defines the node type that lives in the dependency graph.
//! Signals and computations share one representation, told apart by
//! [`NodeKind`].

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use crate::error::{BoxError, Result};
use crate::reactive::SubscriberId;

/// A type-erased node value.
pub(crate) type AnyValue = Rc<dyn Any>;

/// A type-erased derivation function.
pub(crate) type Derivation = Rc<dyn Fn() -> Result<AnyValue>>;

/// A type-erased subscriber callback, invoked with `(value, last_value)`.
pub(crate) type ErasedCallback = Rc<dyn Fn(&dyn Any, Option<&dyn Any>) -> Result<(), BoxError>>;

/// Snapshot of a node's children, taken before walking them.
pub(crate) type ChildList = SmallVec<[NodeId; 8]>;

/// Unique identifier for a node in the dependency graph.
///
/// Ids are never reused, so an id left behind in a child list after its
/// node was dropped simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// A writable cell. Has dependents, never dependencies.
    Source,

    /// A computation. Its value comes from re-running its derivation.
    Derived,
}

/// A node in the dependency graph.
pub(crate) struct Node {
    id: NodeId,
    kind: NodeKind,

    /// `None` only while a computation runs its first derivation.
    value: Option<AnyValue>,

    /// The value held before the latest write or derivation.
    last_value: Option<AnyValue>,

    derivation: Option<Derivation>,

    /// Nodes that read this node during their derivation.
    children: IndexSet<NodeId>,

    /// Nodes this node read during its latest derivation.
    sources: IndexSet<NodeId>,

    subscribers: IndexMap<SubscriberId, ErasedCallback>,

    /// Outstanding stale notifications not yet matched by a ready one.
    staleness: usize,

    registry_slot: Option<usize>,
}

impl Node {
    /// Create a writable cell holding `value`.
    pub fn source(value: AnyValue) -> Self {
        Self::new(NodeKind::Source, Some(value), None)
    }

    /// Create a computation that has not derived yet.
    pub fn derived(derivation: Derivation) -> Self {
        Self::new(NodeKind::Derived, None, Some(derivation))
    }

    fn new(kind: NodeKind, value: Option<AnyValue>, derivation: Option<Derivation>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            value,
            last_value: None,
            derivation,
            children: IndexSet::new(),
            sources: IndexSet::new(),
            subscribers: IndexMap::new(),
            staleness: 0,
            registry_slot: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref()
    }

    pub fn last_value(&self) -> Option<&AnyValue> {
        self.last_value.as_ref()
    }

    /// Install a new value, remembering the current one as the last value.
    ///
    /// Returns the previous `(value, last_value)` pair for rollback.
    pub fn replace_value(&mut self, value: AnyValue) -> (Option<AnyValue>, Option<AnyValue>) {
        let previous = self.value.replace(value);
        let previous_last = std::mem::replace(&mut self.last_value, previous.clone());
        (previous, previous_last)
    }

    /// Put back a pair returned by [`replace_value`](Self::replace_value).
    ///
    /// Returns the pair being discarded so it can be dropped outside any
    /// borrow of the arena.
    pub fn restore_value(
        &mut self,
        value: Option<AnyValue>,
        last_value: Option<AnyValue>,
    ) -> (Option<AnyValue>, Option<AnyValue>) {
        (
            std::mem::replace(&mut self.value, value),
            std::mem::replace(&mut self.last_value, last_value),
        )
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        self.derivation.as_ref()
    }

    pub fn children(&self) -> &IndexSet<NodeId> {
        &self.children
    }

    pub fn children_snapshot(&self) -> ChildList {
        self.children.iter().copied().collect()
    }

    /// Returns `true` if the child was not present yet.
    pub fn add_child(&mut self, child: NodeId) -> bool {
        self.children.insert(child)
    }

    pub fn remove_child(&mut self, child: NodeId) {
        self.children.shift_remove(&child);
    }

    pub fn sources(&self) -> &IndexSet<NodeId> {
        &self.sources
    }

    pub fn add_source(&mut self, source: NodeId) {
        self.sources.insert(source);
    }

    pub fn remove_source(&mut self, source: NodeId) {
        self.sources.shift_remove(&source);
    }

    pub fn take_sources(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.sources)
    }

    /// Returns `false` if the subscriber was already registered.
    pub fn add_subscriber(&mut self, id: SubscriberId, callback: ErasedCallback) -> bool {
        if self.subscribers.contains_key(&id) {
            return false;
        }
        self.subscribers.insert(id, callback);
        true
    }

    pub fn remove_subscriber(&mut self, id: SubscriberId) -> Option<ErasedCallback> {
        self.subscribers.shift_remove(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Copy of the subscriber list, detached from the live one so callbacks
    /// may unsubscribe while it is being walked.
    pub fn subscribers_snapshot(&self) -> Vec<(SubscriberId, ErasedCallback)> {
        self.subscribers
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect()
    }

    pub fn staleness(&self) -> usize {
        self.staleness
    }

    pub fn is_stale(&self) -> bool {
        self.staleness > 0
    }

    /// Count one more stale notification. Returns `true` on the 0 -> 1 step.
    pub fn mark_stale(&mut self) -> bool {
        self.staleness += 1;
        self.staleness == 1
    }

    /// Match one stale notification. Returns `true` when the node is ready.
    ///
    /// A ready signal with nothing outstanding is ignored so the counter
    /// never underflows.
    pub fn mark_ready(&mut self) -> bool {
        if self.staleness == 0 {
            return false;
        }
        self.staleness -= 1;
        self.staleness == 0
    }

    /// Drop all outstanding stale notifications.
    ///
    /// Returns the registry slot to clear, if any.
    pub fn reset_staleness(&mut self) -> Option<usize> {
        self.staleness = 0;
        self.registry_slot.take()
    }

    pub fn registry_slot(&self) -> Option<usize> {
        self.registry_slot
    }

    pub fn set_registry_slot(&mut self, slot: usize) {
        self.registry_slot = Some(slot);
    }

    pub fn take_registry_slot(&mut self) -> Option<usize> {
        self.registry_slot.take()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("staleness", &self.staleness)
            .field("children", &self.children)
            .field("sources", &self.sources)
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}
