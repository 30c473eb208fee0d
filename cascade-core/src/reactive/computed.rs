//! Computed Implementation
//!
//! A Computed is a derived value. Its derivation runs once when it is
//! created and again whenever the signals or computations it read have all
//! settled after a write. Which nodes it depends on is rediscovered on every
//! run, so a derivation with branches only depends on what the branch taken
//! actually read.
//!
//! A computation never derives while one of its parents is still stale.
//! In a diamond (`a -> b, a -> c, (b, c) -> d`) a write to `a` derives
//! `d` exactly once, after both `b` and `c`.
//!
//! Computations are read-only; there is no way to write one from outside.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::runtime::NodeHandle;
use super::subscriber::{Subscriber, SubscriberId};
use crate::graph::{Node, NodeId};
use crate::value::Value;

/// A read-only value derived from other nodes.
///
/// # Example
///
/// ```rust
/// use cascade_core::Runtime;
///
/// let runtime = Runtime::new();
/// let celsius = runtime.signal(100.0);
/// let fahrenheit = runtime.computed({
///     let celsius = celsius.clone();
///     move || celsius.get() * 9.0 / 5.0 + 32.0
/// })?;
///
/// assert_eq!(fahrenheit.get(), 212.0);
/// celsius.set(0.0)?;
/// assert_eq!(fahrenheit.get(), 32.0);
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub struct Computed<T> {
    handle: Rc<NodeHandle>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Value> Computed<T> {
    pub(crate) fn from_handle(handle: Rc<NodeHandle>) -> Self {
        Self {
            handle,
            marker: PhantomData,
        }
    }

    /// Get the computation's node id.
    pub fn id(&self) -> NodeId {
        self.handle.id()
    }

    /// Get the latest derived value, tracking the read.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the latest derived value without tracking the read.
    pub fn get_untracked(&self) -> T {
        self.handle.with_untracked(T::clone)
    }

    /// Borrow the latest derived value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.handle.with(f)
    }

    /// Attach a subscriber, run once each write that re-derived this
    /// computation commits.
    pub fn subscribe(&self, subscriber: &Subscriber<T>, run_immediately: bool) {
        self.handle
            .runtime()
            .subscribe(self.id(), subscriber.id(), subscriber.erase(), run_immediately);
    }

    /// Detach a subscriber.
    pub fn unsubscribe(&self, subscriber: SubscriberId) {
        self.handle.runtime().unsubscribe(self.id(), subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inspect(Node::subscriber_count)
    }

    /// Number of nodes read on the last derivation.
    pub fn dependency_count(&self) -> usize {
        self.inspect(|node| node.sources().len())
    }

    /// Number of computations that read this one on their last run.
    pub fn child_count(&self) -> usize {
        self.inspect(|node| node.children().len())
    }

    /// Outstanding stale notifications. Zero whenever no write is in flight.
    pub fn staleness(&self) -> usize {
        self.inspect(Node::staleness)
    }

    fn inspect(&self, f: impl FnOnce(&Node) -> usize) -> usize {
        self.handle.runtime().inspect(self.id(), f).unwrap_or(0)
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Rc::clone(&self.handle),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Computed<T>
where
    T: Value + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("dependency_count", &self.dependency_count())
            .field("staleness", &self.staleness())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
