//! Signal Implementation
//!
//! A Signal is the writable leaf of the graph. It holds a value, and every
//! computation that reads it while deriving becomes one of its children.
//!
//! # How Writes Work
//!
//! 1. `set` compares the new value with the current one through
//!    [`Value::is_identical`]. An identical primitive is dropped on the spot.
//!
//! 2. Otherwise the runtime broadcasts stale to the children, stores the
//!    value, broadcasts ready, and validates that everything settled.
//!
//! 3. Once the outermost write commits, subscribers of every settled node
//!    run, those of the signal last, with the new and previous values.
//!
//! If propagation fails, the signal and every computation that re-derived
//! are rolled back to the values they held before the write, and the error
//! is returned.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::runtime::NodeHandle;
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::Result;
use crate::graph::{AnyValue, Node, NodeId};
use crate::value::Value;

/// A writable reactive cell holding a value of type `T`.
///
/// Clones share the same node. The node lives until the last clone (and
/// the last computation that captured one) is dropped.
///
/// # Example
///
/// ```rust
/// use cascade_core::Runtime;
///
/// let runtime = Runtime::new();
/// let count = runtime.signal(0);
///
/// assert_eq!(count.get(), 0);
/// count.set(5)?;
/// count.update(|n| n + 1)?;
/// assert_eq!(count.get(), 6);
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub struct Signal<T> {
    handle: Rc<NodeHandle>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Value> Signal<T> {
    pub(crate) fn from_handle(handle: Rc<NodeHandle>) -> Self {
        Self {
            handle,
            marker: PhantomData,
        }
    }

    /// Get the signal's node id.
    pub fn id(&self) -> NodeId {
        self.handle.id()
    }

    /// Get the current value.
    ///
    /// Inside a derivation this also makes the running computation a child
    /// of this signal.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.handle.with(f)
    }

    /// Borrow the current value without tracking the read.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.handle.with_untracked(f)
    }

    /// Write a new value and propagate it.
    ///
    /// Returns the value written. Writing a primitive equal to the current
    /// value does nothing. On error the graph keeps its previous values.
    pub fn set(&self, value: T) -> Result<T> {
        if self.with_untracked(|current| current.is_identical(&value)) {
            return Ok(value);
        }
        let stored: AnyValue = Rc::new(value.clone());
        self.handle.runtime().write(self.id(), stored)?;
        Ok(value)
    }

    /// Write a value computed from the current one.
    pub fn update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with_untracked(f);
        self.set(next)
    }

    /// Attach a subscriber. Attaching the same subscriber again is a no-op,
    /// except that `run_immediately` still invokes it with the current value.
    pub fn subscribe(&self, subscriber: &Subscriber<T>, run_immediately: bool) {
        self.handle
            .runtime()
            .subscribe(self.id(), subscriber.id(), subscriber.erase(), run_immediately);
    }

    /// Detach a subscriber. Unknown subscribers are ignored.
    pub fn unsubscribe(&self, subscriber: SubscriberId) {
        self.handle.runtime().unsubscribe(self.id(), subscriber);
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handle
            .runtime()
            .inspect(self.id(), Node::subscriber_count)
            .unwrap_or(0)
    }

    /// Number of computations that read this signal on their last run.
    pub fn child_count(&self) -> usize {
        self.handle
            .runtime()
            .inspect(self.id(), |node| node.children().len())
            .unwrap_or(0)
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Rc::clone(&self.handle),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Signal<T>
where
    T: Value + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::reactive::Runtime;

    #[test]
    fn signal_get_and_set() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);
        assert_eq!(signal.get(), 0);

        assert_eq!(signal.set(42).unwrap(), 42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let runtime = Runtime::new();
        let signal = runtime.signal(10);
        signal.update(|v| v + 5).unwrap();
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_notifies_subscribers() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let subscriber = Subscriber::new({
            let seen = Rc::clone(&seen);
            move |value: &i32, previous: Option<&i32>| {
                seen.borrow_mut().push((*value, previous.copied()));
            }
        });
        signal.subscribe(&subscriber, false);
        assert!(seen.borrow().is_empty());

        signal.set(1).unwrap();
        signal.set(2).unwrap();
        assert_eq!(*seen.borrow(), vec![(1, Some(0)), (2, Some(1))]);
    }

    #[test]
    fn identical_primitive_is_not_propagated() {
        let runtime = Runtime::new();
        let signal = runtime.signal(7);
        let calls = Rc::new(Cell::new(0));

        let subscriber = Subscriber::new({
            let calls = Rc::clone(&calls);
            move |_: &i32, _| calls.set(calls.get() + 1)
        });
        signal.subscribe(&subscriber, false);

        signal.set(7).unwrap();
        assert_eq!(calls.get(), 0);
        signal.set(8).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reference_values_always_propagate() {
        let runtime = Runtime::new();
        let signal = runtime.signal(vec![1, 2]);
        let calls = Rc::new(Cell::new(0));

        let subscriber = Subscriber::new({
            let calls = Rc::clone(&calls);
            move |_: &Vec<i32>, _| calls.set(calls.get() + 1)
        });
        signal.subscribe(&subscriber, false);

        signal.set(vec![1, 2]).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn signal_unsubscribe() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);
        let calls = Rc::new(Cell::new(0));

        let subscriber = Subscriber::new({
            let calls = Rc::clone(&calls);
            move |_: &i32, _| calls.set(calls.get() + 1)
        });
        signal.subscribe(&subscriber, false);
        signal.set(1).unwrap();
        assert_eq!(calls.get(), 1);

        signal.unsubscribe(subscriber.id());
        signal.set(2).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn subscribing_twice_registers_once() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);
        let calls = Rc::new(Cell::new(0));

        let subscriber = Subscriber::new({
            let calls = Rc::clone(&calls);
            move |_: &i32, _| calls.set(calls.get() + 1)
        });
        signal.subscribe(&subscriber, false);
        signal.subscribe(&subscriber.clone(), false);
        assert_eq!(signal.subscriber_count(), 1);

        signal.set(1).unwrap();
        assert_eq!(calls.get(), 1);

        // Still runs immediately when asked to, even though already attached.
        signal.subscribe(&subscriber, true);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn signal_clone_shares_state() {
        let runtime = Runtime::new();
        let signal1 = runtime.signal(0);
        let signal2 = signal1.clone();

        signal1.set(42).unwrap();
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn debug_shows_value() {
        let runtime = Runtime::new();
        let signal = runtime.signal(3);
        let rendered = format!("{signal:?}");
        assert!(rendered.contains("value: 3"));
    }
}
