//! Subscriber types for the reactive system.
//!
//! A Subscriber is a plain callback attached to a signal or computation.
//! Unlike a computation it produces nothing the graph can read; it runs
//! after the node it watches has settled, with the new value and the value
//! held before.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BoxError;
use crate::graph::ErasedCallback;
use crate::value::Value;

/// Unique identifier for a subscriber.
///
/// Membership on a node is tracked by this id, so subscribing the same
/// subscriber (or a clone of it) twice registers it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

type Callback<T> = dyn Fn(&T, Option<&T>) -> Result<(), BoxError>;

/// A callback invoked with `(new_value, previous_value)`.
///
/// `previous_value` is `None` until the node has been written or
/// re-derived at least once. Cloning a subscriber keeps its id.
///
/// # Example
///
/// ```rust
/// use cascade_core::{Runtime, Subscriber};
///
/// let runtime = Runtime::new();
/// let count = runtime.signal(1);
///
/// let log = Subscriber::new(|new: &i32, previous: Option<&i32>| {
///     println!("{previous:?} -> {new}");
/// });
/// count.subscribe(&log, false);
/// count.set(2)?;
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub struct Subscriber<T> {
    id: SubscriberId,
    callback: Rc<Callback<T>>,
}

impl<T: Value> Subscriber<T> {
    /// Create a subscriber from an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T, Option<&T>) + 'static,
    {
        Self::fallible(move |value, previous| {
            callback(value, previous);
            Ok(())
        })
    }

    /// Create a subscriber whose callback may fail.
    ///
    /// A failure does not stop the other subscribers of the node and does
    /// not roll anything back. It is logged and queued on the runtime.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&T, Option<&T>) -> Result<(), BoxError> + 'static,
    {
        Self {
            id: SubscriberId::new(),
            callback: Rc::new(callback),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback directly.
    pub fn notify(&self, value: &T, previous: Option<&T>) -> Result<(), BoxError> {
        (self.callback)(value, previous)
    }

    /// Type-erase the callback for storage on a node.
    pub(crate) fn erase(&self) -> ErasedCallback {
        let callback = Rc::clone(&self.callback);
        Rc::new(move |value: &dyn Any, previous: Option<&dyn Any>| {
            match value.downcast_ref::<T>() {
                Some(value) => callback(value, previous.and_then(|p| p.downcast_ref::<T>())),
                None => Ok(()),
            }
        })
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}
