//! Dependency Tracker
//!
//! The tracker records which computation is currently deriving. When a node
//! is read, the runtime asks the tracker for the top of its stack and, if
//! there is a computation there, records it as a child of the node.
//!
//! # Implementation
//!
//! The tracker is a stack rather than a single slot because derivations
//! nest: a derivation may write to a signal, whose propagation re-derives a
//! second computation while the first is still running. Reads always
//! consult the top entry only.
//!
//! Entering a scope pushes; the returned guard pops when dropped, so the
//! stack stays balanced even if a derivation returns early or panics.
//!
//! Each runtime owns its own tracker. It is empty whenever no derivation is
//! running.

use std::cell::RefCell;

use crate::graph::NodeId;

/// The stack of running derivations.
///
/// A `None` entry marks an untracked region: reads inside it record nothing,
/// even if a derivation further down the stack is running.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    stack: RefCell<Vec<Option<NodeId>>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a tracking scope for `node`.
    ///
    /// Reads performed until the guard drops register `node` as a child.
    pub fn enter(&self, node: NodeId) -> TrackingScope<'_> {
        self.stack.borrow_mut().push(Some(node));
        TrackingScope {
            tracker: self,
            entry: Some(node),
        }
    }

    /// Enter a region in which reads are not tracked.
    pub fn suspend(&self) -> TrackingScope<'_> {
        self.stack.borrow_mut().push(None);
        TrackingScope {
            tracker: self,
            entry: None,
        }
    }

    /// The computation reads should be attributed to, if any.
    pub fn current(&self) -> Option<NodeId> {
        self.stack.borrow().last().copied().flatten()
    }

    /// Whether `node` is deriving anywhere on the stack.
    pub fn contains(&self, node: NodeId) -> bool {
        self.stack.borrow().contains(&Some(node))
    }

    pub fn is_empty(&self) -> bool {
        self.stack.borrow().is_empty()
    }
}

/// Guard that pops the tracker when dropped.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub(crate) struct TrackingScope<'a> {
    tracker: &'a Tracker,
    entry: Option<NodeId>,
}

impl Drop for TrackingScope<'_> {
    fn drop(&mut self) {
        let popped = self.tracker.stack.borrow_mut().pop();

        // Verify we're popping the right scope.
        debug_assert_eq!(
            popped,
            Some(self.entry),
            "tracking scope mismatch: expected {:?}, got {:?}",
            self.entry,
            popped
        );
    }
}
