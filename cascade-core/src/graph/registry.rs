//! Stale Registry
//!
//! Every node that goes from ready to stale during a write takes a slot
//! here, and gives it back when it becomes ready again. The outermost write
//! remembers how long the registry was when it started; once its ready
//! broadcast is done, any slot at or past that mark still occupied belongs
//! to a node that never received its matching ready signal. That only
//! happens when a node ends up waiting on itself.
//!
//! Slots are only reclaimed by [`drain_since`](StaleRegistry::drain_since),
//! so the outermost mark stays valid while nested writes come and go. The
//! registry is empty whenever no write is in flight.

use super::node::NodeId;

/// Transient list of nodes that are stale within the writes in flight.
#[derive(Debug, Default)]
pub(crate) struct StaleRegistry {
    slots: Vec<Option<NodeId>>,
    occupied: usize,
}

impl StaleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly stale node and return its slot.
    pub fn register(&mut self, node: NodeId) -> usize {
        self.slots.push(Some(node));
        self.occupied += 1;
        self.slots.len() - 1
    }

    /// Free a slot. Freeing an already free slot does nothing.
    pub fn clear_slot(&mut self, slot: usize) {
        if let Some(entry) = self.slots.get_mut(slot) {
            if entry.take().is_some() {
                self.occupied -= 1;
            }
        }
    }

    /// Current length, used as a write's mark.
    pub fn mark(&self) -> usize {
        self.slots.len()
    }

    /// Nodes registered at or after `mark` that still hold their slot.
    pub fn pending_since(&self, mark: usize) -> Vec<NodeId> {
        self.slots
            .get(mark..)
            .unwrap_or_default()
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    /// Drop every slot at or after `mark`, returning the nodes still pending.
    pub fn drain_since(&mut self, mark: usize) -> Vec<NodeId> {
        if mark >= self.slots.len() {
            return Vec::new();
        }
        let pending: Vec<NodeId> = self.slots.drain(mark..).flatten().collect();
        self.occupied -= pending.len();
        pending
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }
}
