//! Runtime Configuration

/// Default bound on nested re-entrant writes.
pub const DEFAULT_MAX_WRITE_DEPTH: usize = 256;

/// Default number of queued subscriber failures kept before dropping the oldest.
pub const DEFAULT_UNHANDLED_ERROR_CAPACITY: usize = 64;

/// Tunables for a [`Runtime`](crate::reactive::Runtime).
///
/// # Example
///
/// ```rust
/// use cascade_core::{Runtime, RuntimeConfig};
///
/// let runtime = Runtime::with_config(
///     RuntimeConfig::default()
///         .max_write_depth(32)
///         .unhandled_error_capacity(8),
/// );
/// assert_eq!(runtime.config().max_write_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How deeply writes may nest (a subscriber or derivation writing while
    /// another write is in flight) before failing with
    /// [`Error::DepthExceeded`](crate::Error::DepthExceeded).
    pub max_write_depth: usize,

    /// Capacity of the deferred subscriber-error queue.
    pub unhandled_error_capacity: usize,
}

impl RuntimeConfig {
    /// Set [`max_write_depth`](Self::max_write_depth). Values below 1 are raised to 1.
    pub fn max_write_depth(mut self, depth: usize) -> Self {
        self.max_write_depth = depth.max(1);
        self
    }

    /// Set [`unhandled_error_capacity`](Self::unhandled_error_capacity).
    pub fn unhandled_error_capacity(mut self, capacity: usize) -> Self {
        self.unhandled_error_capacity = capacity;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_write_depth: DEFAULT_MAX_WRITE_DEPTH,
            unhandled_error_capacity: DEFAULT_UNHANDLED_ERROR_CAPACITY,
        }
    }
}
