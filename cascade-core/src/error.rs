//! Error Types
//!
//! The engine has exactly one failure kind of its own: a circular dependency,
//! detected either by the re-entrancy guard on the tracker stack or by the
//! stale registry after a write settles. Everything else is the caller's own
//! error travelling through unchanged.

use std::error::Error as StdError;
use std::fmt;

use crate::graph::NodeId;
use crate::reactive::SubscriberId;

/// Boxed error produced by user code (derivations and subscribers).
pub type BoxError = Box<dyn StdError + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by reads, writes and computation construction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A computation was asked to derive while it was already deriving.
    #[error("circular computation detected: {node} is already being derived")]
    CircularComputation {
        /// The computation found twice on the tracker stack.
        node: NodeId,
    },

    /// A write settled while some nodes were still waiting on a ready signal.
    #[error("circular dependency detected: {} node(s) never settled ({})", nodes.len(), NodeList(nodes))]
    CircularDependency {
        /// Nodes left stale when the write finished.
        nodes: Vec<NodeId>,
    },

    /// Re-entrant writes nested deeper than the configured limit.
    #[error("write nesting exceeded the limit of {limit}")]
    DepthExceeded {
        /// The configured `max_write_depth`.
        limit: usize,
    },

    /// An error raised by a user derivation, passed through as-is.
    #[error(transparent)]
    Derivation(BoxError),
}

impl Error {
    /// Wrap a caller error so it can be returned from a derivation.
    pub fn custom<E>(error: E) -> Self
    where
        E: StdError + 'static,
    {
        Self::Derivation(Box::new(error))
    }

    /// Wrap a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Derivation(message.into().into())
    }

    /// True for both circular-dependency detections.
    pub fn is_circular(&self) -> bool {
        matches!(
            self,
            Self::CircularComputation { .. } | Self::CircularDependency { .. }
        )
    }

    /// Recover the caller's own error type from a derivation failure.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Derivation(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A subscriber callback that failed during notification.
///
/// These never abort propagation. They are logged and queued on the
/// runtime, see [`Runtime::take_unhandled_errors`](crate::reactive::Runtime::take_unhandled_errors).
#[derive(Debug, thiserror::Error)]
#[error("subscriber {subscriber} of {node} failed: {source}")]
pub struct SubscriberError {
    /// Node whose notification pass invoked the subscriber.
    pub node: NodeId,
    /// The failing subscriber.
    pub subscriber: SubscriberId,
    /// What the callback returned.
    #[source]
    pub source: BoxError,
}

struct NodeList<'a>(&'a [NodeId]);

impl fmt::Display for NodeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}
