//! Reactive Primitives
//!
//! This module implements the user-facing half of the engine: signals,
//! computations and subscribers, all owned by a [`Runtime`].
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal is read while a
//! computation is deriving, the computation becomes one of its children.
//! Writing the signal re-derives every computation downstream of it.
//!
//! ## Computations
//!
//! A Computed holds a value derived from other nodes. It re-derives after
//! its inputs change, once per write, and only after all of them settled.
//!
//! ## Subscribers
//!
//! A Subscriber is a callback attached to a node. It runs once the write
//! that settled the node has committed, and receives the new value together
//! with the previous one.
//!
//! # Implementation Notes
//!
//! Dependencies are discovered automatically: each runtime keeps a stack of
//! the derivations currently running, and every read is attributed to the
//! top of that stack.

mod computed;
mod context;
mod runtime;
mod signal;
mod subscriber;

pub use computed::Computed;
pub use runtime::Runtime;
pub use signal::Signal;
pub use subscriber::{Subscriber, SubscriberId};
