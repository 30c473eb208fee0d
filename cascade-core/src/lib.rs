//! Cascade Core
//!
//! This crate provides a glitch-free reactive dependency graph. It
//! implements:
//!
//! - Writable signals and derived computations
//! - Automatic dependency tracking, rediscovered on every derivation
//! - Two-phase (stale, then ready) change propagation
//! - Detection of circular dependencies, at construction time and on write
//! - Subscribers notified with the new and previous value
//! - Failed writes rolled back across everything they touched
//!
//! "Glitch-free" means no computation ever observes a mix of old and new
//! inputs: after a write, every affected computation derives exactly once,
//! and only after all of its inputs have settled.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: The runtime and the typed handles built on it
//! - `graph`: Nodes, the arena that owns them, and the stale registry
//! - `value`: Which values count as unchanged on write
//! - `config`: Runtime tunables
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use cascade_core::{Runtime, Subscriber};
//!
//! let runtime = Runtime::new();
//!
//! // Create a signal
//! let count = runtime.signal(0);
//!
//! // Create a derived value
//! let doubled = runtime.computed({
//!     let count = count.clone();
//!     move || count.get() * 2
//! })?;
//!
//! // Watch it
//! let log = Subscriber::new(|value: &i32, previous: Option<&i32>| {
//!     println!("doubled: {previous:?} -> {value}");
//! });
//! doubled.subscribe(&log, false);
//!
//! // Update the signal
//! count.set(5)?;
//! assert_eq!(doubled.get(), 10);
//! # Ok::<(), cascade_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

pub use config::RuntimeConfig;
pub use error::{BoxError, Error, Result, SubscriberError};
pub use graph::NodeId;
pub use reactive::{Computed, Runtime, Signal, Subscriber, SubscriberId};
pub use value::Value;
