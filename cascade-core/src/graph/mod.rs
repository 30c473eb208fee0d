//! Dependency Graph
//!
//! This module holds the data side of the reactive system: the nodes, the
//! arena that owns them, and the registry of nodes that are stale within
//! the write currently in flight.
//!
//! # Overview
//!
//! The graph is a directed graph where:
//!
//! - Nodes are signals (writable cells) or computations (derived values)
//! - Edges point from a node to the computations that read it ("children")
//!
//! Edges are discovered, not declared. A computation's edges are rebuilt
//! every time it re-derives, because the branches it takes can differ
//! between runs.
//!
//! # Design Decisions
//!
//! 1. Nodes live in an arena keyed by [`NodeId`] instead of pointing at each
//!    other. Children and sources are id sets, so a dependent can disappear
//!    at any time without leaving a dangling reference behind.
//!
//! 2. Ids are never reused, which makes a leftover id harmless: it simply
//!    resolves to nothing and propagation skips it.
//!
//! 3. Both edge directions are stored so a computation can detach from its
//!    parents in time proportional to its own dependency count.

mod arena;
mod node;
mod registry;

pub use node::NodeId;

pub(crate) use arena::NodeArena;
pub(crate) use node::{AnyValue, ChildList, Derivation, ErasedCallback, Node, NodeKind};
pub(crate) use registry::StaleRegistry;
