//! Domain model for the route network graph and its event stream.
//!
//! # Responsibility
//! - Define the element shapes owned by the graph store.
//! - Define the event shapes replayed by the projector.
//!
//! # Invariants
//! - Every element and every event is identified by a stable UUID.
//! - Attribute groups and geometry are opaque to the core.

pub mod element;
pub mod event;
