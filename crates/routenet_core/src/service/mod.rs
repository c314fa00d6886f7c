//! Core use-case services.
//!
//! # Responsibility
//! - Expose command-level entry points on top of the graph store.
//! - Keep CLI and other callers decoupled from store internals.

pub mod walk_service;
