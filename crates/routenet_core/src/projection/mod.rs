//! Event projection from the route network event log into the graph store.
//!
//! # Responsibility
//! - Replay edit-operation batches into the graph store.
//! - Track which events were already applied, in memory or durably.
//!
//! # See also
//! - `crate::store` for the transaction contract used per batch.

pub mod journal;
pub mod processed;
pub mod projector;

pub use journal::SqliteEventJournal;
pub use processed::{
    InMemoryProcessedEvents, ProcessedEventLog, ProcessedLogError, ProcessedLogResult,
};
pub use projector::{
    ProjectionError, ProjectionReport, ProjectionResult, RouteNetworkEventProjector,
};
