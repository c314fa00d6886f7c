//! Core domain logic for the route network topology service.
//! This crate owns the versioned graph, the event projector that feeds it,
//! and walk-of-interest validation.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod service;
pub mod store;
pub mod walk;

pub use bootstrap::{CoreError, CoreProjector, RouteNetworkCore};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::element::{
    ElementId, ElementInfo, ElementKind, Geometry, RouteNetworkElement, RouteNode, RouteSegment,
};
pub use model::event::{
    EventId, RouteNetworkCommand, RouteNetworkEditOperationOccurred, RouteNetworkEvent,
};
pub use projection::{
    InMemoryProcessedEvents, ProcessedEventLog, ProcessedLogError, ProjectionError,
    ProjectionReport, RouteNetworkEventProjector, SqliteEventJournal,
};
pub use service::walk_service::{
    InterestId, RegisterWalkOfInterest, RegisterWalkOfInterestResult, WalkOfInterestService,
};
pub use store::{
    AddOutcome, DeleteOutcome, DuplicatePolicy, GraphStore, Snapshot, StoreError, Transaction,
    Version,
};
pub use walk::{build_walk, ValidatedWalk, WalkError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
