//! Route network event projector.
//!
//! # Responsibility
//! - Apply edit-operation batches to the graph store exactly once per event.
//! - Keep going past events whose dependencies are missing.
//!
//! # Invariants
//! - One store transaction per batch, committed once regardless of
//!   per-event outcomes.
//! - Duplicate event ids are skipped before any store mutation.
//! - Every recognized event that passes dedup is marked processed, including
//!   rejected ones; the upstream stream is the source of truth.
//! - A batch is visible in the store only once its events are recorded in
//!   the processed-event log.

use crate::model::event::{EventId, RouteNetworkEditOperationOccurred, RouteNetworkEvent};
use crate::projection::processed::{ProcessedEventLog, ProcessedLogError};
use crate::store::{DuplicatePolicy, GraphStore, StoreError, Transaction, Version};
use log::{debug, error, info, log_enabled, trace, Level};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Batch-level projector failures. Per-event problems never end up here.
#[derive(Debug)]
pub enum ProjectionError {
    Store(StoreError),
    Log(ProcessedLogError),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Log(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Log(err) => Some(err),
        }
    }
}

impl From<StoreError> for ProjectionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ProcessedLogError> for ProjectionError {
    fn from(value: ProcessedLogError) -> Self {
        Self::Log(value)
    }
}

/// Per-batch counters returned by `apply` and `restore`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub applied: usize,
    pub skipped_duplicates: usize,
    /// Events dropped because their dependencies were missing.
    pub rejected: usize,
    pub ignored_unknown: usize,
    pub committed_version: Version,
}

impl ProjectionReport {
    /// Total number of events seen in the batch.
    pub fn total(&self) -> usize {
        self.applied + self.skipped_duplicates + self.rejected + self.ignored_unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventOutcome {
    Applied,
    Rejected,
    Ignored,
}

/// Keeps a [`GraphStore`] in sync with the route network event log.
pub struct RouteNetworkEventProjector<L: ProcessedEventLog> {
    store: Arc<GraphStore>,
    processed: L,
}

impl<L: ProcessedEventLog> RouteNetworkEventProjector<L> {
    pub fn new(store: Arc<GraphStore>, processed: L) -> Self {
        Self { store, processed }
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn processed_log(&self) -> &L {
        &self.processed
    }

    /// Applies one edit-operation message.
    ///
    /// # Errors
    /// - `Store(TransactionInProgress)` when another writer holds the store.
    /// - `Log` when the processed-event log cannot be read or written; the
    ///   batch is rolled back and the store version does not advance.
    pub fn apply(
        &mut self,
        message: &RouteNetworkEditOperationOccurred,
    ) -> ProjectionResult<ProjectionReport> {
        let started_at = Instant::now();
        info!(
            "event=projection_apply module=projection status=start message_id={} commands={}",
            display_id(message.event_id),
            message.command_count()
        );
        if log_enabled!(Level::Trace) {
            if let Ok(payload) = serde_json::to_string(message) {
                trace!("event=projection_payload module=projection payload={payload}");
            }
        }

        let mut tx = self.store.begin_transaction()?;
        let mut report = ProjectionReport::default();
        let mut newly_processed = Vec::new();
        let mut batch_ids: HashSet<EventId> = HashSet::new();

        for event in message.events() {
            if let Some(event_id) = event.event_id() {
                if batch_ids.contains(&event_id) || self.processed.is_processed(event_id)? {
                    debug!(
                        "event=projection_event module=projection status=skipped reason=already_processed type={} event_id={}",
                        event.event_type(),
                        event_id
                    );
                    report.skipped_duplicates += 1;
                    continue;
                }
                batch_ids.insert(event_id);
                newly_processed.push(event.clone());
            }

            match apply_event(&mut tx, event) {
                EventOutcome::Applied => report.applied += 1,
                EventOutcome::Rejected => report.rejected += 1,
                EventOutcome::Ignored => report.ignored_unknown += 1,
            }
        }

        // Journal first: a failed write drops `tx` and leaves the store as it was.
        self.processed.record(&newly_processed)?;
        report.committed_version = tx.commit();

        info!(
            "event=projection_apply module=projection status=ok version={} applied={} skipped={} rejected={} ignored={} duration_ms={}",
            report.committed_version,
            report.applied,
            report.skipped_duplicates,
            report.rejected,
            report.ignored_unknown,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Rebuilds the store from the processed-event log's journal.
    ///
    /// Meant for startup against an empty store. Journaled events are applied
    /// in order inside one transaction without dedup checks. Returns an
    /// empty report without committing when there is nothing to replay.
    pub fn restore(&mut self) -> ProjectionResult<ProjectionReport> {
        let events = self.processed.journaled_events()?;
        if events.is_empty() {
            return Ok(ProjectionReport {
                committed_version: self.store.version(),
                ..ProjectionReport::default()
            });
        }

        let mut tx = self.store.begin_transaction()?;
        let mut report = ProjectionReport::default();
        for event in &events {
            match apply_event(&mut tx, event) {
                EventOutcome::Applied => report.applied += 1,
                EventOutcome::Rejected => report.rejected += 1,
                EventOutcome::Ignored => report.ignored_unknown += 1,
            }
        }
        report.committed_version = tx.commit();

        info!(
            "event=projection_restore module=projection status=ok version={} replayed={} rejected={}",
            report.committed_version, report.applied, report.rejected
        );
        Ok(report)
    }
}

fn apply_event(tx: &mut Transaction<'_>, event: &RouteNetworkEvent) -> EventOutcome {
    if let Some(sequence_number) = event.sequence_number() {
        debug!(
            "event=projection_event module=projection status=received type={} seq={}",
            event.event_type(),
            sequence_number
        );
    }

    match event {
        RouteNetworkEvent::RouteNodeAdded(added) => {
            match tx.add(added.to_node(), DuplicatePolicy::Ignore) {
                Ok(_) => EventOutcome::Applied,
                Err(err) => {
                    error!(
                        "event=projection_event module=projection status=rejected type=RouteNodeAdded event_id={} node_id={} error={}",
                        added.event_id, added.node_id, err
                    );
                    EventOutcome::Rejected
                }
            }
        }
        RouteNetworkEvent::RouteSegmentAdded(added) => {
            match tx.add(added.to_segment(), DuplicatePolicy::Ignore) {
                Ok(_) => EventOutcome::Applied,
                Err(StoreError::DanglingReference { missing_node, .. }) => {
                    let end = if missing_node == added.from_node_id {
                        "from_node_id"
                    } else {
                        "to_node_id"
                    };
                    error!(
                        "event=projection_event module=projection status=rejected reason=broken_event_stream type=RouteSegmentAdded event_id={} segment_id={} {}={} detail=node_not_in_current_state",
                        added.event_id, added.segment_id, end, missing_node
                    );
                    EventOutcome::Rejected
                }
                Err(err) => {
                    error!(
                        "event=projection_event module=projection status=rejected type=RouteSegmentAdded event_id={} segment_id={} error={}",
                        added.event_id, added.segment_id, err
                    );
                    EventOutcome::Rejected
                }
            }
        }
        RouteNetworkEvent::RouteNodeMarkedForDeletion(marked) => {
            tx.delete(marked.node_id, DuplicatePolicy::Ignore);
            EventOutcome::Applied
        }
        RouteNetworkEvent::RouteSegmentMarkedForDeletion(marked) => {
            tx.delete(marked.segment_id, DuplicatePolicy::Ignore);
            EventOutcome::Applied
        }
        RouteNetworkEvent::RouteSegmentRemoved(removed) => {
            tx.delete(removed.segment_id, DuplicatePolicy::Ignore);
            EventOutcome::Applied
        }
        RouteNetworkEvent::Unknown => {
            debug!("event=projection_event module=projection status=ignored reason=unknown_event_type");
            EventOutcome::Ignored
        }
    }
}

fn display_id(id: Option<EventId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
