//! Processed-event bookkeeping used for replay deduplication.
//!
//! # Responsibility
//! - Answer "has this event id already been applied?".
//! - Remember newly applied events after each committed batch.
//!
//! # Invariants
//! - Ids are only ever added; nothing is evicted during the log's lifetime.
//! - `record` is called after the store commit of the same batch.

use crate::db::DbError;
use crate::model::event::{EventId, RouteNetworkEvent};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProcessedLogResult<T> = Result<T, ProcessedLogError>;

/// Errors from processed-event log backends.
#[derive(Debug)]
pub enum ProcessedLogError {
    Db(DbError),
    Serialize(serde_json::Error),
    InvalidData(String),
}

impl Display for ProcessedLogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to encode journal payload: {err}"),
            Self::InvalidData(message) => write!(f, "invalid journal data: {message}"),
        }
    }
}

impl Error for ProcessedLogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for ProcessedLogError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProcessedLogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for ProcessedLogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Storage contract for event ids the projector has already handled.
pub trait ProcessedEventLog {
    fn is_processed(&self, event_id: EventId) -> ProcessedLogResult<bool>;
    /// Marks `events` as processed. Events without an id are skipped.
    fn record(&mut self, events: &[RouteNetworkEvent]) -> ProcessedLogResult<()>;
    /// Events to replay into an empty store at startup, in recording order.
    ///
    /// Non-durable logs have nothing to replay.
    fn journaled_events(&self) -> ProcessedLogResult<Vec<RouteNetworkEvent>> {
        Ok(Vec::new())
    }
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: ProcessedEventLog + ?Sized> ProcessedEventLog for Box<L> {
    fn is_processed(&self, event_id: EventId) -> ProcessedLogResult<bool> {
        (**self).is_processed(event_id)
    }

    fn record(&mut self, events: &[RouteNetworkEvent]) -> ProcessedLogResult<()> {
        (**self).record(events)
    }

    fn journaled_events(&self) -> ProcessedLogResult<Vec<RouteNetworkEvent>> {
        (**self).journaled_events()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Process-lifetime set of seen event ids.
///
/// Only guards against in-process redelivery; a restart forgets everything,
/// which is consistent with an in-memory store rebuilt by full replay.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessedEvents {
    seen: HashSet<EventId>,
}

impl InMemoryProcessedEvents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessedEventLog for InMemoryProcessedEvents {
    fn is_processed(&self, event_id: EventId) -> ProcessedLogResult<bool> {
        Ok(self.seen.contains(&event_id))
    }

    fn record(&mut self, events: &[RouteNetworkEvent]) -> ProcessedLogResult<()> {
        self.seen
            .extend(events.iter().filter_map(RouteNetworkEvent::event_id));
        Ok(())
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}
