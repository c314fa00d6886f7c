//! SQLite-backed processed-event journal.
//!
//! # Responsibility
//! - Persist every applied event so deduplication survives a restart.
//! - Hand the same events back at startup to rebuild the in-memory graph.
//!
//! # Invariants
//! - One row per event id; re-recording an id is ignored.
//! - Replay order is insertion order (`rowid`), which is batch order.
//! - The in-memory id cache mirrors the table after every `record`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::event::{EventId, RouteNetworkEvent};
use crate::projection::processed::{ProcessedEventLog, ProcessedLogError, ProcessedLogResult};
use log::info;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Durable processed-event log.
pub struct SqliteEventJournal {
    conn: Connection,
    known: HashSet<EventId>,
}

impl SqliteEventJournal {
    /// Opens (or creates) the journal at `path`.
    pub fn open(path: impl AsRef<Path>) -> ProcessedLogResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    pub fn open_in_memory() -> ProcessedLogResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already migrated connection and loads known event ids.
    pub fn from_connection(conn: Connection) -> ProcessedLogResult<Self> {
        let known = load_known_ids(&conn)?;
        info!(
            "event=journal_load module=projection status=ok known_events={}",
            known.len()
        );
        Ok(Self { conn, known })
    }
}

impl ProcessedEventLog for SqliteEventJournal {
    fn is_processed(&self, event_id: EventId) -> ProcessedLogResult<bool> {
        Ok(self.known.contains(&event_id))
    }

    fn record(&mut self, events: &[RouteNetworkEvent]) -> ProcessedLogResult<()> {
        let mut inserted = Vec::with_capacity(events.len());

        let tx = self.conn.transaction()?;
        for event in events {
            let (Some(event_id), Some(sequence_number)) = (event.event_id(), event.sequence_number())
            else {
                continue;
            };
            let sequence_number = i64::try_from(sequence_number).map_err(|_| {
                ProcessedLogError::InvalidData(format!(
                    "sequence number {sequence_number} of event {event_id} exceeds i64"
                ))
            })?;
            let payload = serde_json::to_string(event)?;

            tx.execute(
                "INSERT OR IGNORE INTO processed_events (
                    event_id,
                    sequence_number,
                    event_type,
                    payload
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    event_id.to_string(),
                    sequence_number,
                    event.event_type(),
                    payload
                ],
            )?;
            inserted.push(event_id);
        }
        tx.commit()?;

        self.known.extend(inserted);
        Ok(())
    }

    fn journaled_events(&self) -> ProcessedLogResult<Vec<RouteNetworkEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT event_id, payload FROM processed_events ORDER BY rowid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            let event_id: String = row.get("event_id")?;
            let payload: String = row.get("payload")?;
            let event = serde_json::from_str::<RouteNetworkEvent>(&payload).map_err(|err| {
                ProcessedLogError::InvalidData(format!(
                    "undecodable payload for event `{event_id}`: {err}"
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    fn len(&self) -> usize {
        self.known.len()
    }
}

fn load_known_ids(conn: &Connection) -> ProcessedLogResult<HashSet<EventId>> {
    let mut stmt = conn.prepare("SELECT event_id FROM processed_events;")?;
    let mut rows = stmt.query([])?;
    let mut known = HashSet::new();

    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        let id = Uuid::parse_str(&text).map_err(|_| {
            ProcessedLogError::InvalidData(format!(
                "invalid uuid value `{text}` in processed_events.event_id"
            ))
        })?;
        known.insert(id);
    }

    Ok(known)
}
