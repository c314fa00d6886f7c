//! Versioned, transactional route network graph store.
//!
//! # Responsibility
//! - Own every node and segment of the route network.
//! - Serialize writers through one outstanding transaction at a time.
//! - Serve readers from the latest committed version without blocking on
//!   in-flight writes.
//!
//! # Invariants
//! - Element ids are unique among live elements at every committed version.
//! - A segment is only added when both endpoints are live nodes.
//! - Each commit produces exactly one new version; committed records are never
//!   mutated in place.

mod state;
mod transaction;

pub use state::{ElementRecord, Snapshot, Version};
pub use transaction::Transaction;

use crate::model::element::{ElementId, ElementKind, RouteNetworkElement};
use state::GraphState;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by graph store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another transaction is still open on this store.
    TransactionInProgress,
    /// Add of a live id while duplicates are rejected.
    DuplicateElement(ElementId),
    /// Segment endpoint is not a live node.
    DanglingReference {
        segment: ElementId,
        missing_node: ElementId,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransactionInProgress => {
                write!(f, "a graph transaction is already in progress")
            }
            Self::DuplicateElement(id) => write!(f, "route network element already exists: {id}"),
            Self::DanglingReference {
                segment,
                missing_node,
            } => write!(
                f,
                "route segment {segment} references missing route node {missing_node}"
            ),
        }
    }
}

impl Error for StoreError {}

/// How `add`/`delete` treat ids that are already present (or absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateElement` on add of a live id.
    Reject,
    /// Treat a repeated add as a silent no-op. Used for replay.
    Ignore,
}

/// Result of a successful `Transaction::add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    DuplicateIgnored,
}

/// Result of `Transaction::delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(ElementKind),
    NotFound,
}

/// Process-wide graph store. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct GraphStore {
    current: RwLock<Arc<GraphState>>,
    writer: Mutex<()>,
}

impl GraphStore {
    /// Creates an empty store at version `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the single writer scope.
    ///
    /// # Errors
    /// - `TransactionInProgress` when another transaction is still open.
    pub fn begin_transaction(&self) -> StoreResult<Transaction<'_>> {
        let writer = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(StoreError::TransactionInProgress),
        };

        Ok(Transaction::new(self, writer, self.current_state()))
    }

    /// Returns a handle on the latest committed version.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.current_state())
    }

    /// Looks up a live element in the latest committed version.
    pub fn get_element(&self, id: ElementId) -> Option<Arc<RouteNetworkElement>> {
        self.current_state().live_element(id).cloned()
    }

    pub fn version(&self) -> Version {
        self.current_state().version
    }

    fn current_state(&self) -> Arc<GraphState> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Applies a committed delta to the current version.
    ///
    /// Must be called with the writer lock held. When no snapshot shares the
    /// current version it is updated in place; otherwise a copy is built
    /// outside the read/write lock and swapped in.
    pub(crate) fn merge_commit(&self, apply: impl FnOnce(&mut GraphState)) {
        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(state) = Arc::get_mut(&mut *guard) {
                apply(state);
                return;
            }
        }

        let mut next = GraphState::clone(&self.current_state());
        apply(&mut next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
    }
}
