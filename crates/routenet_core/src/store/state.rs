//! Committed graph versions and read-only snapshots.
//!
//! # Responsibility
//! - Hold the element arena, version chains and incidence index.
//! - Answer point-in-time lookups without touching writer state.
//!
//! # Invariants
//! - At most one live record exists per element id.
//! - Version chains are append-only; closing a record only sets `deleted_in`.
//! - Incidence is keyed by node id and maintained from segment adds/deletes,
//!   so it survives a node being deleted and re-added.

use crate::model::element::{ElementId, RouteNetworkElement, RouteNode, RouteSegment};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Monotonic store version. `0` is the empty store.
pub type Version = u64;

/// One entry in an element's version chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub element: Arc<RouteNetworkElement>,
    pub created_in: Version,
    /// Version whose commit removed the element, if any.
    pub deleted_in: Option<Version>,
}

impl ElementRecord {
    /// Returns whether this record is visible at `version`.
    pub fn is_visible_at(&self, version: Version) -> bool {
        self.created_in <= version && self.deleted_in.map_or(true, |deleted| deleted > version)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GraphState {
    pub(crate) version: Version,
    history: HashMap<ElementId, Vec<ElementRecord>>,
    live: HashMap<ElementId, Arc<RouteNetworkElement>>,
    incidence: HashMap<ElementId, BTreeSet<ElementId>>,
}

impl GraphState {
    pub(crate) fn live_element(&self, id: ElementId) -> Option<&Arc<RouteNetworkElement>> {
        self.live.get(&id)
    }

    pub(crate) fn incident_count(&self, node_id: ElementId) -> usize {
        self.incidence.get(&node_id).map_or(0, BTreeSet::len)
    }

    /// Inserts a new live element stamped with `version`.
    ///
    /// Callers must have checked uniqueness and endpoint presence.
    pub(crate) fn insert(&mut self, element: Arc<RouteNetworkElement>, version: Version) {
        let id = element.id();
        if let RouteNetworkElement::Segment(segment) = element.as_ref() {
            for node_id in segment.endpoints() {
                self.incidence.entry(node_id).or_default().insert(id);
            }
        }

        self.history.entry(id).or_default().push(ElementRecord {
            element: Arc::clone(&element),
            created_in: version,
            deleted_in: None,
        });
        self.live.insert(id, element);
    }

    /// Closes the live record of `id` at `version`.
    pub(crate) fn remove(
        &mut self,
        id: ElementId,
        version: Version,
    ) -> Option<Arc<RouteNetworkElement>> {
        let removed = self.live.remove(&id)?;

        if let RouteNetworkElement::Segment(segment) = removed.as_ref() {
            for node_id in segment.endpoints() {
                if let Some(segments) = self.incidence.get_mut(&node_id) {
                    segments.remove(&id);
                    if segments.is_empty() {
                        self.incidence.remove(&node_id);
                    }
                }
            }
        }

        if let Some(record) = self
            .history
            .get_mut(&id)
            .and_then(|chain| chain.iter_mut().rev().find(|record| record.deleted_in.is_none()))
        {
            record.deleted_in = Some(version);
        }

        Some(removed)
    }
}

/// Read handle on one committed version of the graph.
///
/// Cloning is cheap. A snapshot never changes after it is taken, even while
/// later transactions commit.
#[derive(Debug, Clone)]
pub struct Snapshot {
    state: Arc<GraphState>,
}

impl Snapshot {
    pub(crate) fn new(state: Arc<GraphState>) -> Self {
        Self { state }
    }

    pub fn version(&self) -> Version {
        self.state.version
    }

    pub fn get_element(&self, id: ElementId) -> Option<Arc<RouteNetworkElement>> {
        self.state.live_element(id).cloned()
    }

    pub fn get_node(&self, id: ElementId) -> Option<&RouteNode> {
        self.state
            .live_element(id)
            .and_then(|element| element.as_node())
    }

    pub fn get_segment(&self, id: ElementId) -> Option<&RouteSegment> {
        self.state
            .live_element(id)
            .and_then(|element| element.as_segment())
    }

    /// Looks up `id` as it was at `version`.
    ///
    /// Elements deleted after `version` are still returned; this is how
    /// marked-for-deletion state stays queryable.
    pub fn get_element_at(
        &self,
        id: ElementId,
        version: Version,
    ) -> Option<Arc<RouteNetworkElement>> {
        self.state
            .history
            .get(&id)?
            .iter()
            .rev()
            .find(|record| record.is_visible_at(version))
            .map(|record| Arc::clone(&record.element))
    }

    /// Returns the full version chain of `id`, oldest first.
    pub fn history(&self, id: ElementId) -> &[ElementRecord] {
        self.state.history.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Returns live segment ids touching `node_id`, in id order.
    pub fn incident_segments(&self, node_id: ElementId) -> Vec<ElementId> {
        self.state
            .incidence
            .get(&node_id)
            .map(|segments| segments.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.state
            .live
            .values()
            .filter(|element| element.as_node().is_some())
            .count()
    }

    pub fn segment_count(&self) -> usize {
        self.state
            .live
            .values()
            .filter(|element| element.as_segment().is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.state.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.live.is_empty()
    }

    /// Returns live elements ordered by id.
    pub fn elements(&self) -> Vec<Arc<RouteNetworkElement>> {
        let mut elements: Vec<_> = self.state.live.values().cloned().collect();
        elements.sort_by_key(|element| element.id());
        elements
    }
}
