//! Single-writer mutation scope over the graph store.
//!
//! # Responsibility
//! - Stage adds/deletes as a delta on top of the committed base version.
//! - Publish all staged changes atomically on commit.
//!
//! # Invariants
//! - At most one `Transaction` exists per store; it holds the writer lock.
//! - Staged changes are invisible to readers until `commit`.
//! - Dropping a transaction without `commit` discards every staged change.
//! - Staging cost depends on the delta only, never on the store size.

use crate::model::element::{ElementId, RouteNetworkElement, RouteSegment};
use crate::store::state::{GraphState, Version};
use crate::store::{AddOutcome, DeleteOutcome, DuplicatePolicy, GraphStore, StoreError, StoreResult};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};

/// One staged mutation, replayed in order at commit.
#[derive(Debug)]
enum StagedChange {
    Insert(Arc<RouteNetworkElement>),
    Remove(ElementId),
}

/// Open mutation scope returned by [`GraphStore::begin_transaction`].
pub struct Transaction<'store> {
    store: &'store GraphStore,
    writer: MutexGuard<'store, ()>,
    base: Arc<GraphState>,
    /// Ids touched in this transaction: `Some` is live, `None` is removed.
    overlay: HashMap<ElementId, Option<Arc<RouteNetworkElement>>>,
    /// Net change of incident segment counts per node id.
    incidence_delta: HashMap<ElementId, isize>,
    changes: Vec<StagedChange>,
}

impl<'store> Transaction<'store> {
    pub(crate) fn new(
        store: &'store GraphStore,
        writer: MutexGuard<'store, ()>,
        base: Arc<GraphState>,
    ) -> Self {
        Self {
            store,
            writer,
            base,
            overlay: HashMap::new(),
            incidence_delta: HashMap::new(),
            changes: Vec::new(),
        }
    }

    /// Version this transaction was opened against.
    pub fn base_version(&self) -> Version {
        self.base.version
    }

    /// Number of adds/deletes staged so far.
    pub fn staged_changes(&self) -> usize {
        self.changes.len()
    }

    fn live(&self, id: ElementId) -> Option<&Arc<RouteNetworkElement>> {
        match self.overlay.get(&id) {
            Some(staged) => staged.as_ref(),
            None => self.base.live_element(id),
        }
    }

    fn is_live_node(&self, id: ElementId) -> bool {
        matches!(
            self.live(id).map(|element| element.as_ref()),
            Some(RouteNetworkElement::Node(_))
        )
    }

    fn incident_count(&self, node_id: ElementId) -> usize {
        let base = self.base.incident_count(node_id) as isize;
        let delta = self.incidence_delta.get(&node_id).copied().unwrap_or(0);
        usize::try_from(base + delta).unwrap_or(0)
    }

    fn adjust_incidence(&mut self, segment: &RouteSegment, delta: isize) {
        let [from, to] = segment.endpoints();
        *self.incidence_delta.entry(from).or_default() += delta;
        if to != from {
            *self.incidence_delta.entry(to).or_default() += delta;
        }
    }

    /// Looks up a live element in this transaction's view.
    ///
    /// The view is the base version plus everything staged so far, so a
    /// segment can reference nodes added earlier in the same transaction.
    pub fn get_element(&self, id: ElementId) -> Option<Arc<RouteNetworkElement>> {
        self.live(id).cloned()
    }

    /// Stages insertion of a node or segment.
    ///
    /// # Errors
    /// - `DuplicateElement` when the id is live and `policy` is `Reject`.
    /// - `DanglingReference` when a segment endpoint is not a live node.
    pub fn add(
        &mut self,
        element: impl Into<RouteNetworkElement>,
        policy: DuplicatePolicy,
    ) -> StoreResult<AddOutcome> {
        let element = element.into();
        let id = element.id();

        if self.live(id).is_some() {
            return match policy {
                DuplicatePolicy::Ignore => {
                    debug!(
                        "event=element_add module=store status=skipped reason=duplicate kind={} id={}",
                        element.kind(),
                        id
                    );
                    Ok(AddOutcome::DuplicateIgnored)
                }
                DuplicatePolicy::Reject => Err(StoreError::DuplicateElement(id)),
            };
        }

        if let RouteNetworkElement::Segment(segment) = &element {
            if let Some(missing_node) = segment
                .endpoints()
                .into_iter()
                .find(|node_id| !self.is_live_node(*node_id))
            {
                warn!(
                    "event=element_add module=store status=rejected reason=dangling_reference segment_id={} missing_node_id={}",
                    id, missing_node
                );
                return Err(StoreError::DanglingReference {
                    segment: id,
                    missing_node,
                });
            }
            self.adjust_incidence(segment, 1);
        }

        let element = Arc::new(element);
        self.overlay.insert(id, Some(Arc::clone(&element)));
        self.changes.push(StagedChange::Insert(element));
        Ok(AddOutcome::Added)
    }

    /// Stages removal of `id`.
    ///
    /// Removing an id that is not live is a no-op for either policy; `Reject`
    /// only raises the log level of that no-op.
    pub fn delete(&mut self, id: ElementId, policy: DuplicatePolicy) -> DeleteOutcome {
        let Some(removed) = self.live(id).cloned() else {
            match policy {
                DuplicatePolicy::Ignore => debug!(
                    "event=element_delete module=store status=skipped reason=not_found id={id}"
                ),
                DuplicatePolicy::Reject => warn!(
                    "event=element_delete module=store status=skipped reason=not_found id={id}"
                ),
            }
            return DeleteOutcome::NotFound;
        };

        match removed.as_ref() {
            RouteNetworkElement::Segment(segment) => self.adjust_incidence(segment, -1),
            RouteNetworkElement::Node(_) => {
                let incident = self.incident_count(id);
                if incident > 0 {
                    warn!(
                        "event=element_delete module=store status=ok reason=node_still_referenced node_id={} incident_segments={}",
                        id, incident
                    );
                }
            }
        }

        self.overlay.insert(id, None);
        self.changes.push(StagedChange::Remove(id));
        DeleteOutcome::Deleted(removed.kind())
    }

    /// Publishes all staged changes as one new store version.
    ///
    /// A transaction with nothing staged still produces a new version.
    pub fn commit(self) -> Version {
        let Self {
            store,
            writer,
            base,
            changes,
            ..
        } = self;
        let version = base.version + 1;
        let staged = changes.len();
        // Release the base so an unshared current version is merged in place.
        drop(base);

        store.merge_commit(|state| {
            for change in changes {
                match change {
                    StagedChange::Insert(element) => state.insert(element, version),
                    StagedChange::Remove(id) => {
                        state.remove(id, version);
                    }
                }
            }
            state.version = version;
        });
        drop(writer);

        info!(
            "event=graph_commit module=store status=ok version={} changes={}",
            version, staged
        );
        version
    }
}
