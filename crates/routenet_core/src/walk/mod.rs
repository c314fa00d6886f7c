//! Walk-of-interest construction and validation.
//!
//! # Responsibility
//! - Expand an ordered segment reference list into an alternating
//!   node/segment/.../node walk.
//! - Reject reference lists that do not describe a connected route.
//!
//! # Invariants
//! - A returned walk starts and ends with a node and has `2 * segments + 1`
//!   entries.
//! - Every segment in a returned walk is incident to both neighbouring nodes.
//! - Partial walks are never returned.

use crate::model::element::{ElementId, RouteNetworkElement, RouteSegment};
use crate::store::Snapshot;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reasons a reference list cannot become a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// Id is unknown, or names a node. Nodes are inferred, never supplied.
    InvalidReference(ElementId),
    /// `segment` does not touch the node the walk currently ends on.
    DisconnectedWalk {
        segment: ElementId,
        cursor: ElementId,
    },
    /// No segment ids were supplied.
    EmptyWalk,
}

impl Display for WalkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference(id) => {
                write!(f, "walk reference {id} is not a known route segment")
            }
            Self::DisconnectedWalk { segment, cursor } => write!(
                f,
                "route segment {segment} is not connected to route node {cursor}"
            ),
            Self::EmptyWalk => write!(f, "walk must reference at least one route segment"),
        }
    }
}

impl Error for WalkError {}

/// Fully expanded, validated walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWalk {
    ids: Vec<ElementId>,
}

impl ValidatedWalk {
    pub fn as_slice(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<ElementId> {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false`; a validated walk holds at least one segment.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Node ids in walk order (even positions).
    pub fn nodes(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().step_by(2).copied()
    }

    /// Segment ids in walk order (odd positions).
    pub fn segments(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().skip(1).step_by(2).copied()
    }

    pub fn first_node(&self) -> Option<ElementId> {
        self.ids.first().copied()
    }

    pub fn last_node(&self) -> Option<ElementId> {
        self.ids.last().copied()
    }
}

/// Builds a walk from `reference_list` against one committed snapshot.
///
/// The first segment is always walked in its stored direction, so the walk
/// starts at its `from` node. Each later segment must touch the current end
/// node and contributes its opposite endpoint.
///
/// # Errors
/// - `EmptyWalk` for an empty list.
/// - `InvalidReference` for unknown ids and node ids.
/// - `DisconnectedWalk` at the first segment that does not touch the
///   current end node.
pub fn build_walk(
    snapshot: &Snapshot,
    reference_list: &[ElementId],
) -> Result<ValidatedWalk, WalkError> {
    if reference_list.is_empty() {
        return Err(WalkError::EmptyWalk);
    }

    let segments = reference_list
        .iter()
        .map(|id| resolve_segment(snapshot, *id))
        .collect::<Result<Vec<_>, _>>()?;

    let first = &segments[0];
    let mut cursor = first.to_node_id;
    let mut ids = Vec::with_capacity(segments.len() * 2 + 1);
    ids.extend([first.from_node_id, first.id, cursor]);

    for segment in &segments[1..] {
        let next = segment
            .opposite_end(cursor)
            .ok_or(WalkError::DisconnectedWalk {
                segment: segment.id,
                cursor,
            })?;
        ids.push(segment.id);
        ids.push(next);
        cursor = next;
    }

    Ok(ValidatedWalk { ids })
}

fn resolve_segment(snapshot: &Snapshot, id: ElementId) -> Result<RouteSegment, WalkError> {
    match snapshot.get_element(id).as_deref() {
        Some(RouteNetworkElement::Segment(segment)) => Ok(segment.clone()),
        Some(RouteNetworkElement::Node(_)) | None => Err(WalkError::InvalidReference(id)),
    }
}
