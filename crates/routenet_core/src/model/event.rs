//! Route network domain events and the edit-operation envelope.
//!
//! # Responsibility
//! - Describe the event shapes consumed by the projector.
//! - Keep the wire shape (camelCase JSON, `eventType` tag) in one place.
//!
//! # Invariants
//! - `event_id` is globally unique and is the deduplication key.
//! - `event_sequence_number` is advisory and only used for diagnostics.
//! - Unrecognized `eventType` tags decode to `RouteNetworkEvent::Unknown`.

use crate::model::element::{ElementId, ElementInfo, Geometry, RouteNode, RouteSegment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier of one domain event.
pub type EventId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNodeAdded {
    pub event_id: EventId,
    pub event_sequence_number: u64,
    pub node_id: ElementId,
    pub geometry: Geometry,
    #[serde(default)]
    pub node_info: Option<Value>,
    #[serde(flatten)]
    pub info: ElementInfo,
}

impl RouteNodeAdded {
    pub fn to_node(&self) -> RouteNode {
        RouteNode {
            id: self.node_id,
            geometry: self.geometry.clone(),
            node_info: self.node_info.clone(),
            info: self.info.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNodeMarkedForDeletion {
    pub event_id: EventId,
    pub event_sequence_number: u64,
    pub node_id: ElementId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegmentAdded {
    pub event_id: EventId,
    pub event_sequence_number: u64,
    pub segment_id: ElementId,
    pub from_node_id: ElementId,
    pub to_node_id: ElementId,
    pub geometry: Geometry,
    #[serde(default)]
    pub segment_info: Option<Value>,
    #[serde(flatten)]
    pub info: ElementInfo,
}

impl RouteSegmentAdded {
    pub fn to_segment(&self) -> RouteSegment {
        RouteSegment {
            id: self.segment_id,
            from_node_id: self.from_node_id,
            to_node_id: self.to_node_id,
            geometry: self.geometry.clone(),
            segment_info: self.segment_info.clone(),
            info: self.info.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegmentMarkedForDeletion {
    pub event_id: EventId,
    pub event_sequence_number: u64,
    pub segment_id: ElementId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegmentRemoved {
    pub event_id: EventId,
    pub event_sequence_number: u64,
    pub segment_id: ElementId,
}

/// Closed set of route network events understood by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum RouteNetworkEvent {
    RouteNodeAdded(RouteNodeAdded),
    RouteNodeMarkedForDeletion(RouteNodeMarkedForDeletion),
    RouteSegmentAdded(RouteSegmentAdded),
    RouteSegmentMarkedForDeletion(RouteSegmentMarkedForDeletion),
    RouteSegmentRemoved(RouteSegmentRemoved),
    /// Any event kind introduced upstream after this build.
    #[serde(other)]
    Unknown,
}

impl RouteNetworkEvent {
    /// Builds a `RouteNodeAdded` event with a fresh event id.
    pub fn node_added(event_sequence_number: u64, node: &RouteNode) -> Self {
        Self::RouteNodeAdded(RouteNodeAdded {
            event_id: Uuid::new_v4(),
            event_sequence_number,
            node_id: node.id,
            geometry: node.geometry.clone(),
            node_info: node.node_info.clone(),
            info: node.info.clone(),
        })
    }

    /// Builds a `RouteSegmentAdded` event with a fresh event id.
    pub fn segment_added(event_sequence_number: u64, segment: &RouteSegment) -> Self {
        Self::RouteSegmentAdded(RouteSegmentAdded {
            event_id: Uuid::new_v4(),
            event_sequence_number,
            segment_id: segment.id,
            from_node_id: segment.from_node_id,
            to_node_id: segment.to_node_id,
            geometry: segment.geometry.clone(),
            segment_info: segment.segment_info.clone(),
            info: segment.info.clone(),
        })
    }

    pub fn node_marked_for_deletion(event_sequence_number: u64, node_id: ElementId) -> Self {
        Self::RouteNodeMarkedForDeletion(RouteNodeMarkedForDeletion {
            event_id: Uuid::new_v4(),
            event_sequence_number,
            node_id,
        })
    }

    pub fn segment_marked_for_deletion(event_sequence_number: u64, segment_id: ElementId) -> Self {
        Self::RouteSegmentMarkedForDeletion(RouteSegmentMarkedForDeletion {
            event_id: Uuid::new_v4(),
            event_sequence_number,
            segment_id,
        })
    }

    pub fn segment_removed(event_sequence_number: u64, segment_id: ElementId) -> Self {
        Self::RouteSegmentRemoved(RouteSegmentRemoved {
            event_id: Uuid::new_v4(),
            event_sequence_number,
            segment_id,
        })
    }

    /// Returns the deduplication key, or `None` for unknown kinds.
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::RouteNodeAdded(event) => Some(event.event_id),
            Self::RouteNodeMarkedForDeletion(event) => Some(event.event_id),
            Self::RouteSegmentAdded(event) => Some(event.event_id),
            Self::RouteSegmentMarkedForDeletion(event) => Some(event.event_id),
            Self::RouteSegmentRemoved(event) => Some(event.event_id),
            Self::Unknown => None,
        }
    }

    pub fn sequence_number(&self) -> Option<u64> {
        match self {
            Self::RouteNodeAdded(event) => Some(event.event_sequence_number),
            Self::RouteNodeMarkedForDeletion(event) => Some(event.event_sequence_number),
            Self::RouteSegmentAdded(event) => Some(event.event_sequence_number),
            Self::RouteSegmentMarkedForDeletion(event) => Some(event.event_sequence_number),
            Self::RouteSegmentRemoved(event) => Some(event.event_sequence_number),
            Self::Unknown => None,
        }
    }

    /// Wire tag of this event, matching the `eventType` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RouteNodeAdded(_) => "RouteNodeAdded",
            Self::RouteNodeMarkedForDeletion(_) => "RouteNodeMarkedForDeletion",
            Self::RouteSegmentAdded(_) => "RouteSegmentAdded",
            Self::RouteSegmentMarkedForDeletion(_) => "RouteSegmentMarkedForDeletion",
            Self::RouteSegmentRemoved(_) => "RouteSegmentRemoved",
            Self::Unknown => "Unknown",
        }
    }
}

/// One editing command and the events it produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNetworkCommand {
    #[serde(default)]
    pub cmd_id: Option<Uuid>,
    #[serde(default)]
    pub cmd_type: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<RouteNetworkEvent>>,
}

/// Batch message delivered by the route network event log.
///
/// `commands` and each command's `events` may be `null` on the wire; both
/// are treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNetworkEditOperationOccurred {
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub commands: Option<Vec<RouteNetworkCommand>>,
}

impl RouteNetworkEditOperationOccurred {
    /// Wraps `events` into a message holding one command.
    pub fn single_command(events: Vec<RouteNetworkEvent>) -> Self {
        Self {
            event_id: Some(Uuid::new_v4()),
            commands: Some(vec![RouteNetworkCommand {
                cmd_id: Some(Uuid::new_v4()),
                cmd_type: None,
                events: Some(events),
            }]),
        }
    }

    /// Iterates all events in delivery order across commands.
    pub fn events(&self) -> impl Iterator<Item = &RouteNetworkEvent> {
        self.commands
            .iter()
            .flatten()
            .filter_map(|command| command.events.as_ref())
            .flatten()
    }

    pub fn command_count(&self) -> usize {
        self.commands.as_ref().map_or(0, Vec::len)
    }
}
