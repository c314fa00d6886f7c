//! Route network element model.
//!
//! # Responsibility
//! - Define the node/segment shapes owned by the graph store.
//! - Carry opaque attribute groups and geometry without interpreting them.
//!
//! # Invariants
//! - `id` is stable and never reused for another element.
//! - A segment references its endpoints by id only; it never owns a node.
//! - Stored segment direction is canonical, not a traversal constraint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier shared by nodes and segments.
pub type ElementId = Uuid;

/// Opaque geometry payload, usually GeoJSON coordinates.
///
/// The core never parses it; spatial validity is owned by upstream editors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(String);

impl Geometry {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attribute groups shared by every element kind.
///
/// Each group is kept as raw JSON so that schema changes upstream do not
/// require a core release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    #[serde(default)]
    pub naming_info: Option<Value>,
    #[serde(default)]
    pub mapping_info: Option<Value>,
    #[serde(default)]
    pub lifecycle_info: Option<Value>,
    #[serde(default)]
    pub safety_info: Option<Value>,
}

/// Point location in the route network (central office, hand hole, cabinet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub id: ElementId,
    pub geometry: Geometry,
    /// Node-specific attributes (kind, function).
    pub node_info: Option<Value>,
    #[serde(flatten)]
    pub info: ElementInfo,
}

impl RouteNode {
    pub fn new(id: ElementId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            node_info: None,
            info: ElementInfo::default(),
        }
    }
}

/// Route between two nodes (trench, conduit run, aerial span).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub id: ElementId,
    pub from_node_id: ElementId,
    pub to_node_id: ElementId,
    pub geometry: Geometry,
    /// Segment-specific attributes (kind, width, height).
    pub segment_info: Option<Value>,
    #[serde(flatten)]
    pub info: ElementInfo,
}

impl RouteSegment {
    pub fn new(
        id: ElementId,
        from_node_id: ElementId,
        to_node_id: ElementId,
        geometry: Geometry,
    ) -> Self {
        Self {
            id,
            from_node_id,
            to_node_id,
            geometry,
            segment_info: None,
            info: ElementInfo::default(),
        }
    }

    /// Returns whether `node_id` is one of the two stored endpoints.
    pub fn is_incident_to(&self, node_id: ElementId) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }

    /// Returns the endpoint across the segment from `node_id`.
    ///
    /// Returns `None` when `node_id` is not an endpoint. A self-loop returns
    /// the same node.
    pub fn opposite_end(&self, node_id: ElementId) -> Option<ElementId> {
        if self.from_node_id == node_id {
            Some(self.to_node_id)
        } else if self.to_node_id == node_id {
            Some(self.from_node_id)
        } else {
            None
        }
    }

    pub fn endpoints(&self) -> [ElementId; 2] {
        [self.from_node_id, self.to_node_id]
    }
}

/// Element kind discriminator, mostly for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Segment,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Segment => write!(f, "segment"),
        }
    }
}

/// Any element stored in the route network graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteNetworkElement {
    Node(RouteNode),
    Segment(RouteSegment),
}

impl RouteNetworkElement {
    pub fn id(&self) -> ElementId {
        match self {
            Self::Node(node) => node.id,
            Self::Segment(segment) => segment.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Segment(_) => ElementKind::Segment,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            Self::Node(node) => &node.geometry,
            Self::Segment(segment) => &segment.geometry,
        }
    }

    pub fn info(&self) -> &ElementInfo {
        match self {
            Self::Node(node) => &node.info,
            Self::Segment(segment) => &segment.info,
        }
    }

    pub fn as_node(&self) -> Option<&RouteNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Segment(_) => None,
        }
    }

    pub fn as_segment(&self) -> Option<&RouteSegment> {
        match self {
            Self::Segment(segment) => Some(segment),
            Self::Node(_) => None,
        }
    }
}

impl From<RouteNode> for RouteNetworkElement {
    fn from(value: RouteNode) -> Self {
        Self::Node(value)
    }
}

impl From<RouteSegment> for RouteNetworkElement {
    fn from(value: RouteSegment) -> Self {
        Self::Segment(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, RouteNetworkElement, RouteNode, RouteSegment};
    use uuid::Uuid;

    #[test]
    fn opposite_end_walks_both_directions() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let segment = RouteSegment::new(Uuid::new_v4(), a, b, Geometry::default());

        assert_eq!(segment.opposite_end(a), Some(b));
        assert_eq!(segment.opposite_end(b), Some(a));
        assert_eq!(segment.opposite_end(Uuid::new_v4()), None);
        assert!(segment.is_incident_to(a));
        assert!(segment.is_incident_to(b));
    }

    #[test]
    fn element_accessors_dispatch_on_variant() {
        let node = RouteNode::new(Uuid::new_v4(), Geometry::new("[1.0,2.0]"));
        let element = RouteNetworkElement::from(node.clone());

        assert_eq!(element.id(), node.id);
        assert_eq!(element.geometry().as_str(), "[1.0,2.0]");
        assert!(element.as_node().is_some());
        assert!(element.as_segment().is_none());
    }

    #[test]
    fn info_bundles_flatten_into_camel_case_fields() {
        let mut node = RouteNode::new(Uuid::new_v4(), Geometry::new("[0,0]"));
        node.info.naming_info = Some(serde_json::json!({ "name": "CO-1" }));

        let json = serde_json::to_value(RouteNetworkElement::Node(node)).unwrap();
        assert_eq!(json["kind"], "node");
        assert_eq!(json["namingInfo"]["name"], "CO-1");
        assert!(json["safetyInfo"].is_null());
    }
}
