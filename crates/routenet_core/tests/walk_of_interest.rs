use routenet_core::{
    GraphStore, InMemoryProcessedEvents, RegisterWalkOfInterest, RouteNetworkEditOperationOccurred,
    RouteNetworkEventProjector, WalkError, WalkOfInterestService,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Small access network:
/// (CO_1) -S1-> (HH_1) -S2-> (HH_2) -S4-> (CC_1)
/// plus a detached span (SP_1) -S9-> (SP_2).
struct TestNetwork {
    store: Arc<GraphStore>,
    co_1: Uuid,
    hh_1: Uuid,
    hh_2: Uuid,
    cc_1: Uuid,
    sp_1: Uuid,
    s1: Uuid,
    s2: Uuid,
    s4: Uuid,
    s9: Uuid,
}

fn node_added(seq: u64, node_id: Uuid, x: f64) -> serde_json::Value {
    json!({
        "eventType": "RouteNodeAdded",
        "eventId": Uuid::new_v4(),
        "eventSequenceNumber": seq,
        "nodeId": node_id,
        "geometry": format!("[{x},6197297.0]"),
        "nodeInfo": null,
        "namingInfo": { "name": format!("node-{seq}") },
        "mappingInfo": null,
        "lifecycleInfo": null,
        "safetyInfo": null
    })
}

fn segment_added(seq: u64, segment_id: Uuid, from: Uuid, to: Uuid) -> serde_json::Value {
    json!({
        "eventType": "RouteSegmentAdded",
        "eventId": Uuid::new_v4(),
        "eventSequenceNumber": seq,
        "segmentId": segment_id,
        "fromNodeId": from,
        "toNodeId": to,
        "geometry": "[[0.0,0.0],[1.0,1.0]]",
        "segmentInfo": { "kind": "Underground" }
    })
}

fn build_network() -> TestNetwork {
    let store = Arc::new(GraphStore::new());
    let mut projector =
        RouteNetworkEventProjector::new(Arc::clone(&store), InMemoryProcessedEvents::new());

    let (co_1, hh_1, hh_2, cc_1, sp_1, sp_2) = (
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
    );
    let (s1, s2, s4, s9) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let message: RouteNetworkEditOperationOccurred = serde_json::from_value(json!({
        "commands": [
            { "events": [
                node_added(1, co_1, 0.0),
                node_added(2, hh_1, 1.0),
                segment_added(3, s1, co_1, hh_1)
            ] },
            { "events": [
                node_added(4, hh_2, 2.0),
                segment_added(5, s2, hh_1, hh_2),
                node_added(6, cc_1, 3.0),
                segment_added(7, s4, hh_2, cc_1)
            ] },
            { "events": [
                node_added(8, sp_1, 10.0),
                node_added(9, sp_2, 11.0),
                segment_added(10, s9, sp_1, sp_2)
            ] }
        ]
    }))
    .unwrap();

    let report = projector.apply(&message).unwrap();
    assert_eq!(report.applied, 10);
    assert_eq!(report.rejected, 0);

    TestNetwork {
        store,
        co_1,
        hh_1,
        hh_2,
        cc_1,
        sp_1,
        s1,
        s2,
        s4,
        s9,
    }
}

fn register(net: &TestNetwork, reference_list: Vec<Uuid>) -> Result<Vec<Uuid>, WalkError> {
    let service = WalkOfInterestService::new(Arc::clone(&net.store));
    let command = RegisterWalkOfInterest::new(Uuid::new_v4(), reference_list);
    service
        .register_walk_of_interest(&command)
        .map(|result| {
            assert_eq!(result.interest_id, command.interest_id);
            result.walk
        })
}

#[test]
fn walk_with_one_segment_expands_both_endpoints() {
    let net = build_network();

    let walk = register(&net, vec![net.s1]).unwrap();

    assert_eq!(walk, vec![net.co_1, net.s1, net.hh_1]);
}

#[test]
fn walk_with_three_chained_segments_alternates_nodes_and_segments() {
    let net = build_network();

    let walk = register(&net, vec![net.s1, net.s2, net.s4]).unwrap();

    assert_eq!(
        walk,
        vec![net.co_1, net.s1, net.hh_1, net.s2, net.hh_2, net.s4, net.cc_1]
    );
}

#[test]
fn walk_against_stored_direction_of_first_segment_is_disconnected() {
    let net = build_network();

    // S4 is stored HH_2 -> CC_1, so the walk stands on CC_1 when S2 arrives.
    let err = register(&net, vec![net.s4, net.s2, net.s1]).unwrap_err();

    assert_eq!(
        err,
        WalkError::DisconnectedWalk {
            segment: net.s2,
            cursor: net.cc_1,
        }
    );
}

#[test]
fn walk_may_traverse_later_segments_against_stored_direction() {
    let net = build_network();

    // S2 leaves HH_2 back towards HH_1, S1 then runs back to CO_1.
    let walk = register(&net, vec![net.s2, net.s2, net.s1]).unwrap();

    assert_eq!(
        walk,
        vec![net.hh_1, net.s2, net.hh_2, net.s2, net.hh_1, net.s1, net.co_1]
    );
}

#[test]
fn walk_with_gap_between_segments_is_disconnected() {
    let net = build_network();

    let err = register(&net, vec![net.s1, net.s4]).unwrap_err();

    assert_eq!(
        err,
        WalkError::DisconnectedWalk {
            segment: net.s4,
            cursor: net.hh_1,
        }
    );
}

#[test]
fn walk_into_detached_span_is_disconnected() {
    let net = build_network();

    let err = register(&net, vec![net.s2, net.s9]).unwrap_err();

    assert!(matches!(err, WalkError::DisconnectedWalk { segment, .. } if segment == net.s9));
}

#[test]
fn walk_starting_with_node_reference_is_invalid() {
    let net = build_network();

    let err = register(&net, vec![net.co_1, net.s1]).unwrap_err();

    assert_eq!(err, WalkError::InvalidReference(net.co_1));
}

#[test]
fn walk_ending_with_node_reference_is_invalid() {
    let net = build_network();

    let err = register(&net, vec![net.s9, net.sp_1]).unwrap_err();

    assert_eq!(err, WalkError::InvalidReference(net.sp_1));
}

#[test]
fn walk_without_segments_is_empty() {
    let net = build_network();

    assert_eq!(register(&net, Vec::new()).unwrap_err(), WalkError::EmptyWalk);
}

#[test]
fn retraced_segment_must_touch_current_end() {
    let net = build_network();

    // S1 ends at HH_1, not at HH_2 where the walk currently stands.
    let err = register(&net, vec![net.s1, net.s2, net.s1]).unwrap_err();
    assert_eq!(
        err,
        WalkError::DisconnectedWalk {
            segment: net.s1,
            cursor: net.hh_2,
        }
    );

    let walk = register(&net, vec![net.s1, net.s2, net.s2, net.s1]).unwrap();
    assert_eq!(
        walk,
        vec![
            net.co_1, net.s1, net.hh_1, net.s2, net.hh_2, net.s2, net.hh_1, net.s1, net.co_1
        ]
    );
}

#[test]
fn walk_through_removed_segment_is_invalid() {
    let net = build_network();
    let mut projector =
        RouteNetworkEventProjector::new(Arc::clone(&net.store), InMemoryProcessedEvents::new());
    let message: RouteNetworkEditOperationOccurred = serde_json::from_value(json!({
        "commands": [ { "events": [ {
            "eventType": "RouteSegmentRemoved",
            "eventId": Uuid::new_v4(),
            "eventSequenceNumber": 11,
            "segmentId": net.s2
        } ] } ]
    }))
    .unwrap();
    projector.apply(&message).unwrap();

    let err = register(&net, vec![net.s1, net.s2, net.s4]).unwrap_err();

    assert_eq!(err, WalkError::InvalidReference(net.s2));
}
