use routenet_core::{
    DeleteOutcome, DuplicatePolicy, ElementKind, Geometry, GraphStore, RouteNode, RouteSegment,
    StoreError,
};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

fn node(x: i32) -> RouteNode {
    RouteNode::new(Uuid::new_v4(), Geometry::new(format!("[{x},0]")))
}

#[test]
fn snapshot_is_stable_across_later_commits() {
    let store = GraphStore::new();
    let a = node(0);
    let b = node(1);

    let mut tx = store.begin_transaction().unwrap();
    tx.add(a.clone(), DuplicatePolicy::Reject).unwrap();
    tx.commit();
    let old = store.snapshot();

    let mut tx = store.begin_transaction().unwrap();
    tx.add(b.clone(), DuplicatePolicy::Reject).unwrap();
    tx.delete(a.id, DuplicatePolicy::Reject);
    tx.commit();

    assert_eq!(old.version(), 1);
    assert!(old.get_node(a.id).is_some());
    assert!(old.get_node(b.id).is_none());

    let new = store.snapshot();
    assert_eq!(new.version(), 2);
    assert!(new.get_node(a.id).is_none());
    assert!(new.get_node(b.id).is_some());
}

#[test]
fn deleted_element_stays_visible_at_earlier_versions() {
    let store = GraphStore::new();
    let a = node(0);

    let mut tx = store.begin_transaction().unwrap();
    tx.add(a.clone(), DuplicatePolicy::Reject).unwrap();
    let added_in = tx.commit();

    let mut tx = store.begin_transaction().unwrap();
    assert_eq!(
        tx.delete(a.id, DuplicatePolicy::Reject),
        DeleteOutcome::Deleted(ElementKind::Node)
    );
    let deleted_in = tx.commit();

    let snapshot = store.snapshot();
    assert!(snapshot.get_element(a.id).is_none());
    assert!(snapshot.get_element_at(a.id, 0).is_none());
    assert_eq!(
        snapshot.get_element_at(a.id, added_in).unwrap().id(),
        a.id
    );
    assert!(snapshot.get_element_at(a.id, deleted_in).is_none());

    let history = snapshot.history(a.id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].created_in, added_in);
    assert_eq!(history[0].deleted_in, Some(deleted_in));
}

#[test]
fn id_can_be_reused_after_delete_with_new_record() {
    let store = GraphStore::new();
    let a = node(0);
    let mut moved = a.clone();
    moved.geometry = Geometry::new("[5,5]");

    let mut tx = store.begin_transaction().unwrap();
    tx.add(a.clone(), DuplicatePolicy::Reject).unwrap();
    let first = tx.commit();

    let mut tx = store.begin_transaction().unwrap();
    tx.delete(a.id, DuplicatePolicy::Reject);
    tx.add(moved.clone(), DuplicatePolicy::Reject).unwrap();
    let second = tx.commit();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.history(a.id).len(), 2);
    assert_eq!(
        snapshot.get_element_at(a.id, first).unwrap().geometry().as_str(),
        "[0,0]"
    );
    assert_eq!(
        snapshot.get_element_at(a.id, second).unwrap().geometry().as_str(),
        "[5,5]"
    );
}

#[test]
fn deleting_node_with_segments_keeps_incidence() {
    let store = GraphStore::new();
    let a = node(0);
    let b = node(1);
    let s = RouteSegment::new(Uuid::new_v4(), a.id, b.id, Geometry::default());

    let mut tx = store.begin_transaction().unwrap();
    tx.add(a.clone(), DuplicatePolicy::Reject).unwrap();
    tx.add(b.clone(), DuplicatePolicy::Reject).unwrap();
    tx.add(s.clone(), DuplicatePolicy::Reject).unwrap();
    tx.delete(b.id, DuplicatePolicy::Reject);
    tx.commit();

    let snapshot = store.snapshot();
    assert!(snapshot.get_segment(s.id).is_some());
    assert_eq!(snapshot.incident_segments(a.id), vec![s.id]);
    assert_eq!(snapshot.incident_segments(b.id), vec![s.id]);

    // A segment may not be added to the deleted endpoint.
    let late = RouteSegment::new(Uuid::new_v4(), a.id, b.id, Geometry::default());
    let mut tx = store.begin_transaction().unwrap();
    assert_eq!(
        tx.add(late.clone(), DuplicatePolicy::Reject),
        Err(StoreError::DanglingReference {
            segment: late.id,
            missing_node: b.id,
        })
    );
}

#[test]
fn readers_never_observe_partial_batch() {
    const BATCH: usize = 50;

    let store = Arc::new(GraphStore::new());
    let nodes: Vec<RouteNode> = (0..BATCH as i32).map(node).collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = store.snapshot();
                    let len = snapshot.len();
                    assert!(len == 0 || len == BATCH, "observed {len} elements");
                    assert_eq!(snapshot.version() == 0, len == 0);
                }
            })
        })
        .collect();

    let mut tx = store.begin_transaction().unwrap();
    for n in &nodes {
        tx.add(n.clone(), DuplicatePolicy::Reject).unwrap();
    }
    tx.commit();

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.snapshot().node_count(), BATCH);
}

#[test]
fn writer_scope_is_released_on_rollback() {
    let store = GraphStore::new();

    {
        let mut tx = store.begin_transaction().unwrap();
        tx.add(node(0), DuplicatePolicy::Reject).unwrap();
        assert!(matches!(
            store.begin_transaction(),
            Err(StoreError::TransactionInProgress)
        ));
    }

    let tx = store.begin_transaction().unwrap();
    assert_eq!(tx.base_version(), 0);
    assert_eq!(tx.staged_changes(), 0);
}
