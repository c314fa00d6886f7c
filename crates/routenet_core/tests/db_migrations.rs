use routenet_core::db::migrations::latest_version;
use routenet_core::db::{open_db, open_db_in_memory, DbError};
use routenet_core::{
    Geometry, ProcessedEventLog, RouteNetworkEvent, RouteNode, SqliteEventJournal,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "processed_events");
}

#[test]
fn opening_same_journal_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "processed_events");
}

#[test]
fn opening_journal_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn processed_events_has_journal_columns_and_sequence_index() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT name, pk, \"notnull\" FROM pragma_table_info('processed_events') ORDER BY cid;")
        .unwrap();
    let columns: Vec<(String, i64, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let names: Vec<&str> = columns.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(
        names,
        ["event_id", "sequence_number", "event_type", "payload", "recorded_at"]
    );
    assert!(columns.iter().all(|(_, _, not_null)| *not_null == 1));
    assert_eq!(
        columns.iter().filter(|(_, pk, _)| *pk == 1).count(),
        1,
        "event_id must be the only key column"
    );
    assert_eq!(columns[0].1, 1);

    let index_exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type = 'index' AND name = 'idx_processed_events_sequence'
            );",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index_exists, 1);
}

#[test]
fn duplicate_event_id_is_refused_by_schema() {
    let conn = open_db_in_memory().unwrap();
    let event_id = Uuid::new_v4().to_string();
    let insert = "INSERT INTO processed_events (event_id, sequence_number, event_type, payload)
                  VALUES (?1, 1, 'RouteNodeAdded', '{}');";

    conn.execute(insert, [&event_id]).unwrap();
    assert!(conn.execute(insert, [&event_id]).is_err());

    let recorded_at: i64 = conn
        .query_row(
            "SELECT recorded_at FROM processed_events WHERE event_id = ?1;",
            [&event_id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(recorded_at > 0);
}

#[test]
fn unversioned_file_is_upgraded_without_losing_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE operator_notes (body TEXT NOT NULL);
         INSERT INTO operator_notes (body) VALUES ('pre-existing');",
    )
    .unwrap();
    assert_eq!(schema_version(&conn), 0);
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let kept: String = conn
        .query_row("SELECT body FROM operator_notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kept, "pre-existing");

    let mut journal = SqliteEventJournal::from_connection(conn).unwrap();
    assert!(journal.is_empty());
    let event = RouteNetworkEvent::node_added(
        42,
        &RouteNode::new(Uuid::new_v4(), Geometry::new("[0,0]")),
    );
    journal.record(std::slice::from_ref(&event)).unwrap();
    drop(journal);

    let conn = open_db(&path).unwrap();
    let (sequence_number, event_type): (i64, String) = conn
        .query_row(
            "SELECT sequence_number, event_type FROM processed_events;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(sequence_number, 42);
    assert_eq!(event_type, "RouteNodeAdded");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
