use conference_core::db::migrations::{apply_migrations, current_user_version, latest_version};
use conference_core::db::{open_db, open_db_in_memory, open_db_with_options, DbError, OpenOptions};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "profiles");
    assert_table_exists(&conn, "conferences");
    assert_table_exists(&conn, "conference_topics");
    assert_table_exists(&conn, "conference_id_sequences");
    assert_table_exists(&conn, "profile_registrations");
    assert_table_exists(&conn, "task_outbox");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conference.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "conferences");
}

#[test]
fn file_database_uses_wal_and_configured_busy_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.db");

    let conn = open_db_with_options(
        &path,
        OpenOptions {
            busy_timeout: Duration::from_millis(750),
        },
    )
    .unwrap();

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(busy_timeout, 750);
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO profile_registrations (user_id, position, conference_key)
             VALUES ('ghost', 0, 'key');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
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
fn failed_migration_names_the_step_and_keeps_the_file_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half.db");

    let mut conn = Connection::open(&path).unwrap();
    let report = apply_migrations(&mut conn).unwrap();
    assert_eq!(report.applied, vec![1, 2]);
    conn.execute_batch(
        "DROP TABLE task_outbox;
         CREATE TABLE task_outbox (id INTEGER);
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), 1);
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
