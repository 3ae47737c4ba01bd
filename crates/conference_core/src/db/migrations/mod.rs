//! Schema migrations for the conference store.
//!
//! Pending migrations run in one transaction: either every pending step
//! lands, and `PRAGMA user_version` reaches the newest step, or the file is
//! left at the version it started from.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "task_outbox",
        sql: include_str!("0002_task_outbox.sql"),
    },
];

/// What one `apply_migrations` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Versions applied by this call, ascending.
    pub applied: Vec<u32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Newest schema version this build understands.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// Fails with `UnsupportedSchemaVersion` when the file was written by a newer
/// build, and with `Migration` naming the step that broke.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        error!(
            "event=db_migrate module=db status=error from_version={} latest_supported={} error_code=schema_too_new",
            from_version, latest
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            applied: Vec::new(),
        });
    }

    let started_at = Instant::now();
    let tx = conn.transaction()?;
    let mut applied = Vec::with_capacity(pending.len());
    for migration in pending {
        let step_started_at = Instant::now();
        let step = tx
            .execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version));
        if let Err(source) = step {
            error!(
                "event=db_migrate module=db status=error version={} name={} duration_ms={} error={}",
                migration.version,
                migration.name,
                step_started_at.elapsed().as_millis(),
                source
            );
            return Err(DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            });
        }
        info!(
            "event=db_migrate module=db status=ok version={} name={} duration_ms={}",
            migration.version,
            migration.name,
            step_started_at.elapsed().as_millis()
        );
        applied.push(migration.version);
    }
    tx.commit()?;

    let to_version = applied.last().copied().unwrap_or(from_version);
    info!(
        "event=db_migrate module=db status=done from_version={} to_version={} applied={} duration_ms={}",
        from_version,
        to_version,
        applied.len(),
        started_at.elapsed().as_millis()
    );
    Ok(MigrationReport {
        from_version,
        to_version,
        applied,
    })
}

/// Schema version recorded in the database file.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
