//! Ordered schema upgrades for the routine store.
//!
//! # Invariants
//! - Steps are listed by strictly increasing `version`, starting at 1.
//! - `PRAGMA user_version` equals the version of the last applied step.
//! - Pending steps run in one transaction: all of them land or none does.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// One schema upgrade step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    /// File stem of the SQL script, used in logs and errors.
    pub name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "0001_init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "0002_task_duration",
        sql: include_str!("0002_task_duration.sql"),
    },
];

/// Schema version a fully upgraded store carries.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |step| step.version)
}

/// Steps a store at `store_version` still needs, oldest first.
pub fn pending(store_version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |step| step.version > store_version)
}

/// Upgrades the store to [`latest_version`] and returns the names of the
/// steps applied (empty when already current).
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] for a store from a newer build.
/// - [`DbError::MigrationFailed`] naming the first step that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<&'static str>> {
    let store_version = current_user_version(conn)?;
    let binary_version = latest_version();
    if store_version > binary_version {
        return Err(DbError::UnsupportedSchemaVersion {
            store_version,
            binary_version,
        });
    }

    let steps = pending(store_version).collect::<Vec<_>>();
    if steps.is_empty() {
        return Ok(Vec::new());
    }

    let started_at = Instant::now();
    let tx = conn.transaction()?;
    for step in &steps {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| {
                error!(
                    "event=db_migrate module=db status=error version={} name={} error={}",
                    step.version, step.name, source
                );
                DbError::MigrationFailed {
                    version: step.version,
                    name: step.name,
                    source,
                }
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={} duration_ms={}",
        store_version,
        binary_version,
        steps.len(),
        started_at.elapsed().as_millis()
    );
    Ok(steps.iter().map(|step| step.name).collect())
}

/// Reads the schema version stored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
