//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration is a SQL batch that
//! transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Local wall-clock time in milliseconds, for migration bookkeeping only.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Single-row settings record
        CREATE TABLE settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            administrator BLOB NOT NULL,        -- 32 bytes, never updated
            max_post_length INTEGER NOT NULL
        );

        -- Author ledgers: idx is the post id
        CREATE TABLE posts (
            author BLOB NOT NULL,               -- 32 bytes
            idx INTEGER NOT NULL,
            body TEXT NOT NULL,
            created_at INTEGER NOT NULL,        -- host time (Unix ms)
            like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
            PRIMARY KEY (author, idx)
        );

        -- Hash-chained notification log
        CREATE TABLE events (
            seq INTEGER PRIMARY KEY,            -- starts at 1
            recorded_at INTEGER NOT NULL,
            kind INTEGER NOT NULL,              -- NotificationKind as u8
            author BLOB NOT NULL,
            idx INTEGER NOT NULL,
            notification BLOB NOT NULL,         -- canonical CBOR
            prev_digest BLOB NOT NULL,          -- 32 bytes
            digest BLOB NOT NULL                -- 32 bytes
        );

        CREATE INDEX idx_events_author ON events(author, idx);
        "#,
    )?;

    Ok(())
}
