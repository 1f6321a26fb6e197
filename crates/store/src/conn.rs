// SPDX-License-Identifier: MIT

//! Connection setup shared by both realizations: WAL journaling, NORMAL
//! durability, and a bounded busy timeout, per spec §4.1.

use crate::error::StoreError;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub fn open(path: &Path, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(StoreError::from)?;
    configure(&conn, busy_timeout)?;
    Ok(conn)
}

pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<(), StoreError> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Force a WAL checkpoint and an opportunistic optimize pass. Called from
/// the Heartbeat/Janitor's store-maintenance tick (spec §4.4, every 30
/// ticks).
pub fn checkpoint_and_optimize(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "wal_checkpoint", "PASSIVE")?;
    conn.execute_batch("PRAGMA optimize;")?;
    Ok(())
}
