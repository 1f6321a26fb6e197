// SPDX-License-Identifier: MIT

//! Per-shard connection handling, including the §4.1 corrupt-shard policy:
//! "on a corrupt shard file, delete and recreate it with an empty schema."

use crate::conn;
use crate::error::StoreError;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub fn open_existing(path: &Path, busy_timeout: Duration) -> Result<Connection, StoreError> {
    match try_open(path, busy_timeout) {
        Ok(conn) => Ok(conn),
        Err(e) if is_corruption(&e) => {
            tracing::warn!(path = %path.display(), error = %e, "shard file corrupt, recreating");
            let _ = std::fs::remove_file(path);
            try_open(path, busy_timeout)
        }
        Err(e) => Err(e),
    }
}

fn try_open(path: &Path, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = conn::open(path, busy_timeout)?;
    super::schema::ensure(&conn)?;
    Ok(conn)
}

fn is_corruption(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::DatabaseCorrupt
                || e.code == rusqlite::ErrorCode::NotADatabase
    )
}
