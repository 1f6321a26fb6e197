// SPDX-License-Identifier: MIT

//! Per-shard `status_result`: the Leader's rendered roster, deposited here
//! so the shard's own owner can poll for it without cross-shard contention
//! (spec §4.7 sharded variant).

use crate::error::StoreError;
use rusqlite::{Connection, OptionalExtension};

pub fn publish_result(conn: &Connection, rendered: &str) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE status_result SET ready = 1, rendered = ?1 WHERE rowid = 1",
        [rendered],
    )?;
    Ok(())
}

/// Consume the rendered result if ready, clearing the flag so a later poll
/// doesn't see a stale render from a previous request.
pub fn take_result(conn: &Connection) -> Result<Option<String>, StoreError> {
    let row: Option<(i64, Option<String>)> = conn
        .query_row("SELECT ready, rendered FROM status_result WHERE rowid = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .optional()?;

    let Some((ready, rendered)) = row else { return Ok(None) };
    if ready == 0 {
        return Ok(None);
    }
    conn.execute("UPDATE status_result SET ready = 0, rendered = NULL WHERE rowid = 1", [])?;
    Ok(rendered)
}
