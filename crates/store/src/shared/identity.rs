// SPDX-License-Identifier: MIT

//! Shared-realization claim algorithm, spec §4.2:
//!
//! Within a single transaction, walk candidates 001..999 in order; for each
//! candidate with an existing row, test whether it is stale (TTL-expired)
//! or orphaned (same hostname, dead pid); if so delete it and insert this
//! session's row. Primary-key uniqueness makes a concurrent double-claim
//! fail the transaction, so the caller retries with the next candidate.

use crate::error::StoreError;
use crate::store::ClaimRequest;
use abus_core::{AgentId, PidProbe};
use rusqlite::{Connection, OptionalExtension};

struct ExistingRow {
    hostname: String,
    pid: i64,
    last_seen: f64,
}

pub fn claim(conn: &mut Connection, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError> {
    for n in AgentId::MIN..=AgentId::MAX {
        let id = AgentId::from_number(n);
        let tx = conn.transaction()?;

        let existing: Option<ExistingRow> = tx
            .query_row(
                "SELECT hostname, pid, last_seen FROM peers WHERE id = ?1",
                [id.as_str()],
                |row| {
                    Ok(ExistingRow {
                        hostname: row.get(0)?,
                        pid: row.get(1)?,
                        last_seen: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let reclaimable = match &existing {
            None => true,
            Some(row) => is_reclaimable(row, req),
        };

        if !reclaimable {
            tx.rollback()?;
            continue;
        }

        tx.execute("DELETE FROM peers WHERE id = ?1", [id.as_str()])?;
        let inserted = tx.execute(
            "INSERT INTO peers (id, pid, hostname, last_seen, cwd, mode, mode_since,
                 recv_started, recv_deadline, recv_wait_seconds, active_last_touch)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, NULL, NULL, NULL, NULL)",
            rusqlite::params![id.as_str(), req.pid, req.hostname, req.now, req.cwd],
        );

        match inserted {
            Ok(_) => {
                tx.commit()?;
                return Ok(id);
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Lost the race to another session claiming the same id
                // concurrently; rollback and try the next candidate.
                tx.rollback()?;
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
    Err(StoreError::PoolExhausted)
}

fn is_reclaimable(row: &ExistingRow, req: &ClaimRequest<'_>) -> bool {
    let stale = req.now - row.last_seen > req.heartbeat_ttl_secs;
    let orphaned = row.hostname == req.hostname && req.pid_probe.check(row.pid as u32).is_dead();
    stale || orphaned
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
