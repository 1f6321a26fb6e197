// SPDX-License-Identifier: MIT

//! Per-shard `self_state` row: this agent's presence, recv mode, and status
//! request flag (spec §4.2, §4.6, §4.7 sharded variant).

use super::rows::{mode_str, self_state_to_peer};
use crate::error::StoreError;
use abus_core::{AgentId, Mode, Peer};
use rusqlite::{Connection, OptionalExtension};

pub fn get_self_state(conn: &Connection, id: &AgentId) -> Result<Option<Peer>, StoreError> {
    conn.query_row("SELECT * FROM self_state WHERE rowid = 1", [], |row| self_state_to_peer(id, row))
        .optional()
        .map_err(StoreError::from)
}

pub fn touch_heartbeat(conn: &Connection, now: f64, in_waiting_mode: bool) -> Result<(), StoreError> {
    if in_waiting_mode {
        conn.execute(
            "UPDATE self_state SET last_heartbeat = ?1, active_last_touch = ?1 WHERE rowid = 1",
            [now],
        )?;
    } else {
        conn.execute("UPDATE self_state SET last_heartbeat = ?1 WHERE rowid = 1", [now])?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn set_recv_mode(
    conn: &Connection,
    mode: Option<Mode>,
    now: f64,
    recv_started: Option<f64>,
    recv_deadline: Option<f64>,
    recv_wait_seconds: Option<f64>,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE self_state SET mode = ?1, mode_since = ?2, recv_started = ?3,
             recv_deadline = ?4, recv_wait_seconds = ?5
         WHERE rowid = 1",
        rusqlite::params![mode_str(mode), now, recv_started, recv_deadline, recv_wait_seconds],
    )?;
    Ok(())
}

pub fn request_status(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("UPDATE self_state SET status_request = 1 WHERE rowid = 1", [])?;
    Ok(())
}

pub fn take_pending_status_request(conn: &Connection) -> Result<bool, StoreError> {
    let pending: i64 = conn.query_row("SELECT status_request FROM self_state WHERE rowid = 1", [], |r| r.get(0))?;
    if pending != 0 {
        conn.execute("UPDATE self_state SET status_request = 0 WHERE rowid = 1", [])?;
    }
    Ok(pending != 0)
}
