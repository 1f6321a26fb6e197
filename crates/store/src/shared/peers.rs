// SPDX-License-Identifier: MIT

use super::rows::{mode_str, peer_from_row};
use crate::error::StoreError;
use abus_core::{AgentId, Mode, Peer};
use rusqlite::{Connection, OptionalExtension};

pub fn release_self(conn: &Connection, id: &AgentId) -> Result<(), StoreError> {
    conn.execute("DELETE FROM peers WHERE id = ?1", [id.as_str()])?;
    Ok(())
}

pub fn touch_heartbeat(
    conn: &Connection,
    id: &AgentId,
    now: f64,
    in_waiting_mode: bool,
) -> Result<(), StoreError> {
    if in_waiting_mode {
        conn.execute(
            "UPDATE peers SET last_seen = ?1, active_last_touch = ?1 WHERE id = ?2",
            rusqlite::params![now, id.as_str()],
        )?;
    } else {
        conn.execute(
            "UPDATE peers SET last_seen = ?1 WHERE id = ?2",
            rusqlite::params![now, id.as_str()],
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn set_recv_mode(
    conn: &Connection,
    id: &AgentId,
    mode: Option<Mode>,
    now: f64,
    recv_started: Option<f64>,
    recv_deadline: Option<f64>,
    recv_wait_seconds: Option<f64>,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE peers SET mode = ?1, mode_since = ?2, recv_started = ?3,
             recv_deadline = ?4, recv_wait_seconds = ?5
         WHERE id = ?6",
        rusqlite::params![
            mode_str(mode),
            now,
            recv_started,
            recv_deadline,
            recv_wait_seconds,
            id.as_str()
        ],
    )?;
    Ok(())
}

pub fn get_peer(conn: &Connection, id: &AgentId) -> Result<Option<Peer>, StoreError> {
    conn.query_row("SELECT * FROM peers WHERE id = ?1", [id.as_str()], peer_from_row)
        .optional()
        .map_err(StoreError::from)
}

pub fn list_peers(conn: &Connection) -> Result<Vec<Peer>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM peers ORDER BY id")?;
    let rows = stmt.query_map([], peer_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn delete_peer(conn: &Connection, id: &AgentId) -> Result<(), StoreError> {
    conn.execute("DELETE FROM peers WHERE id = ?1", [id.as_str()])?;
    Ok(())
}
