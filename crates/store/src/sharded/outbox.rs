// SPDX-License-Identifier: MIT

//! Per-shard `outbox`: messages this agent sent, staged for the Reconciler
//! to move into the recipient's `inbox` (spec §4.4, §4.5 sharded variant).
//! Recipient fan-out already happened before this is called — `to` here is
//! always one concrete id.

use super::rows::message_from_row;
use crate::error::StoreError;
use abus_core::time_fmt::format_ts_hms;
use abus_core::{new_msg_id, AgentId, Message, MsgId};
use rusqlite::Connection;

pub fn publish(conn: &Connection, from: &AgentId, to: &AgentId, content: &str, now: f64) -> Result<MsgId, StoreError> {
    let msg_id = new_msg_id();
    conn.execute(
        "INSERT INTO outbox (msg_id, ts, ts_str, from_id, to_id, content, attempt) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        rusqlite::params![msg_id.as_str(), now, format_ts_hms(now), from.as_str(), to.as_str(), content],
    )?;
    Ok(msg_id)
}

/// Snapshot-read up to `batch_size` rows, oldest first, for the Reconciler.
pub fn take_batch(conn: &Connection, batch_size: usize) -> Result<Vec<Message>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM outbox ORDER BY ts LIMIT ?1")?;
    let rows = stmt.query_map([batch_size as i64], message_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn delete_delivered(conn: &Connection, msg_ids: &[MsgId]) -> Result<(), StoreError> {
    for id in msg_ids {
        conn.execute("DELETE FROM outbox WHERE msg_id = ?1", [id.as_str()])?;
    }
    Ok(())
}

pub fn truncate_old(conn: &Connection, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError> {
    let cutoff = now - msg_ttl_secs;
    Ok(conn.execute("DELETE FROM outbox WHERE ts < ?1", [cutoff])?)
}

pub fn count_present(conn: &Connection, msg_ids: &[MsgId]) -> Result<usize, StoreError> {
    let mut n = 0;
    for id in msg_ids {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM outbox WHERE msg_id = ?1)",
            [id.as_str()],
            |r| r.get(0),
        )?;
        if exists {
            n += 1;
        }
    }
    Ok(n)
}
