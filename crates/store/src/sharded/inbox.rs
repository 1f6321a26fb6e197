// SPDX-License-Identifier: MIT

//! Per-shard `inbox`: messages delivered to this agent by the Reconciler,
//! drained atomically on receive (spec §4.6 sharded variant — no lease
//! needed since only this shard's owner ever reads its own inbox).

use super::rows::message_from_row;
use crate::error::StoreError;
use abus_core::{AgentId, Message};
use rusqlite::Connection;

pub fn insert(
    conn: &Connection,
    msg_id: &str,
    ts: f64,
    ts_str: &str,
    from: &AgentId,
    to: &AgentId,
    content: &str,
    attempt: u32,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO inbox (msg_id, ts, ts_str, from_id, to_id, content, attempt) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![msg_id, ts, ts_str, from.as_str(), to.as_str(), content, attempt],
    )?;
    Ok(())
}

/// Drain up to `max_batch_chars` worth of queued content, oldest first,
/// deleting each row as it's selected — this *is* the ack, there is no
/// separate lease-release step in this realization.
pub fn drain(conn: &mut Connection, max_batch_chars: usize) -> Result<Vec<Message>, StoreError> {
    let tx = conn.transaction()?;

    let candidates: Vec<Message> = {
        let mut stmt = tx.prepare("SELECT * FROM inbox ORDER BY ts")?;
        let rows = stmt.query_map([], message_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        out
    };

    let mut selected = Vec::new();
    let mut total_chars = 0usize;
    for msg in candidates {
        if !selected.is_empty() && total_chars + msg.content.chars().count() > max_batch_chars {
            break;
        }
        total_chars += msg.content.chars().count();
        selected.push(msg);
    }

    for msg in &selected {
        tx.execute("DELETE FROM inbox WHERE msg_id = ?1", [msg.msg_id.as_str()])?;
    }

    tx.commit()?;
    Ok(selected)
}

pub fn truncate_old(conn: &Connection, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError> {
    let cutoff = now - msg_ttl_secs;
    Ok(conn.execute("DELETE FROM inbox WHERE ts < ?1", [cutoff])?)
}
