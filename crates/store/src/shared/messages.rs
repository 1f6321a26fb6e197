// SPDX-License-Identifier: MIT

use super::rows::message_from_row;
use crate::error::StoreError;
use abus_core::time_fmt::format_ts_hms;
use abus_core::{new_msg_id, AgentId, Message, MsgId};
use rusqlite::Connection;

pub fn publish(
    conn: &Connection,
    from: &AgentId,
    to: &AgentId,
    content: &str,
    now: f64,
) -> Result<MsgId, StoreError> {
    let msg_id = new_msg_id();
    conn.execute(
        "INSERT INTO messages (msg_id, ts, ts_str, from_id, to_id, content, state, attempt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'queued', 0)",
        rusqlite::params![
            msg_id.as_str(),
            now,
            format_ts_hms(now),
            from.as_str(),
            to.as_str(),
            content
        ],
    )?;
    Ok(msg_id)
}

/// Lease-and-read, spec §4.6 step 3: release this recipient's abandoned
/// leases, select up to `max_batch_chars` of queued content ordered by
/// `ts`, and transition the selected rows to `inflight` — all in one
/// transaction.
pub fn lease_and_read(
    conn: &mut Connection,
    me: &AgentId,
    now: f64,
    lease_ttl_secs: f64,
    max_batch_chars: usize,
) -> Result<Vec<Message>, StoreError> {
    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE messages SET state = 'queued', lease_owner = NULL, lease_until = NULL
         WHERE to_id = ?1 AND state = 'inflight' AND lease_until < ?2",
        rusqlite::params![me.as_str(), now],
    )?;

    let candidates: Vec<Message> = {
        let mut stmt = tx.prepare(
            "SELECT * FROM messages WHERE to_id = ?1 AND state = 'queued' ORDER BY ts",
        )?;
        let rows = stmt.query_map(rusqlite::params![me.as_str()], message_from_row)?;
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

    let lease_until = now + lease_ttl_secs;
    for msg in &mut selected {
        tx.execute(
            "UPDATE messages SET state = 'inflight', lease_owner = ?1, lease_until = ?2,
                 attempt = attempt + 1, delivered_at = ?3
             WHERE msg_id = ?4",
            rusqlite::params![me.as_str(), lease_until, now, msg.msg_id.as_str()],
        )?;
        msg.lease_owner = Some(me.clone());
        msg.lease_until = Some(lease_until);
        msg.attempt += 1;
        msg.delivered_at = Some(now);
    }

    tx.commit()?;
    Ok(selected)
}

pub fn ack(conn: &Connection, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError> {
    for id in msg_ids {
        conn.execute(
            "DELETE FROM messages WHERE msg_id = ?1 AND lease_owner = ?2 AND state = 'inflight'",
            rusqlite::params![id.as_str(), me.as_str()],
        )?;
    }
    Ok(())
}

pub fn release_leases(conn: &Connection, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError> {
    for id in msg_ids {
        conn.execute(
            "UPDATE messages SET state = 'queued', lease_owner = NULL, lease_until = NULL
             WHERE msg_id = ?1 AND lease_owner = ?2",
            rusqlite::params![id.as_str(), me.as_str()],
        )?;
    }
    Ok(())
}

/// Janitor remote sweep (spec §4.4 step 3): release any inflight message
/// whose lease has expired, regardless of owner.
pub fn release_abandoned_leases(conn: &Connection, now: f64) -> Result<usize, StoreError> {
    let n = conn.execute(
        "UPDATE messages SET state = 'queued', lease_owner = NULL, lease_until = NULL
         WHERE state = 'inflight' AND lease_until < ?1",
        rusqlite::params![now],
    )?;
    Ok(n)
}

pub fn truncate_old_messages(conn: &Connection, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError> {
    let cutoff = now - msg_ttl_secs;
    let n = conn.execute("DELETE FROM messages WHERE ts < ?1", rusqlite::params![cutoff])?;
    Ok(n)
}
