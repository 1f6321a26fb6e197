// SPDX-License-Identifier: MIT

use abus_core::{AgentId, Message, MessageState, Mode, MsgId, Peer};
use rusqlite::Row;

/// Builds a `Peer` from a shard's `self_state` row. The id isn't a column
/// here (one shard is one agent) so the caller supplies it from the shard
/// file name.
pub fn self_state_to_peer(id: &AgentId, row: &Row<'_>) -> rusqlite::Result<Peer> {
    let mode: Option<String> = row.get("mode")?;
    Ok(Peer {
        id: id.clone(),
        pid: row.get::<_, i64>("pid")? as u32,
        hostname: row.get("hostname")?,
        last_seen: row.get("last_heartbeat")?,
        cwd: row.get("cwd")?,
        mode: mode.and_then(|m| match m.as_str() {
            "working" => Some(Mode::Working),
            "waiting" => Some(Mode::Waiting),
            _ => None,
        }),
        mode_since: row.get("mode_since")?,
        recv_started: row.get("recv_started")?,
        recv_deadline: row.get("recv_deadline")?,
        recv_wait_seconds: row.get("recv_wait_seconds")?,
        active_last_touch: row.get("active_last_touch")?,
    })
}

pub fn mode_str(mode: Option<Mode>) -> Option<&'static str> {
    match mode {
        Some(Mode::Working) => Some("working"),
        Some(Mode::Waiting) => Some("waiting"),
        None => None,
    }
}

/// Both `inbox` and `outbox` share the same row shape; messages there are
/// always `queued` (sharded has no lease concept, spec §4.1/§4.6).
pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let from: String = row.get("from_id")?;
    let to: String = row.get("to_id")?;
    Ok(Message {
        msg_id: MsgId::from_string(row.get::<_, String>("msg_id")?),
        ts: row.get("ts")?,
        ts_str: row.get("ts_str")?,
        from: AgentId::parse(&from).unwrap_or_else(|| AgentId::from_number(1)),
        to: AgentId::parse(&to).unwrap_or_else(|| AgentId::from_number(1)),
        content: row.get("content")?,
        state: MessageState::Queued,
        lease_owner: None,
        lease_until: None,
        attempt: row.get::<_, i64>("attempt")? as u32,
        delivered_at: None,
    })
}
