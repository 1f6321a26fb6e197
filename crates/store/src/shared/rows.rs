// SPDX-License-Identifier: MIT

use abus_core::{AgentId, Message, MessageState, Mode, MsgId, Peer};
use rusqlite::Row;

pub fn peer_from_row(row: &Row<'_>) -> rusqlite::Result<Peer> {
    let id: String = row.get("id")?;
    let mode: Option<String> = row.get("mode")?;
    Ok(Peer {
        id: AgentId::parse(&id).unwrap_or_else(|| AgentId::from_number(1)),
        pid: row.get::<_, i64>("pid")? as u32,
        hostname: row.get("hostname")?,
        last_seen: row.get("last_seen")?,
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

pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let state: String = row.get("state")?;
    let from: String = row.get("from_id")?;
    let to: String = row.get("to_id")?;
    let lease_owner: Option<String> = row.get("lease_owner")?;
    Ok(Message {
        msg_id: MsgId::from_string(row.get::<_, String>("msg_id")?),
        ts: row.get("ts")?,
        ts_str: row.get("ts_str")?,
        from: AgentId::parse(&from).unwrap_or_else(|| AgentId::from_number(1)),
        to: AgentId::parse(&to).unwrap_or_else(|| AgentId::from_number(1)),
        content: row.get("content")?,
        state: if state == "inflight" { MessageState::Inflight } else { MessageState::Queued },
        lease_owner: lease_owner.and_then(|s| AgentId::parse(&s)),
        lease_until: row.get("lease_until")?,
        attempt: row.get::<_, i64>("attempt")? as u32,
        delivered_at: row.get("delivered_at")?,
    })
}

pub fn mode_str(mode: Option<Mode>) -> Option<&'static str> {
    match mode {
        Some(Mode::Working) => Some("working"),
        Some(Mode::Waiting) => Some("waiting"),
        None => None,
    }
}
