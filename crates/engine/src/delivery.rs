// SPDX-License-Identifier: MIT

//! Delivery (spec §4.5): resolves `to` against the current online
//! snapshot, fans out into one physical record per recipient, and — for
//! the sharded realization only — waits briefly for the Leader to move
//! those records before reporting the outcome.

use crate::context::CoreContext;
use crate::session::Session;
use abus_core::{AgentId, MsgId};
use std::fmt;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { count: usize, short_id: String },
    Partial { committed: usize, total: usize, short_id: String },
    Timeout { agents: usize },
    NoPeers,
    CannotSendToSelf,
    EmptyContent,
    RecipientOffline(String),
    DbError(String),
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent { count, short_id } => write!(f, "Sent (to {count} agent(s), id={short_id})"),
            SendOutcome::Partial { committed, total, short_id } => {
                write!(f, "Partially sent (to {committed}/{total} agents, id={short_id})")
            }
            SendOutcome::Timeout { agents } => write!(f, "Send timeout after 2s (to {agents} agents)"),
            SendOutcome::NoPeers => write!(f, "No other agents online."),
            SendOutcome::CannotSendToSelf => write!(f, "Error: cannot send to self."),
            SendOutcome::EmptyContent => write!(f, "Error: {}", abus_core::BusError::EmptyContent),
            SendOutcome::RecipientOffline(id) => write!(f, "Error: Agent '{id}' offline."),
            SendOutcome::DbError(reason) => write!(f, "DB Error: {reason}"),
        }
    }
}

pub fn send(ctx: &CoreContext, session: &Session, to: &str, content: &str) -> SendOutcome {
    let _span = tracing::info_span!("send", id = %session.id, to).entered();
    let now = ctx.now();
    session.mark_active(now);

    if content.is_empty() {
        return SendOutcome::EmptyContent;
    }

    let recipients = match resolve_recipients(ctx, session, to, now) {
        Ok(r) => r,
        Err(outcome) => return outcome,
    };

    let mut msg_ids: Vec<MsgId> = Vec::with_capacity(recipients.len());
    let mut last_err = None;
    for to_id in &recipients {
        match ctx.store.publish(&session.id, to_id, content, now) {
            Ok(id) => msg_ids.push(id),
            Err(e) => {
                tracing::warn!(to = %to_id, error = %e, "publish failed");
                last_err = Some(e);
            }
        }
    }

    let total = recipients.len();
    let committed = msg_ids.len();
    if committed == 0 {
        let reason = last_err.map(|e| e.to_string()).unwrap_or_else(|| "no recipients".to_string());
        return SendOutcome::DbError(reason);
    }
    let short_id = msg_ids[0].short().to_string();

    if !ctx.store.is_sharded() {
        return if committed == total {
            SendOutcome::Sent { count: committed, short_id }
        } else {
            SendOutcome::Partial { committed, total, short_id }
        };
    }

    await_reconciliation(ctx, session, msg_ids, total, short_id)
}

fn resolve_recipients(
    ctx: &CoreContext,
    session: &Session,
    to: &str,
    now: f64,
) -> Result<Vec<AgentId>, SendOutcome> {
    let heartbeat_ttl = ctx.config.heartbeat_ttl.as_secs_f64();

    if to == "all" {
        let peers = ctx.store.list_peers().map_err(|e| SendOutcome::DbError(e.to_string()))?;
        let others: Vec<AgentId> = peers
            .into_iter()
            .filter(|p| p.id != session.id && p.is_online(now, heartbeat_ttl))
            .map(|p| p.id)
            .collect();
        return if others.is_empty() { Err(SendOutcome::NoPeers) } else { Ok(others) };
    }

    let ids: Vec<&str> = to.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let mut resolved = Vec::with_capacity(ids.len());
    for raw in ids {
        let Some(id) = AgentId::parse(raw) else {
            return Err(SendOutcome::RecipientOffline(raw.to_string()));
        };
        if id == session.id {
            return Err(SendOutcome::CannotSendToSelf);
        }
        let online = ctx
            .store
            .get_peer(&id)
            .map_err(|e| SendOutcome::DbError(e.to_string()))?
            .map(|p| p.is_online(now, heartbeat_ttl))
            .unwrap_or(false);
        if !online {
            return Err(SendOutcome::RecipientOffline(raw.to_string()));
        }
        resolved.push(id);
    }
    if resolved.is_empty() {
        return Err(SendOutcome::RecipientOffline(to.to_string()));
    }
    Ok(resolved)
}

/// Sharded-only: poll this session's own outbox until every just-published
/// record has been moved by the Leader, or `SEND_WAIT` elapses (spec
/// §4.5). Durability isn't affected either way — an unmoved row is picked
/// up on the Leader's next tick regardless of what this returns.
fn await_reconciliation(
    ctx: &CoreContext,
    session: &Session,
    msg_ids: Vec<MsgId>,
    total: usize,
    short_id: String,
) -> SendOutcome {
    let deadline = ctx.now() + ctx.config.send_wait.as_secs_f64();
    let poll_every = Duration::from_millis(50);
    loop {
        let pending = match ctx.store.count_pending_in_outbox(&session.id, &msg_ids) {
            Ok(n) => n,
            Err(e) => return SendOutcome::DbError(e.to_string()),
        };
        let moved = msg_ids.len() - pending;
        if pending == 0 {
            return if moved == total {
                SendOutcome::Sent { count: moved, short_id }
            } else {
                SendOutcome::Partial { committed: moved, total, short_id }
            };
        }
        if ctx.now() >= deadline {
            return if moved == 0 {
                SendOutcome::Timeout { agents: total }
            } else {
                SendOutcome::Partial { committed: moved, total, short_id }
            };
        }
        thread::sleep(poll_every);
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
