// SPDX-License-Identifier: MIT

//! Receive (spec §4.6): the interruptible, long-polling blocking receive
//! with lease-on-read (shared realization) or drain-on-read (sharded) and
//! ACK-on-successful-render.

use crate::context::CoreContext;
use crate::session::Session;
use abus_core::{AgentId, Message, Mode};
use std::cmp::Ordering;
use std::fmt;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvOutcome {
    Messages(String),
    NoNewMessages,
    Timeout { waited_secs: i64 },
    Cancelled,
}

impl fmt::Display for RecvOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecvOutcome::Messages(s) => write!(f, "{s}"),
            RecvOutcome::NoNewMessages => write!(f, "No new messages."),
            RecvOutcome::Timeout { waited_secs } => write!(f, "Timeout ({waited_secs}s)."),
            RecvOutcome::Cancelled => write!(f, "Cancelled by new command."),
        }
    }
}

pub fn recv(ctx: &CoreContext, session: &Session, wait_seconds: f64) -> RecvOutcome {
    let _span = tracing::info_span!("recv", id = %session.id, wait_seconds).entered();
    let start = ctx.now();
    session.mark_active(start);
    let baseline = session.last_active_ts();

    let deadline = start + wait_seconds.max(0.0);
    let _ = ctx.store.set_recv_mode(
        &session.id,
        Some(Mode::Waiting),
        start,
        Some(start),
        Some(deadline),
        Some(wait_seconds),
    );

    let outcome = if wait_seconds <= 0.0 {
        match try_lease_batch(ctx, session, start) {
            Some(batch) => RecvOutcome::Messages(render_and_ack(ctx, session, batch)),
            None => RecvOutcome::NoNewMessages,
        }
    } else {
        recv_loop(ctx, session, baseline, deadline, wait_seconds)
    };

    let now_end = ctx.now();
    let _ = ctx.store.set_recv_mode(&session.id, Some(Mode::Working), now_end, None, None, None);
    outcome
}

fn recv_loop(ctx: &CoreContext, session: &Session, baseline: f64, deadline: f64, wait_seconds: f64) -> RecvOutcome {
    let tick = ctx.config.recv_tick;
    let db_poll_every = ctx.config.recv_db_poll_every.as_secs_f64();
    let mut last_poll: Option<f64> = None;

    loop {
        let now = ctx.now();

        if session.last_active_ts() != baseline {
            return RecvOutcome::Cancelled;
        }
        if now >= deadline {
            return RecvOutcome::Timeout { waited_secs: wait_seconds.floor() as i64 };
        }

        let due = last_poll.map(|t| now - t >= db_poll_every).unwrap_or(true);
        if due {
            last_poll = Some(now);
            if let Some(batch) = try_lease_batch(ctx, session, now) {
                return RecvOutcome::Messages(render_and_ack(ctx, session, batch));
            }
        }

        thread::sleep(tick);
    }
}

/// One lease-and-read (or drain) attempt. Returns `None` when nothing was
/// available. Leaves the batch leased — callers must render and ack (or
/// release) it themselves, so a crash between this call and the rendered
/// string reaching the caller leaves the content recoverable (spec §4.6
/// step 6).
fn try_lease_batch(ctx: &CoreContext, session: &Session, now: f64) -> Option<Vec<Message>> {
    let lease_ttl = ctx.config.lease_ttl.as_secs_f64();
    let batch = match ctx.store.lease_and_read(&session.id, now, lease_ttl, ctx.config.max_batch_chars) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(error = %e, "lease_and_read failed");
            return None;
        }
    };
    if batch.is_empty() {
        return None;
    }
    Some(batch)
}

/// Render first, then ack — ack is the very last thing that happens before
/// the rendered string is handed back (spec §4.6 steps 4-5). If ack fails,
/// release the lease outright rather than leaving recovery to LEASE_TTL
/// expiry.
fn render_and_ack(ctx: &CoreContext, session: &Session, batch: Vec<Message>) -> String {
    let rendered = render_batch(&batch);
    if !ctx.config.test_pre_ack_delay.is_zero() {
        thread::sleep(ctx.config.test_pre_ack_delay);
    }
    let msg_ids: Vec<_> = batch.iter().map(|m| m.msg_id.clone()).collect();
    if let Err(e) = ctx.store.ack(&session.id, &msg_ids) {
        tracing::warn!(error = %e, "ack failed, releasing lease for redelivery");
        if let Err(e2) = ctx.store.release_leases(&session.id, &msg_ids) {
            tracing::warn!(error = %e2, "release_leases also failed, relying on lease expiry");
        }
    }
    rendered
}

/// Group by sender, ascending `ts` within a sender, ascending first-`ts`
/// across senders (spec §4.6 step 4).
fn render_batch(batch: &[Message]) -> String {
    let mut by_sender: Vec<(AgentId, Vec<&Message>)> = Vec::new();
    for msg in batch {
        match by_sender.iter_mut().find(|(id, _)| *id == msg.from) {
            Some(entry) => entry.1.push(msg),
            None => by_sender.push((msg.from.clone(), vec![msg])),
        }
    }

    by_sender.sort_by(|a, b| {
        let a_ts = a.1.first().map(|m| m.ts).unwrap_or(f64::MAX);
        let b_ts = b.1.first().map(|m| m.ts).unwrap_or(f64::MAX);
        a_ts.partial_cmp(&b_ts).unwrap_or(Ordering::Equal)
    });

    let mut sections = Vec::with_capacity(by_sender.len());
    for (sender, mut msgs) in by_sender {
        msgs.sort_by(|a, b| a.ts.partial_cmp(&b.ts).unwrap_or(Ordering::Equal));
        let mut section = format!("[{}] - {} message(s)", sender, msgs.len());
        for m in msgs {
            section.push_str(&format!("\n  {} {}", m.ts_str, m.content));
        }
        sections.push(section);
    }
    sections.join("\n\n")
}

#[cfg(test)]
#[path = "receive_tests.rs"]
mod tests;
