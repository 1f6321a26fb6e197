// SPDX-License-Identifier: MIT

//! Status (spec §4.7): render the online roster. The shared realization
//! always scans locally; the sharded realization asks its Leader to
//! render and polls briefly, falling back to a local scan if the Leader
//! is unresponsive.

use crate::context::CoreContext;
use crate::render;
use crate::session::Session;
use std::thread;
use std::time::Duration;

pub fn get_status(ctx: &CoreContext, session: &Session) -> String {
    let _span = tracing::info_span!("get_status", id = %session.id).entered();
    let now = ctx.now();
    session.mark_active(now);

    if ctx.store.is_sharded() {
        if let Some(rendered) = request_and_poll(ctx, session) {
            return rendered;
        }
        tracing::warn!(id = %session.id, "status leader unresponsive, falling back to local scan");
    }

    local_scan(ctx, session, ctx.now())
}

fn local_scan(ctx: &CoreContext, session: &Session, now: f64) -> String {
    let heartbeat_ttl = ctx.config.heartbeat_ttl.as_secs_f64();
    let peers = match ctx.store.list_peers() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "list_peers failed");
            Vec::new()
        }
    };
    let online: Vec<_> = peers.into_iter().filter(|p| p.is_online(now, heartbeat_ttl)).collect();
    render::render_roster(&session.id, &online, now)
}

/// Sharded-only fast path: ask the Leader to render and poll for up to 3s
/// (spec §4.7).
fn request_and_poll(ctx: &CoreContext, session: &Session) -> Option<String> {
    if let Err(e) = ctx.store.request_status(&session.id) {
        tracing::warn!(error = %e, "request_status failed");
        return None;
    }

    let deadline = ctx.now() + 3.0;
    let poll_every = Duration::from_millis(100);
    loop {
        match ctx.store.poll_status_result(&session.id) {
            Ok(Some(rendered)) => return Some(rendered),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "poll_status_result failed");
                return None;
            }
        }
        if ctx.now() >= deadline {
            return None;
        }
        thread::sleep(poll_every);
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
