// SPDX-License-Identifier: MIT

//! Heartbeat & Janitor (spec §4.4): a cooperative background task per
//! session, refreshing liveness, sweeping dead/stale peers, releasing
//! abandoned leases, and truncating old messages. The sharded realization's
//! Leader reconciler (outbox-to-inbox plus status fulfillment) runs as a
//! second, independently-paced task rather than riding the heartbeat tick.

use crate::context::CoreContext;
use crate::render;
use crate::session::Session;
use abus_core::AgentId;
use abus_store::StoreError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Handle {
    token: CancellationToken,
    heartbeat_task: tokio::task::JoinHandle<()>,
    reconciler_task: Option<tokio::task::JoinHandle<()>>,
}

impl Handle {
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.heartbeat_task.await;
        if let Some(task) = self.reconciler_task {
            let _ = task.await;
        }
    }
}

/// Spawn the Heartbeat/Janitor loop for `session`, at `HEARTBEAT_INTERVAL`
/// cadence (plus up to 50ms jitter, spec §4.4). The sharded realization also
/// gets a second, independent loop driving the Leader's reconciler/status
/// pass at its own, much faster, agent-count-scaled cadence — it must not
/// wait on the heartbeat tick (spec §4.4's reconciler poll interval).
pub fn spawn(ctx: Arc<CoreContext>, session: Arc<Session>) -> Handle {
    let token = CancellationToken::new();

    let heartbeat_task = {
        let ctx = ctx.clone();
        let session = session.clone();
        let child = token.clone();
        tokio::spawn(async move { run_heartbeat(ctx, session, child).await })
    };

    let reconciler_task = if ctx.store.is_sharded() {
        let child = token.clone();
        Some(tokio::spawn(async move { run_reconciler(ctx, session, child).await }))
    } else {
        None
    };

    Handle { token, heartbeat_task, reconciler_task }
}

async fn run_heartbeat(ctx: Arc<CoreContext>, session: Arc<Session>, token: CancellationToken) {
    let mut tick_count: u32 = 0;
    loop {
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=50));
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(ctx.config.heartbeat_interval + jitter) => {}
        }
        tick_count += 1;
        let _span = tracing::info_span!("heartbeat_tick", id = %session.id, tick_count).entered();
        if let Err(e) = run_tick(&ctx, &session, tick_count) {
            tracing::warn!(error = %e, "heartbeat tick failed");
        }
    }
}

/// Drives `leader_pass` on its own cadence, independent of the heartbeat:
/// `poll_interval = max(0.1s, 0.5s / agent_count)` plus up to 50ms jitter
/// (spec §4.4), so reconciliation and status fulfillment stay responsive
/// regardless of how long `HEARTBEAT_INTERVAL` is configured.
async fn run_reconciler(ctx: Arc<CoreContext>, session: Arc<Session>, token: CancellationToken) {
    loop {
        let agent_count = ctx.store.list_peers().map(|peers| peers.len()).unwrap_or(1).max(1);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=50));
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(reconciler_poll_interval(agent_count) + jitter) => {}
        }
        if let Err(e) = leader_pass(&ctx, &session, ctx.now()) {
            tracing::warn!(error = %e, "reconciler pass failed");
        }
    }
}

/// `max(0.1s, 0.5s / agent_count)` (spec §4.4).
fn reconciler_poll_interval(agent_count: usize) -> Duration {
    Duration::from_secs_f64((0.5 / agent_count as f64).max(0.1))
}

/// One tick's worth of heartbeat/janitor work, factored out of the async
/// loop so it can be driven directly and deterministically in tests.
fn run_tick(ctx: &CoreContext, session: &Session, tick_count: u32) -> Result<(), StoreError> {
    let now = ctx.now();

    let waiting = ctx
        .store
        .get_peer(&session.id)?
        .map(|p| p.mode == Some(abus_core::Mode::Waiting))
        .unwrap_or(false);
    ctx.store.touch_heartbeat(&session.id, now, waiting)?;

    local_liveness_sweep(ctx)?;

    if tick_count % ctx.config.remote_sweep_every_ticks() == 0 {
        remote_sweep(ctx, now)?;
    }

    if tick_count % ctx.config.maintenance_every_ticks() == 0 {
        ctx.store.maintenance_checkpoint()?;
    }

    Ok(())
}

/// Every tick: a peer whose pid is dead on this host is removed outright,
/// regardless of `cwd` or TTL (spec §4.4 step 2).
fn local_liveness_sweep(ctx: &CoreContext) -> Result<(), StoreError> {
    for peer in ctx.store.list_peers()? {
        if peer.hostname != ctx.hostname {
            continue;
        }
        if ctx.pid_probe.check(peer.pid).is_dead() {
            ctx.store.delete_peer(&peer.id)?;
        }
    }
    Ok(())
}

/// Every 6th tick: TTL-evict stale peers, release abandoned leases, and
/// truncate aged messages (spec §4.4 step 3).
fn remote_sweep(ctx: &CoreContext, now: f64) -> Result<(), StoreError> {
    let heartbeat_ttl = ctx.config.heartbeat_ttl.as_secs_f64();
    for peer in ctx.store.list_peers()? {
        if !peer.is_online(now, heartbeat_ttl) {
            ctx.store.delete_peer(&peer.id)?;
        }
    }
    ctx.store.release_abandoned_leases(now)?;
    ctx.store.truncate_old_messages(now, ctx.config.msg_ttl.as_secs_f64())?;
    Ok(())
}

/// Sharded-only: the Reconciler and status fulfillment, run only when this
/// session is the Leader (lowest online id, spec §4.4 and GLOSSARY).
fn leader_pass(ctx: &CoreContext, session: &Session, now: f64) -> Result<(), StoreError> {
    let heartbeat_ttl = ctx.config.heartbeat_ttl.as_secs_f64();
    let mut online: Vec<_> = ctx.store.list_peers()?.into_iter().filter(|p| p.is_online(now, heartbeat_ttl)).collect();
    online.sort_by(|a, b| a.id.cmp(&b.id));

    let Some(leader) = online.first() else { return Ok(()) };
    if leader.id != session.id {
        return Ok(());
    }

    let online_ids: Vec<AgentId> = online.iter().map(|p| p.id.clone()).collect();
    ctx.store.run_reconciler_pass(&online_ids, ctx.config.batch_size)?;

    let render_now = ctx.now();
    ctx.store.fulfill_status_requests(&online, &|peers| render::render_roster_neutral(peers, render_now))?;
    Ok(())
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
