// SPDX-License-Identifier: MIT

//! Process-wide singleton session state (spec §4.3), modelled as an
//! explicit value rather than lazy-initialized global state.

use crate::context::CoreContext;
use abus_core::{AgentId, BusError};
use abus_store::ClaimRequest;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct Session {
    pub id: AgentId,
    pub pid: u32,
    pub hostname: String,
    pub cwd: String,
    pub start_time: f64,
    last_active_ts: AtomicU64,
    released: AtomicBool,
}

impl Session {
    /// Claim an identity and insert this session's row. The Heartbeat task
    /// and exit hook are the caller's responsibility to wire up (see
    /// `scheduler::spawn` and `Session::release`).
    pub fn claim(ctx: &CoreContext, cwd: String) -> Result<Self, BusError> {
        let now = ctx.now();
        let pid = std::process::id();
        let req = ClaimRequest {
            pid,
            hostname: &ctx.hostname,
            cwd: &cwd,
            now,
            heartbeat_ttl_secs: ctx.config.heartbeat_ttl.as_secs_f64(),
            pid_probe: ctx.pid_probe.as_ref(),
        };
        let id = ctx.store.claim_identity(&req)?;
        tracing::info!(id = %id, pid, "claimed identity");
        Ok(Self {
            id,
            pid,
            hostname: ctx.hostname.clone(),
            cwd,
            start_time: now,
            last_active_ts: AtomicU64::new(now.to_bits()),
            released: AtomicBool::new(false),
        })
    }

    pub fn last_active_ts(&self) -> f64 {
        f64::from_bits(self.last_active_ts.load(Ordering::SeqCst))
    }

    /// Called by any operation this session performs, so a concurrent
    /// `recv` can detect it via the cancellation check (spec §4.6 step 1).
    pub fn mark_active(&self, now: f64) {
        self.last_active_ts.store(now.to_bits(), Ordering::SeqCst);
    }

    /// The guaranteed-release hook (spec §4.3). Idempotent and infallible
    /// from the caller's perspective — a failure here is logged, never
    /// propagated (spec §8 property 8, §7 propagation policy).
    pub fn release(&self, ctx: &CoreContext) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = ctx.store.release_self(&self.id) {
            tracing::warn!(id = %self.id, error = %e, "failed to release session row");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
