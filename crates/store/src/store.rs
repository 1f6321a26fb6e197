// SPDX-License-Identifier: MIT

//! The realization-agnostic `Store` contract (spec §9: "The contract
//! exposed above is realization-agnostic"). `SharedStore` and
//! `ShardedStore` both implement this trait; `abus-engine` talks only to
//! `dyn Store` above this line.

use crate::error::StoreError;
use abus_core::{AgentId, Message, Mode, MsgId, PidProbe, Peer};

/// Everything the Identity Allocator (spec §4.2) needs to judge whether an
/// existing row can be reclaimed.
pub struct ClaimRequest<'a> {
    pub pid: u32,
    pub hostname: &'a str,
    pub cwd: &'a str,
    pub now: f64,
    pub heartbeat_ttl_secs: f64,
    pub pid_probe: &'a dyn PidProbe,
}

pub trait Store: Send + Sync {
    /// Atomically claim the lowest free (or reclaimable) three-digit id and
    /// insert this session's peer/self-state row under it (spec §4.2).
    fn claim_identity(&self, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError>;

    /// Remove this session's row. Idempotent (spec §4.3, §8 property 8).
    fn release_self(&self, id: &AgentId) -> Result<(), StoreError>;

    /// Heartbeat refresh: bump `last_seen`, and `active_last_touch` too
    /// when `in_waiting_mode` (spec §4.4 step 1).
    fn touch_heartbeat(&self, id: &AgentId, now: f64, in_waiting_mode: bool) -> Result<(), StoreError>;

    /// Enter/leave waiting mode (spec §4.6). `deadline`/`wait_seconds` are
    /// only meaningful while `mode == Waiting`.
    fn set_recv_mode(
        &self,
        id: &AgentId,
        mode: Option<Mode>,
        now: f64,
        recv_started: Option<f64>,
        recv_deadline: Option<f64>,
        recv_wait_seconds: Option<f64>,
    ) -> Result<(), StoreError>;

    fn get_peer(&self, id: &AgentId) -> Result<Option<Peer>, StoreError>;

    /// All known peer rows, any age — callers filter by TTL themselves
    /// (Status uses `HEARTBEAT_TTL`; the janitor uses it to find stale rows).
    fn list_peers(&self) -> Result<Vec<Peer>, StoreError>;

    /// Delete one peer row outright (local liveness sweep, TTL eviction).
    fn delete_peer(&self, id: &AgentId) -> Result<(), StoreError>;

    /// Publish one physical message record addressed to `to`. Returns the
    /// generated message id. Single-transaction per record (spec §4.5).
    fn publish(&self, from: &AgentId, to: &AgentId, content: &str, now: f64) -> Result<MsgId, StoreError>;

    /// Lease-and-read (shared) or drain-inbox (sharded) — spec §4.6 step 3.
    fn lease_and_read(
        &self,
        me: &AgentId,
        now: f64,
        lease_ttl_secs: f64,
        max_batch_chars: usize,
    ) -> Result<Vec<Message>, StoreError>;

    /// Durable ACK: delete exactly the leased records (spec §4.6 step 5).
    /// A no-op for the sharded realization, where drain already deleted them.
    fn ack(&self, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError>;

    /// Best-effort lease release on the abort path (spec §4.6 step 6). A
    /// no-op for the sharded realization (no lease concept there).
    fn release_leases(&self, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError>;

    /// Janitor remote sweep: release any message whose lease has expired.
    /// Returns the count released. No-op (returns 0) where not applicable.
    fn release_abandoned_leases(&self, _now: f64) -> Result<usize, StoreError> {
        Ok(0)
    }

    /// Janitor remote sweep: truncate messages older than `MSG_TTL`.
    fn truncate_old_messages(&self, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError>;

    /// Janitor store-maintenance tick: WAL checkpoint + optimize.
    fn maintenance_checkpoint(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Sharded-only: the Leader's reconciliation pass (spec §4.4). A no-op
    /// for the shared realization, where delivery is already visible.
    fn run_reconciler_pass(&self, _online_ids: &[AgentId], _batch_size: usize) -> Result<(), StoreError> {
        Ok(())
    }

    /// Sharded-only: flag this session's shard for a status render.
    fn request_status(&self, _id: &AgentId) -> Result<(), StoreError> {
        Ok(())
    }

    /// Sharded-only: poll for (and consume) a rendered status result.
    fn poll_status_result(&self, _id: &AgentId) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    /// Sharded-only: the Leader fulfills any pending `status_request` flags
    /// by calling `render` with the current online roster.
    fn fulfill_status_requests(
        &self,
        _online: &[Peer],
        _render: &dyn Fn(&[Peer]) -> String,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    /// Sharded-only: how many of `msg_ids` (all just published into `me`'s
    /// own outbox) are still sitting there, unreconciled. Used by Delivery's
    /// `SEND_WAIT` poll (spec §4.5). Always 0 for the shared realization,
    /// where a successful `publish` is already visible to the recipient.
    fn count_pending_in_outbox(&self, _me: &AgentId, _msg_ids: &[MsgId]) -> Result<usize, StoreError> {
        Ok(0)
    }

    /// True only for the sharded realization; lets the engine skip
    /// lease-based janitor work it would otherwise duplicate.
    fn is_sharded(&self) -> bool {
        false
    }
}
