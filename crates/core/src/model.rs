// SPDX-License-Identifier: MIT

//! The data model, per spec §3: peers (presence) and messages.

use crate::ids::{AgentId, MsgId};
use serde::{Deserialize, Serialize};

/// Coarse activity state of an online peer, rendered by Status (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Working,
    Waiting,
}

/// One presence record. Primary key is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: AgentId,
    /// Opaque process handle for the liveness probe.
    pub pid: u32,
    pub hostname: String,
    /// Monotonic-enough wall time (seconds since epoch) of last heartbeat.
    pub last_seen: f64,
    pub cwd: String,
    pub mode: Option<Mode>,
    pub mode_since: Option<f64>,
    pub recv_started: Option<f64>,
    pub recv_deadline: Option<f64>,
    pub recv_wait_seconds: Option<f64>,
    pub active_last_touch: Option<f64>,
}

impl Peer {
    pub fn is_online(&self, now: f64, heartbeat_ttl_secs: f64) -> bool {
        now - self.last_seen <= heartbeat_ttl_secs
    }
}

/// Message lifecycle state, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Queued,
    Inflight,
}

/// One physical message record. Fan-out materializes as N records sharing a
/// short-id prefix; `to` is always a concrete recipient, never `"all"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub msg_id: MsgId,
    pub ts: f64,
    pub ts_str: String,
    pub from: AgentId,
    pub to: AgentId,
    pub content: String,
    pub state: MessageState,
    pub lease_owner: Option<AgentId>,
    pub lease_until: Option<f64>,
    pub attempt: u32,
    pub delivered_at: Option<f64>,
}

impl Message {
    /// A message is abandoned when inflight with an expired lease (spec
    /// §3 invariant, §4.4 remote sweep, §4.6 step 3(i)).
    pub fn is_abandoned(&self, now: f64) -> bool {
        self.state == MessageState::Inflight
            && self.lease_until.map(|until| now > until).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
