// SPDX-License-Identifier: MIT

//! The sharded-store realization (spec §2, layout "P"): one database file
//! per agent (`agent_<id>.db`), each holding its own `self_state`, `inbox`,
//! `outbox`, and `status_result`. No connection is held across calls — this
//! realization opens a fresh, short-lived `Connection` per shard per
//! operation (spec §4.1: "no cross-operation handles persist"), so cross
//! shard moves (the Reconciler) and cross-process races are both mediated
//! purely by SQLite's own file locking and filesystem atomics.

mod identity;
mod inbox;
mod outbox;
mod reconciler;
mod rows;
mod schema;
mod self_state;
mod shard;
mod status_result;

use crate::error::StoreError;
use crate::paths::{self, shard_db_path};
use crate::store::{ClaimRequest, Store};
use abus_core::{AgentId, Message, Mode, MsgId, Peer};
use std::path::PathBuf;
use std::time::Duration;

pub struct ShardedStore {
    root: PathBuf,
    busy_timeout: Duration,
}

impl ShardedStore {
    pub fn open(root: PathBuf, busy_timeout: Duration) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, busy_timeout })
    }

    fn shard_path(&self, id: &AgentId) -> PathBuf {
        shard_db_path(&self.root, id)
    }
}

impl Store for ShardedStore {
    fn claim_identity(&self, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError> {
        identity::claim(&self.root, req)
    }

    fn release_self(&self, id: &AgentId) -> Result<(), StoreError> {
        let path = self.shard_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn touch_heartbeat(&self, id: &AgentId, now: f64, in_waiting_mode: bool) -> Result<(), StoreError> {
        let conn = shard::open_existing(&self.shard_path(id), self.busy_timeout)?;
        self_state::touch_heartbeat(&conn, now, in_waiting_mode)
    }

    fn set_recv_mode(
        &self,
        id: &AgentId,
        mode: Option<Mode>,
        now: f64,
        recv_started: Option<f64>,
        recv_deadline: Option<f64>,
        recv_wait_seconds: Option<f64>,
    ) -> Result<(), StoreError> {
        let conn = shard::open_existing(&self.shard_path(id), self.busy_timeout)?;
        self_state::set_recv_mode(&conn, mode, now, recv_started, recv_deadline, recv_wait_seconds)
    }

    fn get_peer(&self, id: &AgentId) -> Result<Option<Peer>, StoreError> {
        if !self.shard_path(id).exists() {
            return Ok(None);
        }
        let conn = shard::open_existing(&self.shard_path(id), self.busy_timeout)?;
        self_state::get_self_state(&conn, id)
    }

    fn list_peers(&self) -> Result<Vec<Peer>, StoreError> {
        let mut out = Vec::new();
        for id in paths::list_shard_ids(&self.root)? {
            let conn = match shard::open_existing(&self.shard_path(&id), self.busy_timeout) {
                Ok(conn) => conn,
                Err(_) => continue,
            };
            if let Some(peer) = self_state::get_self_state(&conn, &id)? {
                out.push(peer);
            }
        }
        Ok(out)
    }

    fn delete_peer(&self, id: &AgentId) -> Result<(), StoreError> {
        self.release_self(id)
    }

    fn publish(&self, from: &AgentId, to: &AgentId, content: &str, now: f64) -> Result<MsgId, StoreError> {
        let conn = shard::open_existing(&self.shard_path(from), self.busy_timeout)?;
        outbox::publish(&conn, from, to, content, now)
    }

    fn lease_and_read(
        &self,
        me: &AgentId,
        _now: f64,
        _lease_ttl_secs: f64,
        max_batch_chars: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let mut conn = shard::open_existing(&self.shard_path(me), self.busy_timeout)?;
        inbox::drain(&mut conn, max_batch_chars)
    }

    /// No-op: draining the inbox already deleted the rows.
    fn ack(&self, _me: &AgentId, _msg_ids: &[MsgId]) -> Result<(), StoreError> {
        Ok(())
    }

    /// No-op: there is no lease to release in this realization.
    fn release_leases(&self, _me: &AgentId, _msg_ids: &[MsgId]) -> Result<(), StoreError> {
        Ok(())
    }

    fn truncate_old_messages(&self, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError> {
        let mut total = 0;
        for id in paths::list_shard_ids(&self.root)? {
            let conn = match shard::open_existing(&self.shard_path(&id), self.busy_timeout) {
                Ok(conn) => conn,
                Err(_) => continue,
            };
            total += inbox::truncate_old(&conn, now, msg_ttl_secs)?;
            total += outbox::truncate_old(&conn, now, msg_ttl_secs)?;
        }
        Ok(total)
    }

    fn maintenance_checkpoint(&self) -> Result<(), StoreError> {
        for id in paths::list_shard_ids(&self.root)? {
            let conn = match shard::open_existing(&self.shard_path(&id), self.busy_timeout) {
                Ok(conn) => conn,
                Err(_) => continue,
            };
            crate::conn::checkpoint_and_optimize(&conn)?;
        }
        Ok(())
    }

    fn run_reconciler_pass(&self, online_ids: &[AgentId], batch_size: usize) -> Result<(), StoreError> {
        reconciler::run_pass(&self.root, online_ids, batch_size, self.busy_timeout)
    }

    fn request_status(&self, id: &AgentId) -> Result<(), StoreError> {
        let conn = shard::open_existing(&self.shard_path(id), self.busy_timeout)?;
        self_state::request_status(&conn)
    }

    fn poll_status_result(&self, id: &AgentId) -> Result<Option<String>, StoreError> {
        let conn = shard::open_existing(&self.shard_path(id), self.busy_timeout)?;
        status_result::take_result(&conn)
    }

    fn fulfill_status_requests(
        &self,
        online: &[Peer],
        render: &dyn Fn(&[Peer]) -> String,
    ) -> Result<(), StoreError> {
        reconciler::fulfill_status_requests(&self.root, online, render, self.busy_timeout)
    }

    fn count_pending_in_outbox(&self, me: &AgentId, msg_ids: &[MsgId]) -> Result<usize, StoreError> {
        let conn = shard::open_existing(&self.shard_path(me), self.busy_timeout)?;
        outbox::count_present(&conn, msg_ids)
    }

    fn is_sharded(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
