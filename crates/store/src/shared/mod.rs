// SPDX-License-Identifier: MIT

//! The shared-store realization (spec §2, layout "S"): one database file
//! holding a `peers` table and a `messages` table, behind a single
//! connection serialized by a mutex so every transaction stays short and
//! non-overlapping within this process (cross-process contention is
//! mediated by SQLite's own locking, per spec §5).

mod identity;
mod messages;
mod peers;
mod rows;
mod schema;

use crate::conn;
use crate::error::StoreError;
use crate::store::{ClaimRequest, Store};
use abus_core::{AgentId, Message, Mode, MsgId, Peer};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub struct SharedStore {
    conn: Mutex<Connection>,
}

impl SharedStore {
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = conn::open(path, busy_timeout)?;
        schema::ensure(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl Store for SharedStore {
    fn claim_identity(&self, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError> {
        let mut conn = self.conn.lock();
        identity::claim(&mut conn, req)
    }

    fn release_self(&self, id: &AgentId) -> Result<(), StoreError> {
        peers::release_self(&self.conn.lock(), id)
    }

    fn touch_heartbeat(&self, id: &AgentId, now: f64, in_waiting_mode: bool) -> Result<(), StoreError> {
        peers::touch_heartbeat(&self.conn.lock(), id, now, in_waiting_mode)
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
        peers::set_recv_mode(&self.conn.lock(), id, mode, now, recv_started, recv_deadline, recv_wait_seconds)
    }

    fn get_peer(&self, id: &AgentId) -> Result<Option<Peer>, StoreError> {
        peers::get_peer(&self.conn.lock(), id)
    }

    fn list_peers(&self) -> Result<Vec<Peer>, StoreError> {
        peers::list_peers(&self.conn.lock())
    }

    fn delete_peer(&self, id: &AgentId) -> Result<(), StoreError> {
        peers::delete_peer(&self.conn.lock(), id)
    }

    fn publish(&self, from: &AgentId, to: &AgentId, content: &str, now: f64) -> Result<MsgId, StoreError> {
        messages::publish(&self.conn.lock(), from, to, content, now)
    }

    fn lease_and_read(
        &self,
        me: &AgentId,
        now: f64,
        lease_ttl_secs: f64,
        max_batch_chars: usize,
    ) -> Result<Vec<Message>, StoreError> {
        messages::lease_and_read(&mut self.conn.lock(), me, now, lease_ttl_secs, max_batch_chars)
    }

    fn ack(&self, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError> {
        messages::ack(&self.conn.lock(), me, msg_ids)
    }

    fn release_leases(&self, me: &AgentId, msg_ids: &[MsgId]) -> Result<(), StoreError> {
        messages::release_leases(&self.conn.lock(), me, msg_ids)
    }

    fn release_abandoned_leases(&self, now: f64) -> Result<usize, StoreError> {
        messages::release_abandoned_leases(&self.conn.lock(), now)
    }

    fn truncate_old_messages(&self, now: f64, msg_ttl_secs: f64) -> Result<usize, StoreError> {
        messages::truncate_old_messages(&self.conn.lock(), now, msg_ttl_secs)
    }

    fn maintenance_checkpoint(&self) -> Result<(), StoreError> {
        conn::checkpoint_and_optimize(&self.conn.lock())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
