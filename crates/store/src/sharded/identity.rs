// SPDX-License-Identifier: MIT

//! Sharded-realization claim algorithm, spec §4.2: scan the filesystem for
//! `agent_<id>` shards; the first id with no shard file is free. If every
//! id has a file, reclaim the one whose self-state has the oldest
//! `last_heartbeat` beyond the TTL, delete its shard, and recreate it.
//!
//! Exclusive file creation (`create_new`) gives the atomic claim spec §5
//! asks for ("file-system-level atomicity of shard creation") without
//! needing a cross-shard lock.

use crate::error::StoreError;
use crate::paths::shard_db_path;
use crate::store::ClaimRequest;
use abus_core::AgentId;
use std::fs::OpenOptions;
use std::path::Path;

pub fn claim(root: &Path, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError> {
    if let Some(id) = try_claim_free_slot(root, req)? {
        return Ok(id);
    }
    try_reclaim_stale_slot(root, req)
}

fn try_claim_free_slot(root: &Path, req: &ClaimRequest<'_>) -> Result<Option<AgentId>, StoreError> {
    for n in AgentId::MIN..=AgentId::MAX {
        let id = AgentId::from_number(n);
        let path = shard_db_path(root, &id);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_file) => {
                initialize_shard(&path, req)?;
                return Ok(Some(id));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

fn try_reclaim_stale_slot(root: &Path, req: &ClaimRequest<'_>) -> Result<AgentId, StoreError> {
    loop {
        let mut stalest: Option<(AgentId, f64)> = None;
        for n in AgentId::MIN..=AgentId::MAX {
            let id = AgentId::from_number(n);
            let path = shard_db_path(root, &id);
            if !path.exists() {
                continue;
            }
            let Some(last_heartbeat) = read_last_heartbeat(&path, req)? else { continue };
            if req.now - last_heartbeat <= req.heartbeat_ttl_secs {
                continue;
            }
            let is_older = stalest.as_ref().map(|(_, t)| last_heartbeat < *t).unwrap_or(true);
            if is_older {
                stalest = Some((id, last_heartbeat));
            }
        }

        let Some((id, _)) = stalest else { return Err(StoreError::PoolExhausted) };
        let path = shard_db_path(root, &id);
        let _ = std::fs::remove_file(&path);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_file) => {
                initialize_shard(&path, req)?;
                return Ok(id);
            }
            // Lost the race to reclaim this exact shard; rescan.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read `last_heartbeat` from a shard without holding it open, tolerating a
/// corrupt shard (spec §4.1: treat as if reclaimable via the normal corrupt
/// recreate path — here, simply skip it this pass).
fn read_last_heartbeat(path: &Path, req: &ClaimRequest<'_>) -> Result<Option<f64>, StoreError> {
    let conn = match super::shard::open_existing(path, std::time::Duration::from_secs(5)) {
        Ok(conn) => conn,
        Err(_) => return Ok(None),
    };
    let row: Option<(f64, String, i64)> = conn
        .query_row(
            "SELECT last_heartbeat, hostname, pid FROM self_state WHERE rowid = 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .ok();
    let Some((last_heartbeat, hostname, pid)) = row else { return Ok(None) };

    // A shard whose owning pid is provably dead on this host is reclaimable
    // regardless of its TTL age (mirrors the shared realization's orphan
    // check, spec §4.2's "orphaned" clause).
    if hostname == req.hostname && req.pid_probe.check(pid as u32).is_dead() {
        return Ok(Some(0.0));
    }
    Ok(Some(last_heartbeat))
}

fn initialize_shard(path: &Path, req: &ClaimRequest<'_>) -> Result<(), StoreError> {
    let conn = super::shard::open_existing(path, std::time::Duration::from_secs(5))?;
    conn.execute(
        "INSERT INTO self_state (rowid, pid, hostname, cwd, last_heartbeat, status_request)
         VALUES (1, ?1, ?2, ?3, ?4, 0)",
        rusqlite::params![req.pid, req.hostname, req.cwd, req.now],
    )?;
    conn.execute(
        "INSERT INTO status_result (rowid, ready, rendered) VALUES (1, 0, NULL)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
