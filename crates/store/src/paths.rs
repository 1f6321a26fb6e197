// SPDX-License-Identifier: MIT

//! Filesystem layout, per spec §6.
//!
//! `ABUS_ROOT` overrides the platform default for tests and multi-root
//! scenarios (the integration suite gives every spawned process its own
//! `tempdir()` via this variable so concurrent test runs never collide).

use crate::error::StoreError;
use std::path::PathBuf;

const STORE_VERSION: &str = "v1";

pub fn resolve_root() -> Result<PathBuf, StoreError> {
    if let Ok(dir) = std::env::var("ABUS_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    platform_default()
}

#[cfg(windows)]
fn platform_default() -> Result<PathBuf, StoreError> {
    let primary = PathBuf::from(r"C:\mcp_msg_pool\");
    if try_create(&primary) {
        return Ok(primary);
    }
    let fallback = PathBuf::from(r"C:\Users\Public\mcp_msg_pool\");
    try_create(&fallback);
    Ok(fallback)
}

#[cfg(unix)]
fn platform_default() -> Result<PathBuf, StoreError> {
    if let Some(home) = dirs::home_dir() {
        let primary = home.join(".mcp_msg_pool");
        if try_create(&primary) {
            return Ok(primary);
        }
    }
    let fallback = PathBuf::from("/tmp/mcp_msg_pool");
    try_create(&fallback);
    Ok(fallback)
}

fn try_create(dir: &std::path::Path) -> bool {
    std::fs::create_dir_all(dir).is_ok()
}

/// Shared-realization store file: `bridge_<version>.db`.
pub fn shared_db_path(root: &std::path::Path) -> PathBuf {
    root.join(format!("bridge_{STORE_VERSION}.db"))
}

/// Sharded-realization per-agent store file: `agent_<id>.db`.
pub fn shard_db_path(root: &std::path::Path, id: &abus_core::AgentId) -> PathBuf {
    root.join(format!("agent_{id}.db"))
}

/// Enumerate shard files currently present under `root`, returning the
/// parsed agent id for each (non-shard files are skipped).
pub fn list_shard_ids(root: &std::path::Path) -> std::io::Result<Vec<abus_core::AgentId>> {
    let mut ids = Vec::new();
    if !root.exists() {
        return Ok(ids);
    }
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(rest) = name.strip_prefix("agent_") {
            if let Some(id_str) = rest.strip_suffix(".db") {
                if let Some(id) = abus_core::AgentId::parse(id_str) {
                    ids.push(id);
                }
            }
        }
    }
    ids.sort();
    Ok(ids)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
