use super::*;
use abus_core::AgentId;

#[test]
fn resolve_root_honors_abus_root_override() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("ABUS_ROOT", dir.path());
    let root = resolve_root().unwrap();
    std::env::remove_var("ABUS_ROOT");
    assert_eq!(root, dir.path());
}

#[test]
fn shared_db_path_is_versioned() {
    let root = std::path::Path::new("/tmp/example");
    assert_eq!(shared_db_path(root), std::path::PathBuf::from("/tmp/example/bridge_v1.db"));
}

#[test]
fn shard_db_path_embeds_id() {
    let root = std::path::Path::new("/tmp/example");
    let id = AgentId::from_number(101);
    assert_eq!(shard_db_path(root, &id), std::path::PathBuf::from("/tmp/example/agent_101.db"));
}

#[test]
fn list_shard_ids_finds_only_valid_shard_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("agent_101.db"), b"").unwrap();
    std::fs::write(dir.path().join("agent_102.db"), b"").unwrap();
    std::fs::write(dir.path().join("agent_bad.db"), b"").unwrap();
    std::fs::write(dir.path().join("bridge_v1.db"), b"").unwrap();
    let mut ids = list_shard_ids(dir.path()).unwrap();
    ids.sort();
    assert_eq!(ids, vec![AgentId::from_number(101), AgentId::from_number(102)]);
}

#[test]
fn list_shard_ids_empty_for_missing_root() {
    let ids = list_shard_ids(std::path::Path::new("/nonexistent/abus/root")).unwrap();
    assert!(ids.is_empty());
}
