use super::*;
use abus_core::pidprobe::fake::FakePidProbe;
use tempfile::tempdir;

fn req<'a>(pid: u32, now: f64, probe: &'a FakePidProbe) -> ClaimRequest<'a> {
    ClaimRequest { pid, hostname: "h", cwd: "/tmp", now, heartbeat_ttl_secs: 300.0, pid_probe: probe }
}

#[test]
fn claims_lowest_free_id() {
    let dir = tempdir().unwrap();
    let probe = FakePidProbe::new();
    let id = claim(dir.path(), &req(100, 1000.0, &probe)).unwrap();
    assert_eq!(id.as_str(), "001");
}

#[test]
fn concurrent_claims_get_distinct_ids() {
    let dir = tempdir().unwrap();
    let probe = FakePidProbe::new();
    let a = claim(dir.path(), &req(100, 1000.0, &probe)).unwrap();
    let b = claim(dir.path(), &req(200, 1000.0, &probe)).unwrap();
    assert_ne!(a, b);
    assert_eq!(a.as_str(), "001");
    assert_eq!(b.as_str(), "002");
}

#[test]
fn reclaim_deletes_and_recreates_dead_owner_shard() {
    let dir = tempdir().unwrap();
    let probe = FakePidProbe::new();
    let a = claim(dir.path(), &req(100, 1000.0, &probe)).unwrap();

    probe.set(100, abus_core::Liveness::Dead);
    let last_heartbeat = read_last_heartbeat(&shard_db_path(dir.path(), &a), &req(999, 1000.1, &probe)).unwrap();
    assert_eq!(last_heartbeat, Some(0.0));
}
