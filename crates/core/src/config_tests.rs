use super::*;

#[test]
fn defaults_match_spec() {
    let cfg = BusConfig::default();
    assert_eq!(cfg.heartbeat_interval, Duration::from_secs(10));
    assert_eq!(cfg.heartbeat_ttl, Duration::from_secs(300));
    assert_eq!(cfg.msg_ttl, Duration::from_secs(86_400));
    assert_eq!(cfg.lease_ttl, Duration::from_secs(30));
    assert_eq!(cfg.max_batch_chars, 5_000);
    assert_eq!(cfg.send_wait, Duration::from_secs(2));
    assert_eq!(cfg.batch_size, 50);
}

#[test]
fn invalid_env_var_falls_back_to_default() {
    std::env::set_var("ABUS_LEASE_TTL_MS", "not-a-number");
    let cfg = BusConfig::from_env();
    std::env::remove_var("ABUS_LEASE_TTL_MS");
    assert_eq!(cfg.lease_ttl, Duration::from_secs(30));
}

#[test]
fn valid_env_var_overrides_default() {
    std::env::set_var("ABUS_BATCH_SIZE", "7");
    let cfg = BusConfig::from_env();
    std::env::remove_var("ABUS_BATCH_SIZE");
    assert_eq!(cfg.batch_size, 7);
}
