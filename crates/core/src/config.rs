// SPDX-License-Identifier: MIT

//! Recognized configuration knobs, per spec §6.
//!
//! Every field has the spec's default; each is overridable by an
//! environment variable so operators can tune a single host without a
//! config file, the same shape as the teacher's `XDG_STATE_HOME` override
//! for its state directory. A malformed env var falls back to the default
//! and logs a warning — it never panics at startup.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub heartbeat_interval: Duration,
    pub heartbeat_ttl: Duration,
    pub msg_ttl: Duration,
    pub lease_ttl: Duration,
    pub recv_tick: Duration,
    pub recv_db_poll_every: Duration,
    pub max_batch_chars: usize,
    pub send_wait: Duration,
    pub batch_size: usize,
    pub store_busy_timeout: Duration,
    /// Test-only seam: delay `recv`'s ack until after this much time has
    /// passed render-side, so integration tests can deterministically hit
    /// the lease-held-but-not-yet-acked window instead of racing a real
    /// process kill against an in-process critical section. Zero (the
    /// default) is a no-op.
    pub test_pre_ack_delay: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            heartbeat_ttl: Duration::from_secs(300),
            msg_ttl: Duration::from_secs(86_400),
            lease_ttl: Duration::from_secs(30),
            recv_tick: Duration::from_millis(400),
            recv_db_poll_every: Duration::from_secs(2),
            max_batch_chars: 5_000,
            send_wait: Duration::from_secs(2),
            batch_size: 50,
            store_busy_timeout: Duration::from_secs(5),
            test_pre_ack_delay: Duration::ZERO,
        }
    }
}

impl BusConfig {
    /// Build from the environment, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            heartbeat_interval: env_ms("ABUS_HEARTBEAT_INTERVAL_MS", base.heartbeat_interval),
            heartbeat_ttl: env_ms("ABUS_HEARTBEAT_TTL_MS", base.heartbeat_ttl),
            msg_ttl: env_ms("ABUS_MSG_TTL_MS", base.msg_ttl),
            lease_ttl: env_ms("ABUS_LEASE_TTL_MS", base.lease_ttl),
            recv_tick: env_ms("ABUS_RECV_TICK_MS", base.recv_tick),
            recv_db_poll_every: env_ms("ABUS_RECV_DB_POLL_MS", base.recv_db_poll_every),
            max_batch_chars: env_usize("ABUS_MAX_BATCH_CHARS", base.max_batch_chars),
            send_wait: env_ms("ABUS_SEND_WAIT_MS", base.send_wait),
            batch_size: env_usize("ABUS_BATCH_SIZE", base.batch_size),
            store_busy_timeout: base.store_busy_timeout,
            test_pre_ack_delay: env_ms("ABUS_TEST_PRE_ACK_DELAY_MS", base.test_pre_ack_delay),
        }
    }

    /// Heartbeat ticks between remote sweeps (§4.4: every 6 ticks ≈ 60s).
    pub fn remote_sweep_every_ticks(&self) -> u32 {
        6
    }

    /// Heartbeat ticks between store maintenance passes (§4.4: every 30
    /// ticks ≈ 300s).
    pub fn maintenance_every_ticks(&self) -> u32 {
        30
    }
}

fn env_ms(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "invalid duration env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "invalid integer env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
