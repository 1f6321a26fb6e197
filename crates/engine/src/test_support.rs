// SPDX-License-Identifier: MIT

//! Shared fixtures for this crate's unit tests: an in-memory shared-store
//! `CoreContext` plus handles to its fake clock and pid probe.

use crate::context::CoreContext;
use abus_core::pidprobe::fake::FakePidProbe;
use abus_core::{BusConfig, Clock, FakeClock, PidProbe};
use abus_store::shared::SharedStore;
use abus_store::sharded::ShardedStore;
use abus_store::Store;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub fn shared_context() -> (CoreContext, Arc<FakeClock>, Arc<FakePidProbe>) {
    shared_context_with(BusConfig::default())
}

pub fn shared_context_with(config: BusConfig) -> (CoreContext, Arc<FakeClock>, Arc<FakePidProbe>) {
    let store = SharedStore::open(Path::new(":memory:"), Duration::from_secs(5)).unwrap();
    build_context(Arc::new(store), config)
}

/// A sharded-store context rooted at a fresh temp directory, kept alive for
/// the caller (the `TempDir` guard must outlive the context).
pub fn sharded_context_with(config: BusConfig) -> (CoreContext, Arc<FakeClock>, Arc<FakePidProbe>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = ShardedStore::open(dir.path().to_path_buf(), Duration::from_secs(5)).unwrap();
    let (ctx, clock, pid_probe) = build_context(Arc::new(store), config);
    (ctx, clock, pid_probe, dir)
}

fn build_context(store: Arc<dyn Store>, config: BusConfig) -> (CoreContext, Arc<FakeClock>, Arc<FakePidProbe>) {
    let clock = Arc::new(FakeClock::new(1_000_000.0));
    let pid_probe = Arc::new(FakePidProbe::new());
    let ctx = CoreContext::new(
        store,
        clock.clone() as Arc<dyn Clock>,
        pid_probe.clone() as Arc<dyn PidProbe>,
        config,
        "host".into(),
    );
    (ctx, clock, pid_probe)
}
