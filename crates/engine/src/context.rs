// SPDX-License-Identifier: MIT

//! `CoreContext`: the process-wide dependency bundle threaded through every
//! component below it, replacing the process-wide-singleton-with-lazy-init
//! pattern with an explicit construct-once-and-thread-through value.

use abus_core::{BusConfig, Clock, PidProbe};
use abus_store::Store;
use std::sync::Arc;

pub struct CoreContext {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub pid_probe: Arc<dyn PidProbe>,
    pub config: BusConfig,
    pub hostname: String,
}

impl CoreContext {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        pid_probe: Arc<dyn PidProbe>,
        config: BusConfig,
        hostname: String,
    ) -> Self {
        Self { store, clock, pid_probe, config, hostname }
    }

    pub fn now(&self) -> f64 {
        self.clock.now_secs()
    }
}
