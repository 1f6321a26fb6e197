// SPDX-License-Identifier: MIT

//! Deterministic pid probe for unit tests.

use super::{Liveness, PidProbe};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakePidProbe {
    liveness: Mutex<HashMap<u32, Liveness>>,
}

impl FakePidProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pid: u32, liveness: Liveness) {
        self.liveness.lock().insert(pid, liveness);
    }
}

impl PidProbe for FakePidProbe {
    fn check(&self, pid: u32) -> Liveness {
        self.liveness.lock().get(&pid).copied().unwrap_or(Liveness::Alive)
    }
}
