// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! abus-store: the durable, shared-filesystem backing for the agent
//! message bus, in its two permitted realizations (spec §2, §9).

pub mod conn;
pub mod error;
pub mod paths;
pub mod shared;
pub mod sharded;
pub mod store;

pub use error::StoreError;
pub use store::{ClaimRequest, Store};

use abus_core::BusConfig;
use std::path::Path;
use std::sync::Arc;

/// Which of the two permitted realizations (spec §2, §9) this process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Shared,
    Sharded,
}

/// Construct the `Store` for `topology`, rooted at `root`.
pub fn open(topology: Topology, root: &Path, config: &BusConfig) -> Result<Arc<dyn Store>, StoreError> {
    match topology {
        Topology::Shared => {
            let path = paths::shared_db_path(root);
            let store = shared::SharedStore::open(&path, config.store_busy_timeout)?;
            Ok(Arc::new(store))
        }
        Topology::Sharded => {
            let store = sharded::ShardedStore::open(root.to_path_buf(), config.store_busy_timeout)?;
            Ok(Arc::new(store))
        }
    }
}
