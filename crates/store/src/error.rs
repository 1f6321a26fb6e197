// SPDX-License-Identifier: MIT

use abus_core::BusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store busy: {0}")]
    Busy(String),

    #[error("identity pool exhausted")]
    PoolExhausted,

    #[error("could not determine a writable store root directory")]
    NoRootDir,
}

impl StoreError {
    pub fn is_busy(&self) -> bool {
        match self {
            StoreError::Busy(_) => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
            }
            _ => false,
        }
    }
}

impl From<StoreError> for BusError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PoolExhausted => BusError::PoolExhausted,
            StoreError::Busy(msg) => BusError::StoreBusy(msg),
            other if other.is_busy() => BusError::StoreBusy(other.to_string()),
            other => BusError::Store(other.to_string()),
        }
    }
}
