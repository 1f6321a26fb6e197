// SPDX-License-Identifier: MIT

//! Error taxonomy, per spec §7.
//!
//! Foreground operations never surface this enum directly to an external
//! caller — they render it into one of the short diagnostic strings defined
//! in spec §6 (`DB Error: <reason>`, `Error: Agent '<id>' offline.`, …).
//! Background tasks (heartbeat, janitor, reconciler) log this and keep
//! running; it is never their job to crash the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("recipient specification is empty or malformed: {0}")]
    InvalidRecipient(String),

    #[error("cannot send to self")]
    SelfAddress,

    #[error("message content is empty")]
    EmptyContent,

    #[error("agent '{0}' offline")]
    RecipientOffline(String),

    #[error("no other agents online")]
    NoPeers,

    #[error("identity pool exhausted (999/999 ids in use)")]
    PoolExhausted,

    #[error("store busy: {0}")]
    StoreBusy(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),
}

impl BusError {
    /// Is this a transient condition worth retrying at a higher level?
    pub fn is_transient(&self) -> bool {
        matches!(self, BusError::StoreBusy(_))
    }
}
