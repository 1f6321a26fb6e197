// SPDX-License-Identifier: MIT

//! Identifier types: the three-digit agent id and the message UUID.

use std::fmt;
use uuid::Uuid;

/// A claimed three-digit agent identity, `"001"`..`"999"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// The full claimable range, in ascending order — lowest id wins ties
    /// per spec §4.2, and the Leader is defined as `min(online_ids)`.
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 999;

    pub fn from_number(n: u16) -> Self {
        debug_assert!((Self::MIN..=Self::MAX).contains(&n));
        Self(format!("{n:03}"))
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u16 = s.parse().ok()?;
        if (Self::MIN..=Self::MAX).contains(&n) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_number(&self) -> u16 {
        self.0.parse().unwrap_or(0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A message's unique id (a UUID per spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MsgId(String);

impl MsgId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first eight hex characters, used as the human-visible short id
    /// returned by `send` (spec §4.5).
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a new random message id.
pub fn new_msg_id() -> MsgId {
    MsgId::from_string(Uuid::new_v4().to_string())
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
