// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! abus-core: shared types, clock, error, and pid-liveness abstractions for
//! the agent message bus.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod pidprobe;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::BusConfig;
pub use error::BusError;
pub use ids::{new_msg_id, AgentId, MsgId};
pub use model::{Mode, Peer, Message, MessageState};
pub use pidprobe::{Liveness, PidProbe, SystemPidProbe};
