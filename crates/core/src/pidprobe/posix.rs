// SPDX-License-Identifier: MIT

//! POSIX signal-0 liveness probe (spec §4.4):
//! `ESRCH` ("no such process") => dead; `EPERM` ("not permitted") => alive
//! (the process exists, we just can't signal it); anything else => alive.

use super::{Liveness, PidProbe};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

#[derive(Debug, Default, Clone, Copy)]
pub struct PosixPidProbe;

impl PidProbe for PosixPidProbe {
    fn check(&self, pid: u32) -> Liveness {
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => Liveness::Alive,
            Err(Errno::ESRCH) => Liveness::Dead,
            Err(Errno::EPERM) => Liveness::Alive,
            Err(_) => Liveness::Unknown,
        }
    }
}
