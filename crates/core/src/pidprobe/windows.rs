// SPDX-License-Identifier: MIT

//! Windows liveness probe (spec §4.4): open the process with the
//! limited-query right and inspect its exit code. `STILL_ACTIVE` (259) =>
//! alive; `ERROR_ACCESS_DENIED` on open => alive; any other failure to open
//! => dead.

use super::{Liveness, PidProbe};
use windows_sys::Win32::Foundation::{CloseHandle, ERROR_ACCESS_DENIED, STILL_ACTIVE};
use windows_sys::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPidProbe;

impl PidProbe for WindowsPidProbe {
    fn check(&self, pid: u32) -> Liveness {
        // SAFETY: FFI calls into the Windows process-query API per their
        // documented contracts; the handle is closed on every path.
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                let err = windows_sys::Win32::Foundation::GetLastError();
                return if err == ERROR_ACCESS_DENIED { Liveness::Alive } else { Liveness::Dead };
            }
            let mut exit_code: u32 = 0;
            let ok = GetExitCodeProcess(handle, &mut exit_code);
            CloseHandle(handle);
            if ok == 0 {
                return Liveness::Unknown;
            }
            if exit_code == STILL_ACTIVE as u32 {
                Liveness::Alive
            } else {
                Liveness::Dead
            }
        }
    }
}
