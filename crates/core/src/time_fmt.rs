// SPDX-License-Identifier: MIT

//! Small time-formatting helpers shared by Status (spec §4.7) and Receive
//! (spec §4.6's `HH:MM:SS` per-message rendering).

use chrono::{Local, TimeZone};

/// Format a whole-seconds elapsed duration as `<N>s`, matching the Status
/// roster's `(<elapsed>s/<total>s)` / `(<elapsed>s)` shapes.
pub fn format_elapsed_secs(elapsed: f64) -> String {
    format!("{}", elapsed.max(0.0).floor() as i64)
}

/// Clamp `elapsed` into `[0, total]`, per spec §4.7's waiting-state render.
pub fn clamp_elapsed(elapsed: f64, total: f64) -> f64 {
    elapsed.max(0.0).min(total.max(0.0))
}

/// Render a wall-clock timestamp (seconds since epoch) as `HH:MM:SS` local
/// time, for the `ts_str` field and message-batch rendering (spec §3, §4.6).
pub fn format_ts_hms(ts_secs: f64) -> String {
    let secs = ts_secs.floor() as i64;
    let nanos = ((ts_secs - ts_secs.floor()) * 1e9) as u32;
    match Local.timestamp_opt(secs, nanos) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => "??:??:??".to_string(),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
