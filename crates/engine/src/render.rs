// SPDX-License-Identifier: MIT

//! Roster rendering, spec §4.7: `Agent <id> @ <cwd-or-host> [<flags> | <state>]`,
//! this session first, then ascending id.

use abus_core::time_fmt::{clamp_elapsed, format_elapsed_secs};
use abus_core::{AgentId, Mode, Peer};

/// Render from `self_id`'s perspective — the only caller who gets `THIS`.
/// Used by the shared realization (always) and the sharded local-scan
/// fallback (spec §4.7: "falls back to a local scan if the Leader is
/// unresponsive").
pub fn render_roster(self_id: &AgentId, peers: &[Peer], now: f64) -> String {
    render(Some(self_id), peers, now)
}

/// Render with no `THIS` marking. Used for the sharded realization's
/// Leader-cached status-result: one render is shared by every requester
/// whose `status_request` flag the Leader observes in the same tick, so no
/// single requester's identity can be privileged (spec §4.4 step (d)).
pub fn render_roster_neutral(peers: &[Peer], now: f64) -> String {
    render(None, peers, now)
}

fn render(self_id: Option<&AgentId>, peers: &[Peer], now: f64) -> String {
    let mut ordered: Vec<&Peer> = Vec::with_capacity(peers.len());
    if let Some(id) = self_id {
        ordered.extend(peers.iter().filter(|p| &p.id == id));
    }
    let mut rest: Vec<&Peer> = peers
        .iter()
        .filter(|p| self_id != Some(&p.id))
        .collect();
    rest.sort_by(|a, b| a.id.cmp(&b.id));
    ordered.extend(rest);

    ordered
        .into_iter()
        .map(|p| render_line(self_id, p, now))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(self_id: Option<&AgentId>, peer: &Peer, now: f64) -> String {
    let location = if peer.cwd.is_empty() { peer.hostname.as_str() } else { peer.cwd.as_str() };
    let state = render_state(peer, now);
    if self_id == Some(&peer.id) {
        format!("Agent {} @ {} [THIS | {}]", peer.id, location, state)
    } else {
        format!("Agent {} @ {} [{}]", peer.id, location, state)
    }
}

fn render_state(peer: &Peer, now: f64) -> String {
    if peer.mode == Some(Mode::Waiting) {
        if let Some(recv_started) = peer.recv_started {
            let total = peer.recv_wait_seconds.unwrap_or(0.0);
            let elapsed = clamp_elapsed(now - recv_started, total);
            return format!(
                "\u{1F3A7} Waiting ({}s/{}s)",
                format_elapsed_secs(elapsed),
                format_elapsed_secs(total)
            );
        }
    }

    let since = peer.mode_since.or(peer.active_last_touch).unwrap_or(now);
    let elapsed = (now - since).max(0.0);
    if elapsed >= 1800.0 {
        "\u{2753} Working".to_string()
    } else {
        format!("\u{1F6E0} Working ({}s)", format_elapsed_secs(elapsed))
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
