// SPDX-License-Identifier: MIT

//! Test-only harness binary: one process embodies one agent session,
//! driven over stdin by a line-oriented command protocol. Used by the
//! workspace-level integration tests (`tests/specs.rs`) to exercise the
//! bus across real, separate OS processes — this binary is not part of
//! any spec'd external interface.
//!
//! Each request line is `<tag> <VERB> [args...]`; `<tag>` is caller-chosen
//! and echoed back on the matching response line, `<tag> <response>`, with
//! embedded newlines escaped as literal `\n`. Dispatch runs on its own
//! task per request rather than serialized on the read loop, so a later
//! command (e.g. a cancelling `STATUS`) can reach the session while an
//! earlier long `RECV` is still blocked — exactly the concurrency spec
//! §4.6's cancellation path depends on.

use abus_core::config::BusConfig;
use abus_core::{SystemClock, SystemPidProbe};
use abus_engine::{delivery, receive, scheduler, session::Session, status, CoreContext};
use abus_store::Topology;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

fn topology_from_env() -> Topology {
    match std::env::var("ABUS_TOPOLOGY").as_deref() {
        Ok("sharded") => Topology::Sharded,
        _ => Topology::Shared,
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let root: PathBuf = std::env::var("ABUS_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".abus"));
    let config = BusConfig::from_env();
    let store = abus_store::open(topology_from_env(), &root, &config)?;

    let ctx = Arc::new(CoreContext::new(store, Arc::new(SystemClock), Arc::new(SystemPidProbe), config, hostname()));
    let cwd = std::env::current_dir()?.to_string_lossy().into_owned();
    let session = Arc::new(Session::claim(&ctx, cwd)?);

    let heartbeat = scheduler::spawn(ctx.clone(), session.clone());

    println!("READY {}", session.id);
    io::stdout().flush()?;

    tokio::select! {
        result = run_command_loop(ctx.clone(), session.clone()) => { result?; }
        _ = wait_for_termination() => {
            tracing::info!(id = %session.id, "terminating on signal");
        }
    }

    session.release(&ctx);
    heartbeat.stop().await;
    Ok(())
}

/// Resolves on SIGTERM or SIGINT (Unix) so `session.release()` runs
/// deterministically on signalled termination, not just on stdin EOF (spec
/// §4.3: "release on normal and signalled termination").
#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn run_command_loop(ctx: Arc<CoreContext>, session: Arc<Session>) -> anyhow::Result<()> {
    let stdout = Arc::new(AsyncMutex::new(io::stdout()));
    let mut inflight = Vec::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("QUIT") {
            break;
        }
        let Some((tag, rest)) = line.split_once(' ') else {
            continue;
        };

        let ctx = ctx.clone();
        let session = session.clone();
        let stdout = stdout.clone();
        let tag = tag.to_string();
        let rest = rest.to_string();
        inflight.push(tokio::spawn(async move {
            let response = tokio::task::spawn_blocking(move || dispatch(&ctx, &session, &rest))
                .await
                .unwrap_or_else(|e| format!("Error: worker task failed: {e}"));
            let mut out = stdout.lock().await;
            let _ = writeln!(out, "{tag} {}", escape(&response));
            let _ = out.flush();
        }));
    }

    for task in inflight {
        let _ = task.await;
    }
    Ok(())
}

fn dispatch(ctx: &CoreContext, session: &Session, rest: &str) -> String {
    let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
    match verb.to_ascii_uppercase().as_str() {
        "STATUS" => status::get_status(ctx, session),
        "SEND" => {
            let Some((to, content)) = args.split_once(' ') else {
                return "Error: usage SEND <to> <content>".to_string();
            };
            delivery::send(ctx, session, to, content).to_string()
        }
        "RECV" => {
            let wait_seconds = args.trim().parse::<f64>().unwrap_or(0.0);
            receive::recv(ctx, session, wait_seconds).to_string()
        }
        other => format!("Error: unknown command '{other}'"),
    }
}
