use super::*;
use crate::session::Session;
use crate::test_support::{sharded_context_with, shared_context};
use abus_core::BusConfig;
use std::sync::Arc;
use std::thread;

#[test]
fn shared_realization_renders_local_roster_directly() {
    let (ctx, _clock, _pid) = shared_context();
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();

    let rendered = get_status(&ctx, &a);
    assert!(rendered.contains(&format!("Agent {} @", a.id)));
    assert!(rendered.contains("THIS"));
    assert!(rendered.contains(&format!("Agent {} @", b.id)));
}

#[test]
fn sharded_realization_falls_back_to_local_scan_when_leader_is_unresponsive() {
    let (ctx, clock, _pid, _dir) = sharded_context_with(BusConfig::default());
    let ctx = Arc::new(ctx);
    let session = Arc::new(Session::claim(&ctx, "/work".into()).unwrap());

    let ctx2 = ctx.clone();
    let session2 = session.clone();
    let handle = thread::spawn(move || get_status(&ctx2, &session2));

    // No Leader ever fulfills the request; the poll must time out after 3s
    // and fall back to a local scan instead of hanging.
    thread::sleep(std::time::Duration::from_millis(20));
    clock.advance(std::time::Duration::from_secs(4));

    let rendered = handle.join().unwrap();
    assert!(rendered.contains(&format!("Agent {} @", session.id)));
    assert!(rendered.contains("THIS"));
}
