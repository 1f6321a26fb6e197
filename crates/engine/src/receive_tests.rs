use super::*;
use crate::test_support::shared_context_with;
use abus_core::{AgentId, BusConfig, MessageState, MsgId};
use std::sync::Arc;
use std::thread;

fn fast_config() -> BusConfig {
    let mut config = BusConfig::default();
    config.recv_tick = std::time::Duration::from_millis(5);
    config.recv_db_poll_every = std::time::Duration::from_millis(1);
    config
}

#[test]
fn immediate_check_returns_messages_when_present() {
    let (ctx, _clock, _pid) = shared_context_with(fast_config());
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();
    ctx.store.publish(&a.id, &b.id, "hi", ctx.now()).unwrap();

    let outcome = recv(&ctx, &b, 0.0);
    match outcome {
        RecvOutcome::Messages(text) => assert!(text.contains("hi")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn immediate_check_reports_no_new_messages_when_empty() {
    let (ctx, _clock, _pid) = shared_context_with(fast_config());
    let session = Session::claim(&ctx, "/work".into()).unwrap();
    assert_eq!(recv(&ctx, &session, 0.0), RecvOutcome::NoNewMessages);
}

#[test]
fn message_published_during_wait_is_delivered() {
    let (ctx, clock, _pid) = shared_context_with(fast_config());
    let ctx = Arc::new(ctx);
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Arc::new(Session::claim(&ctx, "/work/b".into()).unwrap());

    let ctx2 = ctx.clone();
    let b2 = b.clone();
    let handle = thread::spawn(move || recv(&ctx2, &b2, 2.0));

    thread::sleep(std::time::Duration::from_millis(15));
    ctx.store.publish(&a.id, &b.id, "hi", ctx.now()).unwrap();
    clock.advance(std::time::Duration::from_millis(5));

    let outcome = handle.join().unwrap();
    match outcome {
        RecvOutcome::Messages(text) => assert!(text.contains("hi")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn timeout_fires_once_the_deadline_is_reached() {
    let (ctx, clock, _pid) = shared_context_with(fast_config());
    let ctx = Arc::new(ctx);
    let session = Arc::new(Session::claim(&ctx, "/work".into()).unwrap());

    let ctx2 = ctx.clone();
    let session2 = session.clone();
    let handle = thread::spawn(move || recv(&ctx2, &session2, 1.0));

    thread::sleep(std::time::Duration::from_millis(15));
    clock.advance(std::time::Duration::from_secs(2));

    let outcome = handle.join().unwrap();
    assert_eq!(outcome, RecvOutcome::Timeout { waited_secs: 1 });
}

#[test]
fn new_activity_on_the_same_session_cancels_the_wait() {
    let (ctx, _clock, _pid) = shared_context_with(fast_config());
    let ctx = Arc::new(ctx);
    let session = Arc::new(Session::claim(&ctx, "/work".into()).unwrap());

    let ctx2 = ctx.clone();
    let session2 = session.clone();
    let handle = thread::spawn(move || recv(&ctx2, &session2, 5.0));

    thread::sleep(std::time::Duration::from_millis(15));
    session.mark_active(ctx.now() + 1.0);

    let outcome = handle.join().unwrap();
    assert_eq!(outcome, RecvOutcome::Cancelled);
}

#[test]
fn a_lease_left_unacked_is_recoverable_after_ttl_via_a_later_lease_and_read() {
    let (ctx, clock, _pid) = shared_context_with(fast_config());
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();
    ctx.store.publish(&a.id, &b.id, "hi", ctx.now()).unwrap();

    let leased = try_lease_batch(&ctx, &b, ctx.now()).expect("leased");
    assert_eq!(leased[0].attempt, 1);
    // No ack follows — simulates a crash between lease and ack (spec §4.6
    // step 6). The message must still be there, not lost.
    assert!(try_lease_batch(&ctx, &b, ctx.now()).is_none(), "still held by the first lease");

    clock.advance(ctx.config.lease_ttl + std::time::Duration::from_secs(1));
    let redelivered = try_lease_batch(&ctx, &b, ctx.now()).expect("redelivered after lease expiry");
    assert_eq!(redelivered[0].attempt, 2);
    assert_eq!(redelivered[0].content, "hi");
}

#[test]
fn release_leases_makes_a_held_lease_immediately_available_again() {
    let (ctx, _clock, _pid) = shared_context_with(fast_config());
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();
    ctx.store.publish(&a.id, &b.id, "hi", ctx.now()).unwrap();

    let leased = try_lease_batch(&ctx, &b, ctx.now()).expect("leased");
    let msg_ids: Vec<_> = leased.iter().map(|m| m.msg_id.clone()).collect();
    assert!(try_lease_batch(&ctx, &b, ctx.now()).is_none(), "still held by the lease");

    // render_and_ack falls back to this on an ack error, rather than
    // leaving recovery to LEASE_TTL expiry (spec §4.6 step 6).
    ctx.store.release_leases(&b.id, &msg_ids).unwrap();

    let redelivered = try_lease_batch(&ctx, &b, ctx.now()).expect("released lease is immediately available again");
    assert_eq!(redelivered[0].content, "hi");
}

#[test]
fn render_batch_groups_by_sender_and_sorts_by_timestamp() {
    let from_a = AgentId::parse("001").unwrap();
    let from_b = AgentId::parse("002").unwrap();
    let to = AgentId::parse("003").unwrap();
    let msg = |from: &AgentId, ts: f64, content: &str| Message {
        msg_id: MsgId::from_string(format!("{ts}")),
        ts,
        ts_str: "12:00:00".to_string(),
        from: from.clone(),
        to: to.clone(),
        content: content.to_string(),
        state: MessageState::Queued,
        lease_owner: None,
        lease_until: None,
        attempt: 1,
        delivered_at: None,
    };
    let batch = vec![msg(&from_b, 2.0, "second-sender-first-msg"), msg(&from_a, 1.0, "first"), msg(&from_a, 3.0, "later")];

    let rendered = render_batch(&batch);
    let a_idx = rendered.find("[001]").unwrap();
    let b_idx = rendered.find("[002]").unwrap();
    assert!(a_idx < b_idx);
    assert!(rendered.find("first").unwrap() < rendered.find("later").unwrap());
}
