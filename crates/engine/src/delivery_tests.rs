use super::*;
use crate::session::Session;
use crate::test_support::shared_context;

#[test]
fn send_to_all_with_no_peers_reports_no_peers() {
    let (ctx, _clock, _pid) = shared_context();
    let session = Session::claim(&ctx, "/work".into()).unwrap();
    let outcome = send(&ctx, &session, "all", "hi");
    assert_eq!(outcome, SendOutcome::NoPeers);
}

#[test]
fn send_with_empty_content_is_rejected_before_publishing() {
    let (ctx, _clock, _pid) = shared_context();
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();

    let outcome = send(&ctx, &a, b.id.as_str(), "");
    assert_eq!(outcome, SendOutcome::EmptyContent);

    let batch = ctx.store.lease_and_read(&b.id, ctx.now(), 30.0, 5000).unwrap();
    assert!(batch.is_empty(), "empty-content send must never write a message");
}

#[test]
fn send_to_self_is_rejected() {
    let (ctx, _clock, _pid) = shared_context();
    let session = Session::claim(&ctx, "/work".into()).unwrap();
    let outcome = send(&ctx, &session, session.id.as_str(), "hi");
    assert_eq!(outcome, SendOutcome::CannotSendToSelf);
}

#[test]
fn send_to_unknown_agent_reports_offline() {
    let (ctx, _clock, _pid) = shared_context();
    let session = Session::claim(&ctx, "/work".into()).unwrap();
    let outcome = send(&ctx, &session, "999", "hi");
    assert_eq!(outcome, SendOutcome::RecipientOffline("999".to_string()));
}

#[test]
fn send_to_one_online_peer_succeeds() {
    let (ctx, _clock, _pid) = shared_context();
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();

    let outcome = send(&ctx, &a, b.id.as_str(), "hi");
    match outcome {
        SendOutcome::Sent { count, .. } => assert_eq!(count, 1),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let batch = ctx.store.lease_and_read(&b.id, ctx.now(), 30.0, 5000).unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].content, "hi");
}

#[test]
fn send_to_all_fans_out_to_every_other_online_peer() {
    let (ctx, _clock, _pid) = shared_context();
    let a = Session::claim(&ctx, "/work/a".into()).unwrap();
    let b = Session::claim(&ctx, "/work/b".into()).unwrap();
    let c = Session::claim(&ctx, "/work/c".into()).unwrap();

    let outcome = send(&ctx, &a, "all", "hi");
    match outcome {
        SendOutcome::Sent { count, .. } => assert_eq!(count, 2),
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(ctx.store.lease_and_read(&b.id, ctx.now(), 30.0, 5000).unwrap().len(), 1);
    assert_eq!(ctx.store.lease_and_read(&c.id, ctx.now(), 30.0, 5000).unwrap().len(), 1);
}
