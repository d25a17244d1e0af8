// tests/merge_on_login_tests.rs
mod common;

use bookcart::store::{Fault, RemoteCall, RemoteOp};
use bookcart::{
  AccountId, CartError, CartEvent, CartSource, EngineConfig, ItemId, MergeLine, MergeOutcome, MergePolicy, SkipReason,
};
use common::*;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn test_login_submits_guest_cart_once_and_clears_it() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 2), (emma(), 1)]).await;
  assert!(store.calls().is_empty(), "guest mutations must stay local");

  let outcome = engine.sign_in(u1()).await.unwrap();

  assert!(matches!(outcome, MergeOutcome::Merged { lines: 2, .. }));
  assert_eq!(
    store.calls_for(RemoteOp::MergeCart),
    vec![RemoteCall::MergeCart(
      u1(),
      vec![MergeLine::new("dune", 2), MergeLine::new("emma", 1)]
    )]
  );
  assert!(engine.local_cart().is_empty());
  assert!(engine.merge_state().is_done());
  assert_eq!(store.quantity(&u1(), &ItemId::new("dune")), Some(2));
  assert_eq!(store.quantity(&u1(), &ItemId::new("emma")), Some(1));
}

#[tokio::test]
#[serial]
async fn test_failed_merge_keeps_guest_cart_and_rearms() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 2), (emma(), 1)]).await;
  store.fail_next(RemoteOp::MergeCart, Fault::Unavailable("gateway timeout".to_string()));

  let err = engine.sign_in(u1()).await.unwrap_err();

  assert!(matches!(err, CartError::Unavailable { .. }));
  assert_eq!(
    guest_quantities(&engine),
    vec![("dune".to_string(), 2), ("emma".to_string(), 1)]
  );
  assert!(engine.merge_state().is_idle());
  assert_eq!(merge_calls(&store), 1);

  // The next qualifying state change retries exactly once.
  let outcome = engine.reconcile().await.unwrap();
  assert!(matches!(outcome, MergeOutcome::Merged { lines: 2, .. }));
  assert_eq!(merge_calls(&store), 2);
  assert!(engine.local_cart().is_empty());
}

#[tokio::test]
#[serial]
async fn test_no_second_merge_after_success() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 1)]).await;

  engine.sign_in(u1()).await.unwrap();
  let again = engine.sign_in(u1()).await.unwrap();
  let rerender = engine.reconcile().await.unwrap();

  assert_eq!(again, MergeOutcome::Skipped(SkipReason::AlreadyMerged));
  assert_eq!(rerender, MergeOutcome::Skipped(SkipReason::AlreadyMerged));
  assert_eq!(merge_calls(&store), 1);
}

#[tokio::test]
#[serial]
async fn test_empty_guest_cart_is_not_submitted() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);

  let outcome = engine.sign_in(u1()).await.unwrap();

  assert_eq!(outcome, MergeOutcome::Skipped(SkipReason::EmptyLocalCart));
  assert_eq!(merge_calls(&store), 0);
  assert!(engine.merge_state().is_idle());
}

#[tokio::test]
#[serial]
async fn test_guest_reconcile_is_skipped() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(emma(), 1)]).await;

  assert_eq!(
    engine.reconcile().await.unwrap(),
    MergeOutcome::Skipped(SkipReason::Guest)
  );
  assert_eq!(merge_calls(&store), 0);
}

#[tokio::test]
#[serial]
async fn test_concurrent_reconcile_submits_at_most_once() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  store.set_latency(Duration::from_millis(40));
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 2)]).await;

  let (first, second, third) = tokio::join!(engine.sign_in(u1()), engine.reconcile(), engine.reconcile());

  assert!(matches!(first.unwrap(), MergeOutcome::Merged { .. }));
  assert_eq!(second.unwrap(), MergeOutcome::Skipped(SkipReason::InFlight));
  assert_eq!(third.unwrap(), MergeOutcome::Skipped(SkipReason::InFlight));
  assert_eq!(merge_calls(&store), 1);
}

#[tokio::test]
#[serial]
async fn test_partial_merge_preserves_whole_guest_cart() {
  setup_tracing();
  let store = new_store(MergePolicy::Idempotent);
  let engine = new_engine(&store);
  // Known to the storefront's catalog but not to the account store yet.
  let pulped = book("pulped", 4);
  fill_guest_cart(&engine, &[(dune(), 2), (pulped.clone(), 1)]).await;

  let err = engine.sign_in(u1()).await.unwrap_err();

  match err {
    CartError::PartialMergeFailure { rejected } => assert_eq!(rejected, vec![ItemId::new("pulped")]),
    other => panic!("Expected PartialMergeFailure, got {:?}", other),
  }
  assert_eq!(
    guest_quantities(&engine),
    vec![("dune".to_string(), 2), ("pulped".to_string(), 1)]
  );
  assert!(engine.merge_state().is_idle());

  // The retry resubmits the complete original batch.
  store.upsert_item(pulped);
  store.clear_calls();
  engine.reconcile().await.unwrap();
  assert_eq!(
    store.calls_for(RemoteOp::MergeCart),
    vec![RemoteCall::MergeCart(
      u1(),
      vec![MergeLine::new("dune", 2), MergeLine::new("pulped", 1)]
    )]
  );
  // Idempotent store: the line applied by the first attempt is not doubled.
  assert_eq!(store.quantity(&u1(), &ItemId::new("dune")), Some(2));
  assert_eq!(store.quantity(&u1(), &ItemId::new("pulped")), Some(1));
}

#[tokio::test]
#[serial]
async fn test_additive_store_doubles_partially_applied_line_on_retry() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  let pulped = book("pulped", 4);
  fill_guest_cart(&engine, &[(dune(), 2), (pulped.clone(), 1)]).await;

  assert!(engine.sign_in(u1()).await.is_err());
  store.upsert_item(pulped);
  engine.reconcile().await.unwrap();

  // The engine guarantees one attempt in flight, not exactly-once delivery.
  // Remote quantity is at least the guest quantity; an additive store adds again.
  assert_eq!(store.quantity(&u1(), &ItemId::new("dune")), Some(4));
}

#[tokio::test]
#[serial]
async fn test_merge_adds_to_existing_account_lines() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  store.seed_cart(&u1(), [MergeLine::new("dune", 1), MergeLine::new("ulysses", 1)]);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 2)]).await;

  engine.sign_in(u1()).await.unwrap();

  let view = engine.view().await.unwrap();
  assert_eq!(view.source, CartSource::Account(u1()));
  assert_eq!(view.line(&ItemId::new("dune")).map(|l| l.quantity), Some(3));
  assert_eq!(view.line(&ItemId::new("ulysses")).map(|l| l.quantity), Some(1));
}

#[tokio::test]
#[serial]
async fn test_sign_out_during_merge_supersedes_attempt() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  store.set_latency(Duration::from_millis(40));
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(emma(), 1)]).await;

  let (outcome, ()) = tokio::join!(engine.sign_in(u1()), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.sign_out();
  });

  assert!(matches!(outcome.unwrap(), MergeOutcome::Superseded { .. }));
  assert_eq!(engine.active_source(), CartSource::Guest);
  assert_eq!(guest_quantities(&engine), vec![("emma".to_string(), 1)]);
  assert!(engine.merge_state().is_idle());
}

#[tokio::test]
#[serial]
async fn test_new_identity_gets_its_own_merge() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 1)]).await;
  engine.sign_in(u1()).await.unwrap();

  engine.sign_out();
  fill_guest_cart(&engine, &[(emma(), 2)]).await;
  let u2 = AccountId::new("u2");
  let outcome = engine.sign_in(u2.clone()).await.unwrap();

  assert!(matches!(outcome, MergeOutcome::Merged { lines: 1, .. }));
  assert_eq!(store.quantity(&u2, &ItemId::new("emma")), Some(2));
  assert_eq!(store.quantity(&u1(), &ItemId::new("emma")), None);
  assert_eq!(merge_calls(&store), 2);
}

#[tokio::test]
#[serial]
async fn test_failed_merge_leaves_guest_lines_visible_as_pending() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 2)]).await;
  store.fail_next(RemoteOp::MergeCart, Fault::Rejected("cart locked".to_string()));

  let err = engine.sign_in(u1()).await.unwrap_err();

  assert!(matches!(err, CartError::Rejected { .. }));
  assert!(!err.is_retryable());
  assert_eq!(engine.active_source(), CartSource::Account(u1()));
  let pending = engine.pending_guest_lines();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].quantity, 2);
}

#[tokio::test]
#[serial]
async fn test_merge_events_are_broadcast() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine(&store);
  fill_guest_cart(&engine, &[(dune(), 1)]).await;
  let mut rx = engine.subscribe();

  store.fail_next(RemoteOp::MergeCart, Fault::Unavailable("offline".to_string()));
  let _ = engine.sign_in(u1()).await;
  engine.reconcile().await.unwrap();

  let events = drain_events(&mut rx);
  assert_eq!(events[0], CartEvent::SourceChanged(CartSource::Account(u1())));
  assert!(matches!(events[1], CartEvent::MergeStarted { lines: 1, .. }));
  assert!(matches!(events[2], CartEvent::MergeFailed { retryable: true, .. }));
  assert!(matches!(events[3], CartEvent::MergeStarted { .. }));
  assert!(matches!(events[4], CartEvent::MergeSucceeded { lines: 1, .. }));
  assert_eq!(events[5], CartEvent::RefreshRequested(u1()));
  assert_eq!(events.len(), 6);
}

#[tokio::test]
#[serial]
async fn test_refresh_hint_can_be_disabled() {
  setup_tracing();
  let store = new_store(MergePolicy::Additive);
  let engine = new_engine_with(
    &store,
    EngineConfig {
      refresh_after_merge: false,
      ..Default::default()
    },
  );
  fill_guest_cart(&engine, &[(dune(), 1)]).await;
  let mut rx = engine.subscribe();

  engine.sign_in(u1()).await.unwrap();

  let events = drain_events(&mut rx);
  assert!(!events.iter().any(|e| matches!(e, CartEvent::RefreshRequested(_))));
}
