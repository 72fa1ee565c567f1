use chrono::Utc;

use lens_client::DeliveryError;
use lenspeer_agent::outreach::OutreachAgent;
use lenspeer_agent::scorer::HeuristicModel;
use lenspeer_agent::testing::{candidate, test_config, MockSender, MockSource};
use lenspeer_common::ContactRecord;
use lenspeer_store::ContactStore;

async fn memory_store() -> ContactStore {
    ContactStore::connect("sqlite::memory:").await.unwrap()
}

fn agent(
    source: &MockSource,
    sender: &MockSender,
    store: &ContactStore,
    replay_all: bool,
) -> OutreachAgent {
    OutreachAgent::new(
        Box::new(source.clone()),
        Box::new(HeuristicModel),
        Box::new(sender.clone()),
        store.clone(),
        test_config(replay_all),
    )
}

#[tokio::test]
async fn new_profiles_are_persisted_messaged_and_replayed_by_priority() {
    // B is fetched first but A outranks it: 500 followers vs 5.
    let source = MockSource::new().then_ok(vec![
        candidate("b", 5, 80, 0),
        candidate("a", 500, 20, 2),
    ]);
    let sender = MockSender::new();
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, true)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(stats.candidates_fetched, 2);
    assert_eq!(stats.new_contacts, 2);
    assert_eq!(stats.replayed, 2);
    assert_eq!(stats.sends_delivered, 4);

    // New profiles are messaged in fetch order, then the replay pass walks
    // the store in priority order.
    assert_eq!(sender.attempted_ids(), ["b", "a", "a", "b"]);

    let ids: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.profile_id)
        .collect();
    assert_eq!(ids, ["a", "b"]);

    // The configured message text is what goes out.
    let (_, message) = &sender.attempts()[0];
    assert_eq!(message, "hello from the test suite");
}

#[tokio::test]
async fn contacted_profiles_are_not_messaged_again_across_restarts() {
    let store = memory_store().await;

    let source = MockSource::new().then_ok(vec![candidate("a", 100, 10, 1)]);
    let sender = MockSender::new();
    agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(sender.attempted_ids(), ["a"]);

    // A fresh agent over the same store sees the same candidate again.
    let source = MockSource::new().then_ok(vec![candidate("a", 100, 10, 1)]);
    let sender = MockSender::new();
    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(stats.new_contacts, 0);
    assert_eq!(stats.already_contacted, 1);
    assert!(sender.attempted_ids().is_empty(), "delivered profile must not be re-messaged");
}

#[tokio::test]
async fn fetch_succeeds_within_retry_bound() {
    let source = MockSource::new()
        .then_unavailable("connection refused")
        .then_unavailable("connection refused")
        .then_ok(vec![candidate("a", 100, 10, 0)]);
    let sender = MockSender::new();
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(source.calls(), 3);
    assert_eq!(stats.candidates_fetched, 1);
    assert_eq!(stats.new_contacts, 1);
}

#[tokio::test]
async fn exhausted_fetch_retries_skip_straight_to_sleep() {
    let source = MockSource::new()
        .then_unavailable("down")
        .then_unavailable("down")
        .then_unavailable("down");
    let sender = MockSender::new();
    let store = memory_store().await;

    // A stored undelivered profile exists, but a fully failed fetch ends the
    // cycle before replay.
    store
        .insert_if_absent(&ContactRecord::accept(candidate("x", 50, 5, 0), 0.4, Utc::now()))
        .await
        .unwrap();

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(source.calls(), 3);
    assert_eq!(stats.candidates_fetched, 0);
    assert_eq!(stats.sends_attempted, 0);
    assert!(sender.attempted_ids().is_empty());
}

#[tokio::test]
async fn malformed_responses_exhaust_retries_without_failing_the_cycle() {
    let source = MockSource::new()
        .then_malformed("missing data")
        .then_malformed("missing data")
        .then_malformed("missing data");
    let sender = MockSender::new();
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(stats.candidates_fetched, 0);
}

#[tokio::test]
async fn empty_fetch_still_replays_stored_undelivered_profiles() {
    let source = MockSource::new().then_ok(Vec::new());
    let sender = MockSender::new();
    let store = memory_store().await;

    store
        .insert_if_absent(&ContactRecord::accept(candidate("x", 50, 5, 0), 0.4, Utc::now()))
        .await
        .unwrap();

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(sender.attempted_ids(), ["x"]);
    assert_eq!(stats.replayed, 1);
    assert_eq!(stats.sends_delivered, 1);
    assert!(store.list_undelivered().await.unwrap().is_empty());
}

#[tokio::test]
async fn transient_send_failure_is_retried_by_replay_in_the_same_cycle() {
    let source = MockSource::new().then_ok(vec![candidate("a", 100, 10, 0)]);
    let sender = MockSender::new().fail_next(
        "a",
        DeliveryError::Transient("gateway timeout".to_string()),
    );
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    // First attempt fails in the new-contact phase; the record stays
    // undelivered, so the replay phase retries it.
    assert_eq!(sender.attempted_ids(), ["a", "a"]);
    assert_eq!(stats.sends_failed, 1);
    assert_eq!(stats.sends_delivered, 1);
    assert!(store.list_undelivered().await.unwrap().is_empty());
}

#[tokio::test]
async fn client_rejection_keeps_the_record_and_does_not_abort_the_cycle() {
    let source = MockSource::new().then_ok(vec![
        candidate("a", 100, 10, 0),
        candidate("b", 100, 10, 0),
    ]);
    let sender = MockSender::new()
        .fail_next(
            "a",
            DeliveryError::ClientRejected {
                status: 400,
                message: "bad request".to_string(),
            },
        )
        .fail_next(
            "a",
            DeliveryError::ClientRejected {
                status: 400,
                message: "bad request".to_string(),
            },
        );
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    // a fails in both phases but b is unaffected; a's record survives for
    // future cycles.
    assert_eq!(stats.new_contacts, 2);
    assert_eq!(sender.attempted_ids(), ["a", "b", "a"]);
    assert!(store.exists("a").await.unwrap());
    let undelivered: Vec<_> = store
        .list_undelivered()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.profile_id)
        .collect();
    assert_eq!(undelivered, ["a"]);
}

#[tokio::test]
async fn unauthorized_abandons_remaining_sends_for_the_cycle() {
    let source = MockSource::new().then_ok(vec![
        candidate("a", 100, 10, 0),
        candidate("b", 100, 10, 0),
    ]);
    let sender = MockSender::new().fail_next("a", DeliveryError::Unauthorized);
    let store = memory_store().await;

    let stats = agent(&source, &sender, &store, false)
        .run_cycle()
        .await
        .unwrap();

    // a was persisted before the credential failure surfaced; b was not
    // reached and stays a candidate for the next cycle.
    assert_eq!(sender.attempted_ids(), ["a"]);
    assert_eq!(stats.new_contacts, 1);
    assert_eq!(stats.sends_failed, 1);
    assert!(store.exists("a").await.unwrap());
    assert!(!store.exists("b").await.unwrap());
}
