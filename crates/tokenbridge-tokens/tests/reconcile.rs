//! Startup reconciliation against an in-memory connector.

mod common;

use std::sync::atomic::Ordering;

use common::{streams, FakeConnector, INSTANCE, TOPIC};
use tokenbridge_core::Method;
use tokenbridge_tokens::{ReconcileOutcome, ReconciliationService};

fn service(fake: &std::sync::Arc<FakeConnector>) -> ReconciliationService {
    ReconciliationService::new(streams(fake), TOPIC, INSTANCE)
}

#[tokio::test]
async fn missing_event_kind_recreates_stream() {
    let fake = FakeConnector::new();
    fake.seed_stream("es-old", TOPIC);
    fake.seed_subscription("sb-1", "tok:base", "es-old");
    fake.seed_subscription("sb-2", "tok:F1:TokenCreate", "es-old");
    fake.seed_subscription("sb-3", "tok:F1:TransferSingle", "es-old");

    let outcome = service(&fake).run().await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Recreated);
    assert_eq!(fake.count(Method::Delete, "/eventstreams/es-old"), 1);

    let streams = fake.streams.lock().unwrap().clone();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["name"], TOPIC);
    assert_ne!(streams[0]["id"], "es-old");
    assert_eq!(fake.subscription_names(), vec!["tok:base".to_string()]);
}

#[tokio::test]
async fn base_only_is_left_untouched() {
    let fake = FakeConnector::new();
    fake.seed_stream("es-1", TOPIC);
    fake.seed_subscription("sb-1", "tok:base", "es-1");

    let outcome = service(&fake).run().await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::BaseOnly);
    assert_eq!(fake.count(Method::Delete, "/eventstreams/es-1"), 0);
    assert_eq!(fake.count(Method::Post, "/eventstreams"), 0);
}

#[tokio::test]
async fn complete_pool_subscriptions_are_consistent() {
    let fake = FakeConnector::new();
    fake.seed_stream("es-1", TOPIC);
    fake.seed_subscription("sb-1", "tok:base", "es-1");
    fake.seed_subscription("sb-2", "tok:F1:TokenCreate", "es-1");
    fake.seed_subscription("sb-3", "tok:F1:TransferSingle", "es-1");
    fake.seed_subscription("sb-4", "tok:F1:TransferBatch", "es-1");

    assert_eq!(service(&fake).run().await.unwrap(), ReconcileOutcome::Consistent);
    assert_eq!(fake.subscription_names().len(), 4);
}

#[tokio::test]
async fn nothing_to_reconcile() {
    let fake = FakeConnector::new();
    assert_eq!(service(&fake).run().await.unwrap(), ReconcileOutcome::NoStream);

    fake.seed_stream("es-1", TOPIC);
    // another stream's subscriptions do not count
    fake.seed_subscription("sb-9", "other:F1:TokenCreate", "es-9");
    assert_eq!(
        service(&fake).run().await.unwrap(),
        ReconcileOutcome::NoSubscriptions
    );
}

#[tokio::test]
async fn startup_swallows_failures() {
    let fake = FakeConnector::new();
    fake.reject_streams.store(true, Ordering::SeqCst);

    let svc = service(&fake);
    assert!(svc.run().await.unwrap_err().is_rejected());
    assert_eq!(svc.run_at_startup().await, None);
}
