use tokio_util::sync::CancellationToken;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::eventually;
use crate::test_utils::instance;
use crate::test_utils::versioned;
use crate::test_utils::FakeEventSource;
use crate::Error;
use crate::InstancePhase;
use crate::WatchError;

#[tokio::test]
async fn pre_cancelled_token_never_subscribes() {
    enable_logger();
    let mut subscription = MockEventSubscription::new();
    subscription.expect_subscribe().times(0);
    let token = CancellationToken::new();
    token.cancel();

    let mut driver = SubscriptionDriver::start("w".into(), &subscription, token);

    assert!(!driver.is_subscribed());
    assert!(driver.next().await.is_none());
}

#[tokio::test]
async fn updates_arrive_in_callback_order() {
    let source = FakeEventSource::new();
    let mut driver = SubscriptionDriver::start("w".into(), &source, CancellationToken::new());
    assert!(driver.is_subscribed());

    for version in 1..=3 {
        source.emit(versioned("w1", InstancePhase::Running, version));
    }

    for version in 1..=3 {
        let update = driver.next().await.unwrap().unwrap();
        assert_eq!(update.status.version, version);
    }
}

#[tokio::test]
async fn refused_registration_is_the_terminal_error() {
    let source = FakeEventSource::refusing("listener limit");

    let mut driver = SubscriptionDriver::start("w".into(), &source, CancellationToken::new());

    assert!(!driver.is_subscribed());
    match driver.next().await {
        Some(Err(Error::Watch(WatchError::Registration(reason)))) => {
            assert_eq!(reason, "listener limit")
        }
        other => panic!("expected registration failure, got {other:?}"),
    }
    assert!(driver.next().await.is_none());
    assert_eq!(source.dispose_count(), 0);
}

#[tokio::test]
async fn cancellation_disposes_exactly_once() {
    let source = FakeEventSource::new();
    let token = CancellationToken::new();
    let mut driver = SubscriptionDriver::start("w".into(), &source, token.clone());

    token.cancel();
    token.cancel();
    eventually(|| source.dispose_count() == 1).await;

    assert!(driver.next().await.is_none());
    assert!(driver.next().await.is_none());
    drop(driver);

    assert_eq!(source.subscribe_count(), 1);
    assert_eq!(source.dispose_count(), 1);
}

#[tokio::test]
async fn cancellation_wakes_a_pending_pull() {
    let source = FakeEventSource::new();
    let token = CancellationToken::new();
    let mut driver = SubscriptionDriver::start("w".into(), &source, token.clone());

    let pending = tokio::spawn(async move { driver.next().await.is_none() });
    tokio::task::yield_now().await;
    token.cancel();

    assert!(pending.await.unwrap());
    assert_eq!(source.dispose_count(), 1);
}

#[tokio::test]
async fn updates_after_cancellation_are_not_delivered() {
    let source = FakeEventSource::new();
    let token = CancellationToken::new();
    let mut driver = SubscriptionDriver::start("w".into(), &source, token.clone());
    source.emit(instance("w1", InstancePhase::Running));

    token.cancel();
    eventually(|| source.dispose_count() == 1).await;

    assert_eq!(source.emit(instance("w1", InstancePhase::Stopping)), 0);
    assert!(driver.next().await.is_none());
}

#[tokio::test]
async fn source_failure_disposes_before_the_error_is_returned() {
    let source = FakeEventSource::new();
    let mut driver = SubscriptionDriver::start("w".into(), &source, CancellationToken::new());

    source.fail("feed lost");

    let item = driver.next().await;
    assert_eq!(source.dispose_count(), 1);
    assert!(matches!(item, Some(Err(Error::Watch(WatchError::Source(_))))));
    assert!(driver.next().await.is_none());

    drop(driver);
    assert_eq!(source.dispose_count(), 1);
}

#[tokio::test]
async fn dropping_the_driver_disposes() {
    let source = FakeEventSource::new();
    let token = CancellationToken::new();
    let driver = SubscriptionDriver::start("w".into(), &source, token.clone());

    drop(driver);
    assert_eq!(source.dispose_count(), 1);

    // The reaction task is retired; a later cancel must not dispose again.
    token.cancel();
    tokio::task::yield_now().await;
    assert_eq!(source.dispose_count(), 1);
}
