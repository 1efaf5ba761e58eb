use super::*;
use std::time::Duration;

// =============================================================
// Synchronous access
// =============================================================

#[test]
fn get_returns_initial_value() {
    let value = Observable::new(3);
    assert_eq!(value.get(), 3);
}

#[test]
fn set_and_update_replace_value() {
    let value = Observable::new(vec![1]);
    value.set(vec![2]);
    assert!(value.update(|v| {
        v.push(3);
        true
    }));
    assert_eq!(value.get(), vec![2, 3]);
    assert_eq!(value.with(Vec::len), 2);
}

#[test]
fn default_uses_type_default() {
    let value: Observable<Option<String>> = Observable::default();
    assert_eq!(value.get(), None);
}

// =============================================================
// Subscriptions
// =============================================================

#[tokio::test]
async fn subscriber_sees_each_change() {
    let value = Observable::new(0);
    let mut sub = value.subscribe();
    assert_eq!(sub.current(), 0);

    value.set(1);
    assert_eq!(sub.changed().await, Some(1));
    value.update(|v| {
        *v += 1;
        true
    });
    assert_eq!(sub.changed().await, Some(2));
}

#[tokio::test]
async fn unchanged_update_does_not_notify() {
    let value = Observable::new(7);
    let mut sub = value.subscribe();
    assert!(!value.update(|_| false));
    let next = tokio::time::timeout(Duration::from_millis(50), sub.changed()).await;
    assert!(next.is_err());
}

#[tokio::test]
async fn projected_subscription_reads_one_field() {
    let value = Observable::new((1, "a"));
    let mut sub = value.subscribe_map(|pair| pair.1);
    assert_eq!(sub.current(), "a");
    value.set((2, "b"));
    assert_eq!(sub.changed().await, Some("b"));
}

#[tokio::test]
async fn subscriber_is_notified_even_for_equal_value() {
    let value = Observable::new(5);
    let mut sub = value.subscribe();
    value.set(5);
    let next = tokio::time::timeout(Duration::from_millis(100), sub.changed()).await;
    assert_eq!(next.unwrap(), Some(5));
}

#[tokio::test]
async fn subscribe_does_not_replay_current_value() {
    let value = Observable::new("a".to_owned());
    let mut sub = value.subscribe();
    let next = tokio::time::timeout(Duration::from_millis(50), sub.changed()).await;
    assert!(next.is_err());
}

#[test]
fn unsubscribe_detaches() {
    let value = Observable::new(0);
    let a = value.subscribe();
    let b = value.subscribe();
    assert_eq!(value.subscriber_count(), 2);
    a.unsubscribe();
    assert_eq!(value.subscriber_count(), 1);
    drop(b);
    assert_eq!(value.subscriber_count(), 0);
}

#[tokio::test]
async fn changed_returns_none_when_observable_dropped() {
    let value = Observable::new(0);
    let mut sub = value.subscribe();
    drop(value);
    assert_eq!(sub.changed().await, None);
}
