//! Error handling and misuse-tolerance tests.
//!
//! The dispatcher favors idempotent silence: misuse is a no-op, pull
//! failures are absorbed, and nothing terminates the host.

use courier::{DispatchError, Dispatcher, DispatcherConfig, SubscriberId, UnmatchedPolicy};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_zero_interval_is_config_error() {
    let result = Dispatcher::new(DispatcherConfig {
        interval: Duration::ZERO,
        ..Default::default()
    });
    match result {
        Err(DispatchError::Config(msg)) => assert!(msg.contains("interval")),
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_pull_failure_is_absorbed_and_recovered() {
    let calls = Arc::new(Mutex::new(0usize));
    let counted = Arc::clone(&calls);
    let errors = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&errors);

    let dispatcher = Dispatcher::new(DispatcherConfig {
        pull: Some(Box::new(move |_| {
            let mut n = counted.lock();
            *n += 1;
            match *n {
                1 => Err(DispatchError::Pull("broker unreachable".to_string())),
                2 => Ok(Some(json!({"type": "a", "n": 42}))),
                _ => Ok(None),
            }
        })),
        on_pull_error: Some(Arc::new(move |e| observed.lock().push(e.to_string()))),
        ..Default::default()
    })
    .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let subscriber = dispatcher.create_subscriber();
    subscriber.subscribe("a", 1, move |m| sink.lock().push(m));

    // First check fails; the error reaches the hook and nothing panics
    dispatcher.check();
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].contains("broker unreachable"));
    assert!(received.lock().is_empty());

    // The source recovered; the next check delivers normally
    dispatcher.check();
    assert_eq!(received.lock().len(), 1);
    assert_eq!(received.lock()[0]["n"], 42);
}

#[test]
fn test_complete_on_idle_subscription_is_noop() {
    let dispatcher = Dispatcher::with_defaults();
    let subscriber = dispatcher.create_subscriber();
    let subscription = subscriber.subscribe("a", 2, |_| {});

    subscription.complete();
    subscription.complete();
    assert_eq!(dispatcher.subscriptions()[0].current, 0);
}

#[test]
fn test_complete_unknown_subscriber_is_noop() {
    let dispatcher = Dispatcher::with_defaults();
    dispatcher.complete(SubscriberId(999), "a");
    assert!(dispatcher.subscriptions().is_empty());
}

#[test]
fn test_unsubscribe_unknown_is_noop() {
    let dispatcher = Dispatcher::with_defaults();
    dispatcher.unsubscribe(SubscriberId(999), None);
    dispatcher.unsubscribe(SubscriberId(999), Some("a"));
    assert!(dispatcher.subscriptions().is_empty());
}

#[test]
fn test_double_stop_matches_single_stop() {
    let dispatcher = Dispatcher::new(DispatcherConfig {
        interval: Duration::from_millis(10),
        start: true,
        ..Default::default()
    })
    .unwrap();

    dispatcher.stop();
    let once = format!("{:?}", dispatcher);
    dispatcher.stop();
    assert_eq!(format!("{:?}", dispatcher), once);
}

#[test]
fn test_unsubscribe_in_flight_forfeits_completion() {
    let dispatcher = Dispatcher::with_defaults();
    let subscriber = dispatcher.create_subscriber();
    let subscription = subscriber.subscribe("a", 1, |_| {});

    dispatcher.push(json!({"type": "a"}));
    dispatcher.check();
    assert_eq!(dispatcher.subscriptions()[0].current, 1);

    // Removal while in flight drops the record and its counter together
    subscription.unsubscribe();
    assert!(dispatcher.subscriptions().is_empty());

    // The late completion has nothing to decrement and must not resurrect
    subscription.complete();
    assert!(dispatcher.subscriptions().is_empty());
}

#[test]
fn test_dead_letter_never_panics_dispatch() {
    let dead = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dead);
    let served = Arc::new(Mutex::new(VecDequeFeed::new(vec![
        json!({"type": "stray", "n": 1}),
        json!({"type": "a", "n": 2}),
    ])));
    let source = Arc::clone(&served);

    let dispatcher = Dispatcher::new(DispatcherConfig {
        pull: Some(Box::new(move |_| Ok(source.lock().next()))),
        unmatched: UnmatchedPolicy::DeadLetter(Arc::new(move |m| sink.lock().push(m))),
        ..Default::default()
    })
    .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&received);
    let subscriber = dispatcher.create_subscriber();
    subscriber.subscribe("a", 1, move |m| seen.lock().push(m));

    dispatcher.check();

    assert_eq!(dead.lock().len(), 1);
    assert_eq!(dead.lock()[0]["n"], 1);
    assert_eq!(received.lock().len(), 1);
    assert_eq!(received.lock()[0]["n"], 2);
}

struct VecDequeFeed {
    items: std::collections::VecDeque<courier::Message>,
}

impl VecDequeFeed {
    fn new(items: Vec<courier::Message>) -> Self {
        Self {
            items: items.into(),
        }
    }

    fn next(&mut self) -> Option<courier::Message> {
        self.items.pop_front()
    }
}
