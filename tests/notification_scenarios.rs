// End-to-end notification scenarios against the public API
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use notifly::notifications::{CenterConfig, NotificationCenter, NotiflyError, ObserverId};
use proptest::prelude::*;

fn center() -> Arc<NotificationCenter> {
    Arc::new(NotificationCenter::with_config(CenterConfig {
        worker_threads: 4,
        ..CenterConfig::default()
    }))
}

#[test]
fn test_sum_observer_receives_payload() {
    let center = center();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&calls);
    center
        .add_observer(1, move |a: i32, b: i32| -> i32 {
            seen.lock().unwrap().push((a, b));
            a + b
        })
        .unwrap();

    assert_eq!(center.post_notification(1, (5, 10)), Ok(1));
    assert_eq!(*calls.lock().unwrap(), vec![(5, 10)]);

    // string payload against an (i32, i32) topic
    let result = center.post_notification(1, ("hello",));
    assert!(matches!(result, Err(NotiflyError::PayloadTypeMismatch { .. })));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn test_unregistered_topic() {
    let center = center();
    assert_eq!(center.post_notification(42, ()), Err(NotiflyError::NotificationNotFound(42)));
}

#[test]
fn test_request_response_with_delayed_responder() {
    let center = center();
    let responder = Arc::downgrade(&center);

    center
        .add_observer(100, move |_: i32, _: i32| {
            let responder = responder.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                if let Some(center) = responder.upgrade() {
                    let _ = center.post_notification(101, (42, 100));
                }
            });
        })
        .unwrap();

    let result: (i32, i32) = center
        .post_and_wait(100, 101, Duration::from_millis(500), (1, 2))
        .unwrap();
    assert_eq!(result, (42, 100));
}

#[test]
fn test_request_response_timeout() {
    let center = center();
    center.add_observer(100, |_: i32, _: i32| {}).unwrap();

    let result = center.post_and_wait::<(i32, i32), (i32, i32)>(100, 101, Duration::from_millis(100), (1, 2));
    assert!(matches!(result, Err(NotiflyError::Timeout { topic: 101, duration_ms: 100 })));
    assert_eq!(result.unwrap_err().code(), -6);
}

#[test]
fn test_hundred_async_posts() {
    let center = center();
    let counter = Arc::new(AtomicUsize::new(0));

    let hits = Arc::clone(&counter);
    center
        .add_observer(7, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    for _ in 0..100 {
        center.post_notification_async(7, ()).unwrap();
    }
    center.wait_for_async_tasks();
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_concurrent_posters_and_registrations() {
    let center = center();
    let counter = Arc::new(AtomicUsize::new(0));

    let hits = Arc::clone(&counter);
    center
        .add_observer(1, move |_: usize| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let center = Arc::clone(&center);
            thread::spawn(move || {
                for i in 0..50usize {
                    center.post_notification_async(1, (i,)).unwrap();
                    center.post_notification(1, (i,)).unwrap();
                    // churn on a private topic while posts are in flight
                    let id = center.add_observer(1000 + worker, |_: u8| {}).unwrap();
                    center.remove_observer(id).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    center.wait_for_async_tasks();
    assert_eq!(counter.load(Ordering::SeqCst), 400);
}

#[test]
fn test_live_ids_never_collide_across_threads() {
    let center = center();
    let live = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let center = Arc::clone(&center);
            let live = Arc::clone(&live);
            thread::spawn(move || {
                for _ in 0..100 {
                    let id = center.add_observer(5, || {}).unwrap();
                    assert!(live.lock().unwrap().insert(id), "id {} issued twice", id);
                    // forget it before releasing so a reissue cannot race the check
                    live.lock().unwrap().remove(&id);
                    center.remove_observer(id).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(center.total_observers(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![(0..4i32).prop_map(Op::Add), (0..32usize).prop_map(Op::Remove)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ids_unique_among_live_observers(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let center = NotificationCenter::with_config(CenterConfig {
            worker_threads: 1,
            ..CenterConfig::default()
        });
        let mut live: Vec<ObserverId> = Vec::new();

        for op in ops {
            match op {
                Op::Add(topic) => {
                    let id = center.add_observer(topic, |_: u32| {}).unwrap();
                    prop_assert!(id.get() >= 1);
                    prop_assert!(!live.contains(&id));
                    live.push(id);
                }
                Op::Remove(index) if !live.is_empty() => {
                    let id = live.remove(index % live.len());
                    prop_assert_eq!(center.remove_observer(id), Ok(()));
                    prop_assert_eq!(center.remove_observer(id), Err(NotiflyError::ObserverNotFound(id)));
                }
                Op::Remove(_) => {}
            }
            prop_assert_eq!(center.total_observers(), live.len());
        }
    }
}
