mod common;

use common::Gate;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wydarzenia::fetch::controller::{FetchConfig, FetchController};
use wydarzenia::fetch::state::FetchState;

fn controller(stale_after: Duration) -> FetchController<u32> {
    FetchController::new(FetchConfig {
        stale_after,
        read_retries: 0,
        ..FetchConfig::default()
    })
}

/// Producer answering with the call number, after `gate` opens
fn counting_producer(
    calls: Arc<AtomicUsize>,
    gate: Arc<Gate>,
) -> impl Fn() -> BoxFuture<'static, Result<Vec<u32>, String>> + Send + Sync + 'static {
    move || {
        let call = calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        let gate = Arc::clone(&gate);

        async move {
            gate.pass().await;
            Ok(vec![call])
        }
        .boxed()
    }
}

#[test_log::test(tokio::test)]
async fn new_key_should_be_loading_until_read_settles() {
    let controller = controller(Duration::from_secs(60));
    let gate = Gate::closed();
    let calls = Arc::new(AtomicUsize::new(0));

    assert_eq!(controller.state("events"), FetchState::Idle);

    let fetch = controller.request("events", counting_producer(calls.clone(), gate.clone()));

    assert_eq!(
        controller.state("events"),
        FetchState::Loading { previous: None }
    );

    gate.open();
    let state = fetch.await;

    assert_eq!(state.data(), Some(&[1][..]));
    assert_eq!(controller.state("events"), state);
}

#[test_log::test(tokio::test)]
async fn empty_listing_should_settle_as_empty() {
    let controller = controller(Duration::from_secs(60));

    let state = controller
        .request("events", || async { Ok::<_, String>(Vec::<u32>::new()) })
        .await;

    assert_eq!(state, FetchState::Empty);
}

#[test_log::test(tokio::test)]
async fn missing_detail_should_settle_as_empty() {
    let controller = controller(Duration::from_secs(60));

    let state = controller
        .request("events/404", || async { Ok::<_, String>(None::<u32>) })
        .await;

    assert_eq!(state, FetchState::Empty);
}

#[test_log::test(tokio::test)]
async fn failed_read_should_settle_as_failed() {
    let controller = controller(Duration::from_secs(60));

    let state = controller
        .request("events", || async {
            Err::<Vec<u32>, _>("network down".to_string())
        })
        .await;

    assert_eq!(
        state,
        FetchState::Failed {
            reason: "network down".to_string()
        }
    );
}

#[test_log::test(tokio::test)]
async fn failed_key_should_be_read_again_on_next_request() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    let producer = {
        let calls = calls.clone();
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err("timeout".to_string())
                } else {
                    Ok(vec![7u32])
                }
            }
        }
    };

    let failed = controller.request("events", producer.clone()).await;
    let recovered = controller.request("events", producer).await;

    assert!(matches!(failed, FetchState::Failed { .. }));
    assert_eq!(recovered.data(), Some(&[7][..]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn concurrent_requests_for_same_key_should_share_one_read() {
    let controller = controller(Duration::from_secs(60));
    let gate = Gate::closed();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = controller.request("events", counting_producer(calls.clone(), gate.clone()));
    let second = controller.request("events", counting_producer(calls.clone(), gate.clone()));

    gate.open();
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn fresh_result_should_be_served_without_loading() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    let first = controller
        .request("events", counting_producer(calls.clone(), Gate::opened()))
        .await;
    let second = controller.request("events", counting_producer(calls.clone(), Gate::opened()));

    assert!(!controller.state("events").is_loading());
    assert_eq!(second.await, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn stale_result_should_revalidate_keeping_previous_data() {
    let controller = controller(Duration::ZERO);
    let calls = Arc::new(AtomicUsize::new(0));

    controller
        .request("events", counting_producer(calls.clone(), Gate::opened()))
        .await;

    let gate = Gate::closed();
    let fetch = controller.request("events", counting_producer(calls.clone(), gate.clone()));
    let loading = controller.state("events");

    assert!(loading.is_loading());
    assert_eq!(loading.data(), Some(&[1][..]));

    gate.open();

    assert_eq!(fetch.await.data(), Some(&[2][..]));
}

#[test_log::test(tokio::test)]
async fn revalidate_should_read_even_when_fresh() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    controller
        .request("events", counting_producer(calls.clone(), Gate::opened()))
        .await;

    let gate = Gate::closed();
    let fetch = controller.revalidate("events", counting_producer(calls.clone(), gate.clone()));

    assert_eq!(
        controller.state("events"),
        FetchState::Loading {
            previous: Some(Arc::from(vec![1u32]))
        }
    );

    gate.open();

    assert_eq!(fetch.await.data(), Some(&[2][..]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn invalidated_key_should_be_read_again() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    controller
        .request("events", counting_producer(calls.clone(), Gate::opened()))
        .await;
    controller.invalidate("events");

    let state = controller
        .request("events", counting_producer(calls.clone(), Gate::opened()))
        .await;

    assert_eq!(state.data(), Some(&[2][..]));
}

#[test_log::test(tokio::test)]
async fn keys_should_not_affect_each_other() {
    let controller = controller(Duration::from_secs(60));
    let first_gate = Gate::closed();
    let second_gate = Gate::closed();

    let first = controller.request("events/1", {
        let gate = first_gate.clone();
        move || {
            let gate = gate.clone();
            async move {
                gate.pass().await;
                Ok::<_, String>(Some(1u32))
            }
        }
    });
    let second = controller.request("events/2", {
        let gate = second_gate.clone();
        move || {
            let gate = gate.clone();
            async move {
                gate.pass().await;
                Ok::<_, String>(None::<u32>)
            }
        }
    });

    second_gate.open();

    assert_eq!(second.await, FetchState::Empty);
    assert!(controller.state("events/1").is_loading());

    first_gate.open();

    assert_eq!(first.await.data(), Some(&[1][..]));
    assert_eq!(controller.state("events/2"), FetchState::Empty);
}

#[test_log::test(tokio::test)]
async fn subscribers_should_see_every_transition() {
    let controller = controller(Duration::from_secs(60));
    let gate = Gate::closed();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut receiver = controller.subscribe("events");

    assert_eq!(*receiver.borrow_and_update(), FetchState::Idle);

    let fetch = controller.request("events", counting_producer(calls, gate.clone()));

    receiver.changed().await.unwrap();
    assert!(receiver.borrow_and_update().is_loading());

    gate.open();
    fetch.await;

    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update().data(), Some(&[1][..]));
}

#[test_log::test(tokio::test)]
async fn read_should_finish_when_caller_stops_waiting() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut receiver = controller.subscribe("events");

    drop(controller.request("events", counting_producer(calls, Gate::opened())));

    receiver
        .wait_for(|state| state.is_settled())
        .await
        .unwrap();

    assert_eq!(controller.state("events").data(), Some(&[1][..]));
}

#[test_log::test(tokio::test)]
async fn configured_retries_should_recover_from_transient_failure() {
    let controller = FetchController::<u32>::new(FetchConfig {
        stale_after: Duration::from_secs(60),
        read_retries: 2,
        ..FetchConfig::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    let state = controller
        .request("events", {
            let calls = calls.clone();
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err("connection reset".to_string())
                    } else {
                        Ok(vec![3u32])
                    }
                }
            }
        })
        .await;

    assert_eq!(state.data(), Some(&[3][..]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn without_retries_a_failed_read_should_be_tried_once() {
    let controller = controller(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    let state = controller
        .request("events", {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<Vec<u32>, _>("connection reset".to_string()) }
            }
        })
        .await;

    assert!(matches!(state, FetchState::Failed { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn idle_keys_past_retention_should_be_evicted() {
    let controller = FetchController::<u32>::new(FetchConfig {
        stale_after: Duration::ZERO,
        retained_keys: 2,
        ..FetchConfig::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    controller
        .request("events/1", counting_producer(calls.clone(), Gate::opened()))
        .await;
    controller
        .request("events/2", counting_producer(calls.clone(), Gate::opened()))
        .await;

    let watched = controller.subscribe("events/2");
    let gate = Gate::closed();
    let pending = controller.request("events/3", counting_producer(calls.clone(), gate.clone()));

    assert_eq!(controller.state("events/1"), FetchState::Idle);
    assert_eq!(controller.state("events/2").data(), Some(&[2][..]));

    let fourth = controller.request("events/4", counting_producer(calls.clone(), Gate::opened()));

    assert_eq!(
        controller.state("events/3"),
        FetchState::Loading { previous: None }
    );

    gate.open();

    assert!(matches!(pending.await, FetchState::Ready { .. }));
    assert!(matches!(fourth.await, FetchState::Ready { .. }));
    assert_eq!(watched.borrow().data(), Some(&[2][..]));
}
