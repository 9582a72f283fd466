//! Load outcome event integration tests.
//!
//! Tests verify:
//! - Each dispatched load publishes exactly one event matching its outcome
//! - Events are published after the resolving call has returned
//! - Cache and volume hits publish nothing
//! - A subscriber that falls far behind still receives every outcome

use std::collections::HashMap;

use tokio::sync::mpsc::error::TryRecvError;

use image_loader::{ImageEvent, LoadError, LoadOptions};

use super::test_utils::{new_service, GatedLoader, MockVolume, RecordingLoader};

#[tokio::test]
async fn test_one_event_per_dispatch_matching_outcome() {
    let service = new_service();
    let mut events = service.subscribe();
    service
        .registry()
        .register_loader("ok", RecordingLoader::succeeding());
    service
        .registry()
        .register_loader("bad", RecordingLoader::failing("corrupt pixel data"));

    let ids = ["ok:1", "bad:1", "ok:2", "bad:2", "ok:3"];
    let mut outcomes = HashMap::new();
    for id in ids {
        let result = service
            .resolve_transient(id, &LoadOptions::default())
            .unwrap()
            .await;
        outcomes.insert(id.to_string(), result.is_ok());
    }

    let mut seen = HashMap::new();
    for _ in 0..ids.len() {
        let event = events.recv().await.unwrap();
        if let ImageEvent::ImageLoadFailed { error, .. } = &event {
            assert!(matches!(error, LoadError::Other(m) if m == "corrupt pixel data"));
        }
        *seen.entry(event.image_id().to_string()).or_insert(0) += 1;
        assert_eq!(outcomes[event.image_id()], !event.is_failure());
    }

    assert_eq!(seen.len(), ids.len());
    assert!(seen.values().all(|&count| count == 1));

    tokio::task::yield_now().await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_event_not_emitted_in_callers_frame() {
    let service = new_service();
    let mut events = service.subscribe();
    service
        .registry()
        .register_loader("mem", RecordingLoader::succeeding());

    // The load is already settled, but the event is published from a task
    let promise = service
        .resolve_and_cache("mem:a", &LoadOptions::default())
        .unwrap();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    promise.await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.image_id(), "mem:a");
}

#[tokio::test]
async fn test_pending_load_emits_on_settlement() {
    let service = new_service();
    let mut events = service.subscribe();
    let loader = GatedLoader::new();
    service.registry().register_loader("mem", loader.clone());

    let promise = service
        .resolve_transient("mem:slow", &LoadOptions::default())
        .unwrap();

    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    loader.release_all();
    let image = promise.await.unwrap();
    match events.recv().await.unwrap() {
        ImageEvent::ImageLoaded { image: published } => {
            assert_eq!(published.image_id, image.image_id);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_cache_and_volume_hits_are_silent() {
    let service = new_service();
    service
        .registry()
        .register_loader("mem", RecordingLoader::succeeding());
    service
        .cache()
        .put_volume(MockVolume::new("ct", &["mem:s0"], true));

    let mut events = service.subscribe();
    service
        .resolve_and_cache("mem:a", &LoadOptions::default())
        .unwrap()
        .await
        .unwrap();

    // The only dispatch
    assert_eq!(events.recv().await.unwrap().image_id(), "mem:a");

    service
        .resolve_transient("mem:a", &LoadOptions::default())
        .unwrap()
        .await
        .unwrap();
    service
        .resolve_transient("mem:s0", &LoadOptions::default())
        .unwrap()
        .await
        .unwrap();

    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_no_loader_publishes_nothing() {
    let service = new_service();
    let mut events = service.subscribe();

    assert!(service
        .resolve_transient("foo:bar", &LoadOptions::default())
        .is_err());

    tokio::task::yield_now().await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_backlogged_subscriber_receives_every_outcome() {
    let service = new_service();
    let mut events = service.subscribe();
    service
        .registry()
        .register_loader("ok", RecordingLoader::succeeding());
    service
        .registry()
        .register_loader("bad", RecordingLoader::failing("corrupt pixel data"));

    let ids: Vec<String> = (0..1200)
        .map(|i| if i % 3 == 0 { format!("bad:{i}") } else { format!("ok:{i}") })
        .collect();
    let promises = service.resolve_and_cache_many(&ids, &LoadOptions::default());
    for promise in promises {
        let _ = promise.unwrap().await;
    }

    let mut seen = HashMap::new();
    for _ in 0..ids.len() {
        let event = events.recv().await.unwrap();
        assert_eq!(event.is_failure(), event.image_id().starts_with("bad:"));
        *seen.entry(event.image_id().to_string()).or_insert(0) += 1;
    }

    assert_eq!(seen.len(), ids.len());
    assert!(seen.values().all(|&count| count == 1));
    tokio::task::yield_now().await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}
