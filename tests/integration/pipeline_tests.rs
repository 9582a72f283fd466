//! Resolution pipeline integration tests.
//!
//! Tests verify:
//! - The load cache is consulted before volumes and loaders
//! - Loaded volumes serve slices without touching the registry
//! - Only persisting resolves populate the cache
//! - Concurrent transient resolves are not deduplicated

use std::sync::Arc;

use image_loader::{
    CacheFacade, ImageVolume, LoadObject, LoadOptions, RequestType, SliceGeometry,
};

use super::test_utils::{new_service, tiny_image, GatedLoader, MockVolume, RecordingLoader};

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_wadouri_resolve_and_cache_scenario() {
    let service = new_service();
    let mut events = service.subscribe();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("wadouri", loader.clone());

    let first = service
        .resolve_and_cache("wadouri:a.dcm", &LoadOptions::default())
        .unwrap();
    let image = first.clone().await.unwrap();
    assert_eq!(image.image_id, "wadouri:a.dcm");

    assert_eq!(
        loader.calls(),
        vec![("wadouri:a.dcm".to_string(), LoadOptions::default())]
    );

    let event = events.recv().await.unwrap();
    assert!(!event.is_failure());
    assert_eq!(event.image_id(), "wadouri:a.dcm");

    let second = service
        .resolve_and_cache("wadouri:a.dcm", &LoadOptions::default())
        .unwrap();
    assert!(second.ptr_eq(&first));
    assert_eq!(loader.call_count(), 1);

    tokio::task::yield_now().await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_options_passed_to_loader() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());

    let options = LoadOptions::for_request(RequestType::Prefetch)
        .with_priority(3)
        .with_detail("frame", 1);
    service
        .resolve_transient("mem:a", &options)
        .unwrap()
        .await
        .unwrap();

    assert_eq!(loader.calls(), vec![("mem:a".to_string(), options)]);
}

// =============================================================================
// Cache Hits
// =============================================================================

#[tokio::test]
async fn test_cached_load_object_invokes_no_loader() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());

    let cached = LoadObject::loaded(tiny_image("mem:a"));
    service.cache().put_load_object("mem:a", cached.clone());

    let promise = service
        .resolve_transient("mem:a", &LoadOptions::default())
        .unwrap();
    assert!(cached.is_same_promise(&promise));
    assert_eq!(loader.call_count(), 0);
}

#[tokio::test]
async fn test_cache_hit_preferred_over_volume() {
    let service = new_service();
    let volume = MockVolume::new("ct", &["mem:s0"], true);
    service.cache().put_volume(volume.clone());

    let cached = LoadObject::loaded(tiny_image("mem:s0"));
    service.cache().put_load_object("mem:s0", cached.clone());

    let promise = service
        .resolve_and_cache("mem:s0", &LoadOptions::default())
        .unwrap();
    assert!(cached.is_same_promise(&promise));
    assert_eq!(volume.conversions(), 0);
}

#[tokio::test]
async fn test_cached_rejection_is_returned_as_is() {
    let service = new_service();
    let loader = RecordingLoader::failing("transfer syntax not supported");
    service.registry().register_loader("mem", loader.clone());

    let first = service
        .resolve_and_cache("mem:bad", &LoadOptions::default())
        .unwrap();
    assert!(first.clone().await.is_err());

    let second = service
        .resolve_and_cache("mem:bad", &LoadOptions::default())
        .unwrap();
    assert!(second.ptr_eq(&first));
    assert!(second.await.is_err());
    assert_eq!(loader.call_count(), 1);
}

// =============================================================================
// Volumes
// =============================================================================

#[tokio::test]
async fn test_loaded_volume_never_reaches_registry() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());
    let volume = MockVolume::new("ct", &["mem:s0", "mem:s1", "mem:s2"], true);
    service.cache().put_volume(volume.clone());

    let image = service
        .resolve_transient("mem:s2", &LoadOptions::default())
        .unwrap()
        .await
        .unwrap();

    assert_eq!(&image.pixel_data[..], &[2]);
    assert_eq!(volume.conversions(), 1);
    assert_eq!(loader.call_count(), 0);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn test_unloaded_volume_is_skipped() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());
    let volume = MockVolume::new("ct", &["mem:s0"], false);
    service.cache().put_volume(volume.clone());

    service
        .resolve_and_cache("mem:s0", &LoadOptions::default())
        .unwrap()
        .await
        .unwrap();

    assert_eq!(volume.conversions(), 0);
    assert_eq!(loader.call_count(), 1);
}

#[tokio::test]
async fn test_volume_slice_cached_after_resolve_and_cache() {
    let service = new_service();
    let volume = Arc::new(ImageVolume::new(
        "mr",
        vec!["mem:m0".into(), "mem:m1".into()],
        SliceGeometry {
            rows: 1,
            columns: 3,
            bits_allocated: 8,
            samples_per_pixel: 1,
        },
    ));
    volume.write_slice(0, &[1, 2, 3]).unwrap();
    volume.set_loaded(true);
    service.cache().put_volume(volume);

    let first = service
        .resolve_and_cache("mem:m0", &LoadOptions::default())
        .unwrap();
    let second = service
        .resolve_transient("mem:m0", &LoadOptions::default())
        .unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(&first.await.unwrap().pixel_data[..], &[1, 2, 3]);
}

// =============================================================================
// Persistence and Concurrency
// =============================================================================

#[tokio::test]
async fn test_transient_never_populates_cache() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());

    for _ in 0..3 {
        service
            .resolve_transient("mem:probe", &LoadOptions::default())
            .unwrap()
            .await
            .unwrap();
    }

    assert_eq!(loader.call_count(), 3);
    assert!(service.cache().get_load_object("mem:probe").is_none());
}

#[tokio::test]
async fn test_pending_cached_load_is_shared() {
    let service = new_service();
    let loader = GatedLoader::new();
    service.registry().register_loader("mem", loader.clone());

    // The handle is stored before the load settles
    let first = service
        .resolve_and_cache("mem:a", &LoadOptions::default())
        .unwrap();
    let second = service
        .resolve_and_cache("mem:a", &LoadOptions::default())
        .unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(loader.call_count(), 1);

    loader.release_all();
    let (a, b) = tokio::join!(first, second);
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
}

#[tokio::test]
async fn test_concurrent_transient_resolves_dispatch_twice() {
    let service = new_service();
    let loader = GatedLoader::new();
    service.registry().register_loader("mem", loader.clone());

    let first = service
        .resolve_transient("mem:a", &LoadOptions::default())
        .unwrap();
    let second = service
        .resolve_transient("mem:a", &LoadOptions::default())
        .unwrap();

    assert!(!first.ptr_eq(&second));
    assert_eq!(loader.call_count(), 2);

    loader.release_all();
    let (a, b) = tokio::join!(first, second);
    assert!(a.is_ok() && b.is_ok());
}

#[tokio::test]
async fn test_batch_resolve_and_cache() {
    let service = new_service();
    let loader = RecordingLoader::succeeding();
    service.registry().register_loader("mem", loader.clone());

    let ids: Vec<String> = (0..4).map(|i| format!("mem:{i}")).collect();
    let results = service.resolve_and_cache_many(&ids, &LoadOptions::default());

    assert_eq!(results.len(), 4);
    for (id, result) in ids.iter().zip(results) {
        let image = result.unwrap().await.unwrap();
        assert_eq!(&image.image_id, id);
    }
    assert_eq!(service.cache().len(), 4);
    assert_eq!(loader.call_count(), 4);
}
