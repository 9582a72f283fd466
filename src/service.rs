//! Image load service.
//!
//! The ImageLoadService is the main entry point for image requests. For an
//! image id it decides, synchronously, where the image comes from:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ImageLoadService                          │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                      resolve()                          │    │
//! │  │  1. Cached load handle     → its promise                │    │
//! │  │  2. Loaded cached volume   → copy slice out of volume   │    │
//! │  │  3. Otherwise              → dispatch to scheme loader  │    │
//! │  │  (2, 3) store handle in cache when persisting           │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌─────────────┐     ┌──────────────┐    ┌────────────────┐   │
//! │    │ CacheFacade │     │LoaderRegistry│    │EventBroadcaster│   │
//! │    └─────────────┘     └──────────────┘    └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration errors (empty id, no loader for the scheme) are returned
//! synchronously. Load-time errors only ever surface through the returned
//! promise and an [`ImageEvent::ImageLoadFailed`](crate::events::ImageEvent)
//! event.
//!
//! Concurrent [`ImageLoadService::resolve_transient`] calls for the same
//! uncached id are not deduplicated: each one dispatches its own load.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::cache::{CacheFacade, ImageCache};
use crate::config::ServiceConfig;
use crate::error::LoaderError;
use crate::events::{EventBroadcaster, EventReceiver};
use crate::loader::{scheme_of, ImagePromise, LoadObject, LoadOptions, LoaderRegistry};

/// Whether a resolved load handle is stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    Transient,
    Cache,
}

/// Service resolving image ids to image promises.
///
/// # Type Parameters
///
/// * `C` - The cache façade (defaults to [`ImageCache`])
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use image_loader::{ImageLoadService, LoadOptions, LoaderRegistry, FileSource, SourceLoader};
/// use image_loader::cache::ImageCache;
/// use image_loader::events::EventBroadcaster;
///
/// #[tokio::main]
/// async fn main() {
///     let registry = Arc::new(LoaderRegistry::new());
///     registry.register_loader("file", Arc::new(SourceLoader::new(FileSource::new("/data"))));
///
///     let service = ImageLoadService::new(
///         registry,
///         Arc::new(ImageCache::new()),
///         EventBroadcaster::new(),
///     );
///
///     let promise = service
///         .resolve_and_cache("file:ct/slice-001.png", &LoadOptions::default())
///         .expect("file loader is registered");
///     let image = promise.await.expect("image loads");
///     println!("{}x{}", image.columns, image.rows);
/// }
/// ```
pub struct ImageLoadService<C: CacheFacade = ImageCache> {
    /// Scheme registry used for dispatch
    registry: Arc<LoaderRegistry>,

    /// Cache of load handles and volumes
    cache: Arc<C>,

    /// Publisher of load outcomes
    events: EventBroadcaster,
}

impl ImageLoadService<ImageCache> {
    /// Create a service with a fresh registry and event broadcaster and a
    /// cache sized from `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(LoaderRegistry::new()),
            Arc::new(ImageCache::with_capacity(config.cache_capacity)),
            EventBroadcaster::new(),
        )
    }
}

impl<C: CacheFacade> ImageLoadService<C> {
    /// Create a service from shared components.
    pub fn new(registry: Arc<LoaderRegistry>, cache: Arc<C>, events: EventBroadcaster) -> Self {
        Self {
            registry,
            cache,
            events,
        }
    }

    /// The loader registry.
    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.registry
    }

    /// The cache façade.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// The event broadcaster.
    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Subscribe to load outcome events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Resolve an image id without storing the result in the cache.
    ///
    /// # Errors
    ///
    /// - [`LoaderError::MissingImageId`] if `image_id` is empty
    /// - [`LoaderError::NoLoader`] if resolution reaches dispatch and neither
    ///   a scheme loader nor a fallback is registered
    /// - [`LoaderError::NoRuntime`] if resolution reaches dispatch outside of
    ///   a tokio runtime. Cache and volume hits need no runtime.
    pub fn resolve_transient(
        &self,
        image_id: &str,
        options: &LoadOptions,
    ) -> Result<ImagePromise, LoaderError> {
        self.resolve(image_id, options, Persist::Transient)
    }

    /// Resolve an image id and store the resulting load handle in the cache
    /// before returning, so later calls for the same id hit the cache.
    ///
    /// Fails the same way as [`ImageLoadService::resolve_transient`].
    pub fn resolve_and_cache(
        &self,
        image_id: &str,
        options: &LoadOptions,
    ) -> Result<ImagePromise, LoaderError> {
        self.resolve(image_id, options, Persist::Cache)
    }

    /// Resolve and cache several image ids, one result per id in order.
    ///
    /// A configuration error for one id does not stop the others.
    pub fn resolve_and_cache_many<I, S>(
        &self,
        image_ids: I,
        options: &LoadOptions,
    ) -> Vec<Result<ImagePromise, LoaderError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        image_ids
            .into_iter()
            .map(|image_id| self.resolve_and_cache(image_id.as_ref(), options))
            .collect()
    }

    /// Invoke the cancel capability of the cached load for `image_id`.
    ///
    /// Returns `true` if a cached load exposed a capability and it was
    /// invoked. The cache entry itself is left in place.
    pub fn cancel(&self, image_id: &str) -> bool {
        match self.cache.get_load_object(image_id) {
            Some(load) => {
                let cancelled = load.cancel();
                debug!(image_id, cancelled, "cancel requested");
                cancelled
            }
            None => false,
        }
    }

    /// Start a load through the registered loaders and publish its outcome.
    ///
    /// Exactly one [`ImageEvent`](crate::events::ImageEvent) is published once
    /// the returned handle's promise settles. The handle is returned unmodified.
    ///
    /// The loader is only invoked when a tokio runtime is available to
    /// publish the outcome; otherwise [`LoaderError::NoRuntime`] is returned.
    pub fn dispatch(
        &self,
        image_id: &str,
        options: &LoadOptions,
    ) -> Result<LoadObject, LoaderError> {
        if image_id.is_empty() {
            return Err(LoaderError::MissingImageId);
        }

        let loader = self
            .registry
            .resolve_loader(image_id)
            .ok_or_else(|| LoaderError::NoLoader {
                scheme: scheme_of(image_id).unwrap_or_default().to_string(),
                image_id: image_id.to_string(),
            })?;

        let runtime = Handle::try_current().map_err(|_| LoaderError::NoRuntime {
            image_id: image_id.to_string(),
        })?;

        debug!(
            image_id,
            scheme = scheme_of(image_id).unwrap_or_default(),
            "dispatching image load"
        );
        let load = loader.load(image_id, options);
        self.events.observe(&runtime, image_id, &load);
        Ok(load)
    }

    fn resolve(
        &self,
        image_id: &str,
        options: &LoadOptions,
        persist: Persist,
    ) -> Result<ImagePromise, LoaderError> {
        if image_id.is_empty() {
            return Err(LoaderError::MissingImageId);
        }

        if let Some(load) = self.cache.get_load_object(image_id) {
            debug!(image_id, "image cache hit");
            return Ok(load.promise());
        }

        let load = match self.cache.get_volume_containing(image_id) {
            Some(info) if info.volume.is_loaded() => {
                debug!(
                    image_id,
                    volume_id = info.volume.volume_id(),
                    index = info.image_id_index,
                    "deriving image from cached volume"
                );
                info.volume.convert_to_slice(image_id, info.image_id_index)
            }
            _ => self.dispatch(image_id, options)?,
        };

        if persist == Persist::Cache {
            self.cache.put_load_object(image_id, load.clone());
        }

        Ok(load.promise())
    }
}

// =============================================================================
// Tests
// =============================================================================
