//! Cache façade for load handles and volumes.
//!
//! The load service only talks to the cache through [`CacheFacade`]'s three
//! operations. [`ImageCache`] is the default implementation: an LRU of
//! [`LoadObject`]s keyed by image id, plus a table of cached volumes that is
//! searched when an image id misses the LRU.
//!
//! # Eviction
//!
//! The LRU is bounded by entry count. Pending loads occupy an entry like
//! settled ones; their size is unknown until they settle.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};

use crate::loader::LoadObject;

use super::volume::{CachedVolumeInfo, Volume};

/// Default maximum number of cached load handles.
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 1_000;

// =============================================================================
// CacheFacade Trait
// =============================================================================

/// The cache operations the load service depends on.
pub trait CacheFacade: Send + Sync {
    /// Get the load handle stored for `image_id`.
    fn get_load_object(&self, image_id: &str) -> Option<LoadObject>;

    /// Find a cached volume that contains `image_id`.
    fn get_volume_containing(&self, image_id: &str) -> Option<CachedVolumeInfo>;

    /// Store a load handle under `image_id`.
    fn put_load_object(&self, image_id: &str, load: LoadObject);
}

// =============================================================================
// ImageCache
// =============================================================================

/// Default [`CacheFacade`]: LRU of load handles plus a volume table.
///
/// # Example
///
/// ```
/// use image_loader::cache::{CacheFacade, ImageCache};
/// use image_loader::loader::LoadObject;
/// use image_loader::Image;
/// use bytes::Bytes;
///
/// let cache = ImageCache::with_capacity(10);
/// let load = LoadObject::loaded(Image::new("mem:a", 1, 1, 8, 1, Bytes::from_static(&[0])));
///
/// cache.put_load_object("mem:a", load.clone());
/// assert!(cache.get_load_object("mem:a").unwrap().ptr_eq(&load));
/// ```
pub struct ImageCache {
    loads: Mutex<LruCache<String, LoadObject>>,
    volumes: RwLock<HashMap<String, Arc<dyn Volume>>>,
}

impl ImageCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_IMAGE_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` load handles.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            loads: Mutex::new(LruCache::new(capacity)),
            volumes: RwLock::new(HashMap::new()),
        }
    }

    /// Remove the load handle stored for `image_id`.
    pub fn remove_load_object(&self, image_id: &str) -> Option<LoadObject> {
        self.loads.lock().pop(image_id)
    }

    /// Whether a load handle is stored for `image_id`, without touching LRU order.
    pub fn contains(&self, image_id: &str) -> bool {
        self.loads.lock().contains(image_id)
    }

    /// Register a volume, replacing any volume with the same id.
    pub fn put_volume(&self, volume: Arc<dyn Volume>) {
        self.volumes
            .write()
            .insert(volume.volume_id().to_string(), volume);
    }

    /// Remove a volume by id.
    pub fn remove_volume(&self, volume_id: &str) -> Option<Arc<dyn Volume>> {
        self.volumes.write().remove(volume_id)
    }

    /// Number of cached load handles.
    pub fn len(&self) -> usize {
        self.loads.lock().len()
    }

    /// Whether no load handles are cached.
    pub fn is_empty(&self) -> bool {
        self.loads.lock().is_empty()
    }

    /// Number of registered volumes.
    pub fn volume_count(&self) -> usize {
        self.volumes.read().len()
    }

    /// Maximum number of load handles.
    pub fn capacity(&self) -> usize {
        self.loads.lock().cap().get()
    }

    /// Drop every load handle and volume.
    pub fn clear(&self) {
        self.loads.lock().clear();
        self.volumes.write().clear();
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheFacade for ImageCache {
    fn get_load_object(&self, image_id: &str) -> Option<LoadObject> {
        self.loads.lock().get(image_id).cloned()
    }

    fn get_volume_containing(&self, image_id: &str) -> Option<CachedVolumeInfo> {
        let volumes = self.volumes.read();
        volumes.values().find_map(|volume| {
            volume
                .image_id_index(image_id)
                .map(|image_id_index| CachedVolumeInfo {
                    volume: volume.clone(),
                    image_id_index,
                })
        })
    }

    fn put_load_object(&self, image_id: &str, load: LoadObject) {
        self.loads.lock().put(image_id.to_string(), load);
    }
}

// =============================================================================
// Tests
// =============================================================================
