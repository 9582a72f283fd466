//! Multi-slice volumes held by the cache.
//!
//! A volume owns the pixel data of many slices in one contiguous buffer.
//! Once a volume is fully loaded, an individual slice can be served by
//! copying its bytes out instead of loading and decoding the image again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::LoadError;
use crate::loader::LoadObject;
use crate::model::Image;

// =============================================================================
// Volume Trait
// =============================================================================

/// A cached multi-slice dataset.
pub trait Volume: Send + Sync {
    /// Unique id of this volume.
    fn volume_id(&self) -> &str;

    /// Whether every slice has been loaded into the volume.
    fn is_loaded(&self) -> bool;

    /// Slice index of `image_id` within this volume, if it belongs to it.
    fn image_id_index(&self, image_id: &str) -> Option<usize>;

    /// Produce a standalone image for slice `index`, labelled `image_id`.
    fn convert_to_slice(&self, image_id: &str, index: usize) -> LoadObject;
}

/// A volume together with the slice offset of one image id inside it.
#[derive(Clone)]
pub struct CachedVolumeInfo {
    /// The containing volume
    pub volume: Arc<dyn Volume>,

    /// Slice offset of the image id
    pub image_id_index: usize,
}

impl std::fmt::Debug for CachedVolumeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedVolumeInfo")
            .field("volume_id", &self.volume.volume_id())
            .field("image_id_index", &self.image_id_index)
            .finish()
    }
}

// =============================================================================
// Slice Geometry
// =============================================================================

/// Pixel layout shared by every slice of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceGeometry {
    pub rows: u32,
    pub columns: u32,
    pub bits_allocated: u16,
    pub samples_per_pixel: u16,
}

impl SliceGeometry {
    /// Bytes occupied by one slice.
    pub fn slice_len(&self) -> usize {
        let bytes_per_sample = (self.bits_allocated as usize).div_ceil(8);
        self.rows as usize * self.columns as usize * self.samples_per_pixel as usize
            * bytes_per_sample
    }
}

// =============================================================================
// ImageVolume
// =============================================================================

/// In-memory [`Volume`] backed by one contiguous scalar buffer.
///
/// Slices are written as they arrive; the volume only serves slices after
/// [`ImageVolume::set_loaded`] flips the loaded flag.
pub struct ImageVolume {
    volume_id: String,
    image_ids: Vec<String>,
    geometry: SliceGeometry,
    scalar_data: RwLock<Vec<u8>>,
    loaded: AtomicBool,
}

impl ImageVolume {
    /// Create a zero-filled volume with one slice per image id.
    pub fn new(
        volume_id: impl Into<String>,
        image_ids: Vec<String>,
        geometry: SliceGeometry,
    ) -> Self {
        let len = geometry.slice_len() * image_ids.len();
        Self {
            volume_id: volume_id.into(),
            image_ids,
            geometry,
            scalar_data: RwLock::new(vec![0; len]),
            loaded: AtomicBool::new(false),
        }
    }

    /// Slice geometry.
    pub fn geometry(&self) -> SliceGeometry {
        self.geometry
    }

    /// Image ids in slice order.
    pub fn image_ids(&self) -> &[String] {
        &self.image_ids
    }

    /// Number of slices.
    pub fn slice_count(&self) -> usize {
        self.image_ids.len()
    }

    /// Copy `data` into slice `index`.
    pub fn write_slice(&self, index: usize, data: &[u8]) -> Result<(), LoadError> {
        let slice_len = self.geometry.slice_len();
        if index >= self.slice_count() {
            return Err(LoadError::SliceOutOfRange {
                index,
                slices: self.slice_count(),
            });
        }
        if data.len() != slice_len {
            return Err(LoadError::Decode {
                message: format!("slice {index} has {} bytes, expected {slice_len}", data.len()),
            });
        }

        let start = index * slice_len;
        self.scalar_data.write()[start..start + slice_len].copy_from_slice(data);
        Ok(())
    }

    /// Set the loaded flag.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }

    fn copy_slice(&self, image_id: &str, index: usize) -> Result<Image, LoadError> {
        if index >= self.slice_count() {
            return Err(LoadError::SliceOutOfRange {
                index,
                slices: self.slice_count(),
            });
        }

        let slice_len = self.geometry.slice_len();
        let start = index * slice_len;
        let pixels = Bytes::copy_from_slice(&self.scalar_data.read()[start..start + slice_len]);

        Ok(Image::new(
            image_id,
            self.geometry.rows,
            self.geometry.columns,
            self.geometry.bits_allocated,
            self.geometry.samples_per_pixel,
            pixels,
        ))
    }
}

impl Volume for ImageVolume {
    fn volume_id(&self) -> &str {
        &self.volume_id
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn image_id_index(&self, image_id: &str) -> Option<usize> {
        self.image_ids.iter().position(|id| id == image_id)
    }

    fn convert_to_slice(&self, image_id: &str, index: usize) -> LoadObject {
        LoadObject::ready(self.copy_slice(image_id, index).map(Arc::new))
    }
}
