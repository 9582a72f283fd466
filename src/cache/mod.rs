//! Cache layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            ImageLoadService             │
//! └────────────────────┬────────────────────┘
//!                      │ get / get volume / put
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          CacheFacade (trait)            │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  LRU of      │  │  Volume table   │  │
//! │  │  LoadObjects │  │  (ImageVolume)  │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`CacheFacade`]: the three operations the load service relies on
//! - [`ImageCache`]: default LRU-backed implementation
//! - [`Volume`] / [`ImageVolume`]: multi-slice datasets that can serve
//!   individual slices once fully loaded
//! - [`CachedVolumeInfo`]: volume plus slice offset for one image id

mod image_cache;
mod volume;

pub use image_cache::{CacheFacade, ImageCache, DEFAULT_IMAGE_CACHE_CAPACITY};
pub use volume::{CachedVolumeInfo, ImageVolume, SliceGeometry, Volume};
