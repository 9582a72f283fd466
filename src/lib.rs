//! # Image Loader
//!
//! Orchestrates turning opaque image ids into loaded images.
//!
//! An image id has the form `scheme:body`. The scheme selects a loader from
//! a [`LoaderRegistry`]; the body is only meaningful to that loader. Before
//! dispatching, the [`ImageLoadService`] consults a cache of in-flight and
//! settled loads and a table of fully loaded volumes whose slices can be
//! copied out directly.
//!
//! ## Features
//!
//! - **Scheme dispatch**: pluggable loaders per scheme with a single fallback
//! - **Layered resolution**: load cache → cached volume → scheme loader
//! - **Opt-in persistence**: transient resolves never populate the cache
//! - **Lifecycle events**: exactly one loaded/failed event per dispatched load
//!
//! ## Architecture
//!
//! - [`loader`] - Id grammar, loader registry, load handles, byte-source loaders
//! - [`cache`] - Cache façade, LRU image cache, volumes
//! - [`events`] - Load outcome broadcasting
//! - [`service`] - The resolution pipeline
//! - [`model`] - The loaded image type
//! - [`config`] - CLI and service configuration
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use image_loader::{Image, ImageLoadService, LoadObject, LoadOptions, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ImageLoadService::from_config(&ServiceConfig::default());
//!     service.registry().register_loader(
//!         "mem",
//!         Arc::new(|image_id: &str, _options: &LoadOptions| {
//!             LoadObject::loaded(Image::new(image_id, 1, 1, 8, 1, Bytes::from_static(&[0])))
//!         }),
//!     );
//!
//!     let image = service
//!         .resolve_and_cache("mem:a", &LoadOptions::default())
//!         .unwrap()
//!         .await
//!         .unwrap();
//!     assert_eq!(image.image_id, "mem:a");
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod loader;
pub mod service;

// Re-export commonly used types
pub use cache::{CacheFacade, CachedVolumeInfo, ImageCache, ImageVolume, SliceGeometry, Volume};
pub use config::{Config, ServiceConfig};
pub use error::{IoError, LoadError, LoaderError};
pub use events::{EventBroadcaster, EventReceiver, ImageEvent};
pub use model::Image;
pub use loader::{
    scheme_of, split_image_id, FileSource, ImageLoader, ImagePromise, ImageResult, ImageSource,
    LoadObject, LoadOptions, LoaderRegistry, RequestType, SharedLoader, SourceLoader, FILE_SCHEME,
};
pub use service::ImageLoadService;
