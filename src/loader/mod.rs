//! Loader layer.
//!
//! This module holds everything needed to turn an image id into started
//! load work:
//!
//! - [`split_image_id`] / [`scheme_of`]: the `scheme ":" body` grammar
//! - [`LoaderRegistry`]: scheme → [`ImageLoader`] mapping plus fallback
//! - [`LoadObject`]: shared promise of the result with optional cancel
//! - [`SourceLoader`]: adapts an async [`ImageSource`] into a loader
//! - [`FileSource`]: serves `file:` ids from a local directory

mod file;
mod image_id;
mod load_object;
mod registry;
mod source;

pub use file::{FileSource, FILE_SCHEME};
pub use image_id::{scheme_of, split_image_id};
pub use load_object::{
    CancelFn, ImagePromise, ImageResult, LoadObject, LoadOptions, RequestType,
};
pub use registry::{ImageLoader, LoaderRegistry, SharedLoader};
pub use source::{decode_image, ImageSource, SourceLoader};
