//! Byte-source backed loaders.
//!
//! [`ImageSource`] abstracts "give me the encoded bytes for this image id".
//! [`SourceLoader`] turns any source into an [`ImageLoader`]: it spawns the
//! fetch and decode on the runtime so `load` returns immediately, and exposes
//! task abortion as the load's cancel capability.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageReader;
use tracing::debug;

use crate::error::{IoError, LoadError};
use crate::model::Image;

use super::load_object::{LoadObject, LoadOptions};
use super::registry::ImageLoader;

// =============================================================================
// ImageSource Trait
// =============================================================================

/// Trait for fetching encoded image bytes by image id.
///
/// This abstraction lets a loader work with different storage backends
/// (local files, object stores, in-memory fixtures) without being tied to one.
#[async_trait]
pub trait ImageSource: Send + Sync + 'static {
    /// Fetch the encoded bytes for `image_id`.
    async fn fetch(&self, image_id: &str) -> Result<Bytes, IoError>;
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode encoded image bytes into an [`Image`].
///
/// The container format is guessed from the bytes. Pixels are normalized to
/// 8-bit grayscale, RGB or RGBA depending on the source color type.
pub fn decode_image(image_id: &str, data: &[u8]) -> Result<Image, LoadError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| LoadError::Decode {
            message: e.to_string(),
        })?;

    let decoded = reader.decode().map_err(|e| LoadError::Decode {
        message: e.to_string(),
    })?;

    let (columns, rows) = (decoded.width(), decoded.height());
    let color = decoded.color();
    let (samples_per_pixel, pixels) = if !color.has_color() && !color.has_alpha() {
        (1, decoded.into_luma8().into_raw())
    } else if color.has_alpha() {
        (4, decoded.into_rgba8().into_raw())
    } else {
        (3, decoded.into_rgb8().into_raw())
    };

    Ok(Image::new(
        image_id,
        rows,
        columns,
        8,
        samples_per_pixel,
        Bytes::from(pixels),
    ))
}

async fn fetch_and_decode<S: ImageSource>(
    source: &S,
    image_id: &str,
) -> Result<Arc<Image>, LoadError> {
    let data = source.fetch(image_id).await?;
    debug!(image_id, bytes = data.len(), "fetched image bytes");
    decode_image(image_id, &data).map(Arc::new)
}

// =============================================================================
// SourceLoader
// =============================================================================

/// [`ImageLoader`] backed by an [`ImageSource`].
///
/// Each load runs as a spawned task, so `load` must be called from within a
/// tokio runtime.
pub struct SourceLoader<S: ImageSource> {
    source: Arc<S>,
}

impl<S: ImageSource> SourceLoader<S> {
    /// Create a loader for the given source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

impl<S: ImageSource> ImageLoader for SourceLoader<S> {
    fn load(&self, image_id: &str, _options: &LoadOptions) -> LoadObject {
        let source = self.source.clone();
        let id = image_id.to_string();

        let task = tokio::spawn(async move { fetch_and_decode(source.as_ref(), &id).await });
        let abort = task.abort_handle();

        let id = image_id.to_string();
        LoadObject::new(async move {
            match task.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(LoadError::Cancelled { image_id: id }),
                Err(e) => Err(LoadError::Other(e.to_string())),
            }
        })
        .with_cancel(move || abort.abort())
    }
}
