//! Loaded image type.
//!
//! An [`Image`] is the typed result of a successful load. Pixel data is kept
//! as an opaque byte buffer; interpreting it is the renderer's concern.

use bytes::Bytes;

/// A loaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The image id this image was loaded for
    pub image_id: String,

    /// Number of pixel rows (height)
    pub rows: u32,

    /// Number of pixel columns (width)
    pub columns: u32,

    /// Bits allocated per sample
    pub bits_allocated: u16,

    /// Samples per pixel (1 for grayscale, 3 for RGB, 4 for RGBA)
    pub samples_per_pixel: u16,

    /// Raw pixel bytes, row-major
    pub pixel_data: Bytes,
}

impl Image {
    /// Create a new image.
    pub fn new(
        image_id: impl Into<String>,
        rows: u32,
        columns: u32,
        bits_allocated: u16,
        samples_per_pixel: u16,
        pixel_data: Bytes,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            rows,
            columns,
            bits_allocated,
            samples_per_pixel,
            pixel_data,
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.pixel_data.len()
    }
}
