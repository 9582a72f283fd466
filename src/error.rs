use thiserror::Error;

/// I/O errors that can occur when fetching image bytes from a source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Underlying filesystem or stream failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Path resolves outside of the source root
    #[error("Path escapes source root: {0}")]
    PathTraversal(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

/// Errors raised synchronously when a load is requested.
///
/// These indicate a caller bug or a misconfigured loader registry and are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The image id was empty
    #[error("An image id must be provided")]
    MissingImageId,

    /// No loader is registered for the scheme and no fallback is installed
    #[error("No image loader for scheme '{scheme}' (image id: {image_id})")]
    NoLoader { scheme: String, image_id: String },

    /// Dispatch was requested outside of a tokio runtime
    #[error("Image load for '{image_id}' requires a tokio runtime")]
    NoRuntime { image_id: String },
}

/// Errors surfaced asynchronously through a load's promise.
///
/// `Clone` is required because a single result is observed by every holder
/// of the shared promise as well as by the event broadcaster.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// I/O error while fetching image bytes
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The fetched bytes could not be decoded into an image
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Slice index is outside of the volume
    #[error("Slice {index} out of range for volume with {slices} slices")]
    SliceOutOfRange { index: usize, slices: usize },

    /// The load was cancelled before it settled
    #[error("Load cancelled: {image_id}")]
    Cancelled { image_id: String },

    /// Loader-specific failure
    #[error("{0}")]
    Other(String),
}
