//! Local filesystem image source.
//!
//! Serves image ids of the form `file:<relative path>` from a root
//! directory. The body of the id is resolved against the root and must not
//! escape it.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

use super::image_id::split_image_id;
use super::source::ImageSource;

/// Scheme served by [`FileSource`].
pub const FILE_SCHEME: &str = "file";

/// Filesystem-backed implementation of [`ImageSource`].
///
/// # Example
///
/// ```ignore
/// use image_loader::loader::{FileSource, SourceLoader};
///
/// let loader = SourceLoader::new(FileSource::new("/data/images"));
/// // "file:ct/slice-001.png" reads /data/images/ct/slice-001.png
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an image id to a path under the root.
    ///
    /// Absolute bodies and `..` components are rejected.
    pub fn resolve_path(&self, image_id: &str) -> Result<PathBuf, IoError> {
        let (_, body) = split_image_id(image_id);
        let relative = Path::new(body);

        if body.is_empty() {
            return Err(IoError::NotFound(image_id.to_string()));
        }

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(IoError::PathTraversal(body.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageSource for FileSource {
    async fn fetch(&self, image_id: &str) -> Result<Bytes, IoError> {
        let path = self.resolve_path(image_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IoError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
