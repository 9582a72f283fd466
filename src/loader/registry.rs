//! Scheme registry for image loaders.
//!
//! The registry maps a scheme token to the loader that serves it and holds
//! at most one fallback ("unknown") loader used when no scheme matches.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use image_loader::loader::{LoadObject, LoadOptions, LoaderRegistry};
//! use image_loader::LoadError;
//!
//! let registry = LoaderRegistry::new();
//! registry.register_loader("mem", Arc::new(|image_id: &str, _options: &LoadOptions| {
//!     LoadObject::ready(Err(LoadError::Other(format!("{image_id} is not in memory"))))
//! }));
//!
//! assert!(registry.resolve_loader("mem:a").is_some());
//! assert!(registry.resolve_loader("wadouri:a.dcm").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::image_id::scheme_of;
use super::load_object::{LoadObject, LoadOptions};

// =============================================================================
// ImageLoader Trait
// =============================================================================

/// A capability that starts the asynchronous retrieval of one image.
///
/// `load` must return immediately; the actual work runs behind the returned
/// [`LoadObject`]'s promise. Load-time failures are reported through the
/// promise, never by panicking.
///
/// Implemented for every `Fn(&str, &LoadOptions) -> LoadObject` closure.
pub trait ImageLoader: Send + Sync {
    /// Start loading `image_id`.
    fn load(&self, image_id: &str, options: &LoadOptions) -> LoadObject;
}

impl<F> ImageLoader for F
where
    F: Fn(&str, &LoadOptions) -> LoadObject + Send + Sync,
{
    fn load(&self, image_id: &str, options: &LoadOptions) -> LoadObject {
        self(image_id, options)
    }
}

/// Shared handle to a registered loader.
pub type SharedLoader = Arc<dyn ImageLoader>;

// =============================================================================
// LoaderRegistry
// =============================================================================

#[derive(Default)]
struct RegistryState {
    loaders: HashMap<String, SharedLoader>,
    unknown: Option<SharedLoader>,
}

/// Scheme → loader mapping with an optional fallback.
///
/// All methods take `&self`; the registry is meant to be shared behind an
/// `Arc`. Locks are held only for the duration of a lookup or update.
#[derive(Default)]
pub struct LoaderRegistry {
    state: RwLock<RegistryState>,
}

impl LoaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` for `scheme`.
    ///
    /// Any loader previously registered for the scheme is replaced.
    pub fn register_loader(&self, scheme: impl Into<String>, loader: SharedLoader) {
        let scheme = scheme.into();
        let mut state = self.state.write();
        if state.loaders.insert(scheme.clone(), loader).is_some() {
            debug!(scheme = %scheme, "replaced image loader");
        } else {
            debug!(scheme = %scheme, "registered image loader");
        }
    }

    /// Install the fallback loader used when no scheme matches.
    ///
    /// Returns the previously installed fallback so callers can restore it.
    pub fn register_unknown_loader(&self, loader: SharedLoader) -> Option<SharedLoader> {
        let previous = self.state.write().unknown.replace(loader);
        debug!(
            replaced = previous.is_some(),
            "registered unknown image loader"
        );
        previous
    }

    /// Remove every scheme mapping and the fallback loader.
    pub fn unregister_all(&self) {
        let mut state = self.state.write();
        state.loaders.clear();
        state.unknown = None;
        debug!("unregistered all image loaders");
    }

    /// Find the loader that serves `image_id`.
    ///
    /// Returns the loader registered for the id's scheme, else the fallback,
    /// else `None`. Ids without a scheme go straight to the fallback.
    pub fn resolve_loader(&self, image_id: &str) -> Option<SharedLoader> {
        let state = self.state.read();
        if let Some(loader) = scheme_of(image_id).and_then(|scheme| state.loaders.get(scheme)) {
            return Some(loader.clone());
        }

        let fallback = state.unknown.clone();
        if fallback.is_some() {
            debug!(image_id, "using unknown image loader");
        }
        fallback
    }

    /// Whether a loader is registered for exactly this scheme.
    pub fn has_loader(&self, scheme: &str) -> bool {
        self.state.read().loaders.contains_key(scheme)
    }

    /// Whether a fallback loader is installed.
    pub fn has_unknown_loader(&self) -> bool {
        self.state.read().unknown.is_some()
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.state.read().loaders.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

// =============================================================================
// Tests
// =============================================================================
