//! Load handles and request options.
//!
//! A [`LoadObject`] pairs a shared, cloneable future of the load result with
//! an optional cancellation capability. Every holder (the cache, the event
//! broadcaster, callers) observes the same settled value through its own
//! clone of the promise; the handle itself is never mutated after creation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::model::Image;

/// Result of a settled load.
pub type ImageResult = Result<Arc<Image>, LoadError>;

/// Shared future of a load result.
///
/// Cloning is cheap and every clone resolves to the same value.
pub type ImagePromise = Shared<BoxFuture<'static, ImageResult>>;

/// Opaque cancellation capability exposed by a loader.
pub type CancelFn = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// Load Options
// =============================================================================

/// Kind of request a load belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// User-driven load that blocks what is on screen
    #[default]
    Interaction,

    /// Small preview image
    Thumbnail,

    /// Speculative background load
    Prefetch,
}

/// Options passed through to the loader unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// Scheduling priority hint (lower loads first)
    pub priority: i32,

    /// Kind of request
    pub request_type: RequestType,

    /// Free-form loader-specific details
    pub additional_details: Map<String, Value>,
}

impl LoadOptions {
    /// Create options for a given request type.
    pub fn for_request(request_type: RequestType) -> Self {
        Self {
            request_type,
            ..Self::default()
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a loader-specific detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_details.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Load Object
// =============================================================================

/// Handle to in-flight or settled load work.
#[derive(Clone)]
pub struct LoadObject {
    promise: ImagePromise,
    cancel: Option<CancelFn>,
}

impl LoadObject {
    /// Wrap a future producing the load result.
    ///
    /// The future is lazy until some holder polls the promise.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = ImageResult> + Send + 'static,
    {
        Self {
            promise: future.boxed().shared(),
            cancel: None,
        }
    }

    /// Create an already-settled load.
    pub fn ready(result: ImageResult) -> Self {
        Self::new(futures::future::ready(result))
    }

    /// Create an already-fulfilled load.
    pub fn loaded(image: Image) -> Self {
        Self::ready(Ok(Arc::new(image)))
    }

    /// Attach a cancellation capability.
    pub fn with_cancel<C>(mut self, cancel: C) -> Self
    where
        C: Fn() + Send + Sync + 'static,
    {
        self.cancel = Some(Arc::new(cancel));
        self
    }

    /// Get a clone of the shared promise.
    pub fn promise(&self) -> ImagePromise {
        self.promise.clone()
    }

    /// Whether `promise` is a clone of this load's promise.
    pub fn is_same_promise(&self, promise: &ImagePromise) -> bool {
        self.promise.ptr_eq(promise)
    }

    /// Whether two handles refer to the same underlying load.
    pub fn ptr_eq(&self, other: &LoadObject) -> bool {
        self.promise.ptr_eq(&other.promise)
    }

    /// The settled result, if the load has already completed.
    pub fn peek(&self) -> Option<&ImageResult> {
        self.promise.peek()
    }

    /// Whether the loader exposed a cancellation capability.
    pub fn is_cancellable(&self) -> bool {
        self.cancel.is_some()
    }

    /// Invoke the cancellation capability, if any.
    ///
    /// Returns `true` if a capability was present and invoked.
    pub fn cancel(&self) -> bool {
        match &self.cancel {
            Some(cancel) => {
                cancel();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for LoadObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadObject")
            .field("settled", &self.peek().is_some())
            .field("cancellable", &self.is_cancellable())
            .finish()
    }
}
