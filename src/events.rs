//! Image load lifecycle events.
//!
//! Every load dispatched through a loader produces exactly one
//! [`ImageEvent`]: [`ImageEvent::ImageLoaded`] when its promise fulfills or
//! [`ImageEvent::ImageLoadFailed`] when it rejects. Events are published from
//! a spawned task, never from inside the call that started the load.
//!
//! Each subscriber owns an unbounded queue, so a slow subscriber never loses
//! an event. Queues of dropped receivers are pruned on the next publish.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::error::LoadError;
use crate::loader::LoadObject;
use crate::model::Image;

/// Terminal outcome of a dispatched load.
#[derive(Debug, Clone)]
pub enum ImageEvent {
    /// The load fulfilled
    ImageLoaded { image: Arc<Image> },

    /// The load rejected
    ImageLoadFailed { image_id: String, error: LoadError },
}

impl ImageEvent {
    /// Image id the event refers to.
    pub fn image_id(&self) -> &str {
        match self {
            ImageEvent::ImageLoaded { image } => &image.image_id,
            ImageEvent::ImageLoadFailed { image_id, .. } => image_id,
        }
    }

    /// Whether this is a failure event.
    pub fn is_failure(&self) -> bool {
        matches!(self, ImageEvent::ImageLoadFailed { .. })
    }
}

/// Receiving end of an event subscription.
pub type EventReceiver = mpsc::UnboundedReceiver<ImageEvent>;

/// Shared publisher of [`ImageEvent`]s.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBroadcaster {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<ImageEvent>>>>,
}

impl EventBroadcaster {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events published after this call.
    ///
    /// The receiver yields `None` once every handle to the broadcaster and
    /// every pending observer is gone.
    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// Publish an event to every live subscriber. Having none is not an error.
    pub fn emit(&self, event: ImageEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            trace!(image_id = event.image_id(), "image event dropped, no subscribers");
        }
    }

    /// Publish the outcome of `load` once its promise settles.
    ///
    /// The observer runs on `runtime` and awaits its own clone of the shared
    /// promise, so the value seen by every other holder is untouched.
    pub fn observe(&self, runtime: &Handle, image_id: &str, load: &LoadObject) {
        let promise = load.promise();
        let broadcaster = self.clone();
        let image_id = image_id.to_string();

        runtime.spawn(async move {
            let event = match promise.await {
                Ok(image) => ImageEvent::ImageLoaded { image },
                Err(error) => {
                    warn!(image_id = %image_id, error = %error, "image load failed");
                    ImageEvent::ImageLoadFailed { image_id, error }
                }
            };
            broadcaster.emit(event);
        });
    }
}
