use crate::callbacks::ViewerEvent;
use crate::peer::MediaStream;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

type StreamHandler = Arc<dyn Fn(MediaStream) + Send + Sync>;
type DisconnectHandler = Arc<dyn Fn() + Send + Sync>;
type ViewerCountHandler = Arc<dyn Fn(u32) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    on_stream: Option<StreamHandler>,
    on_disconnect: Option<DisconnectHandler>,
    on_viewer_count: Option<ViewerCountHandler>,
    on_error: Option<ErrorHandler>,
}

/// Consumer-facing notification hub.
///
/// Handlers are optional and can be swapped at any time. Every notification is
/// also published on a broadcast channel for consumers that prefer a stream of
/// [`ViewerEvent`]s.
#[derive(Clone)]
pub struct CallbackRegistry {
    handlers: Arc<RwLock<Handlers>>,
    events: broadcast::Sender<ViewerEvent>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            handlers: Arc::new(RwLock::new(Handlers::default())),
            events,
        }
    }

    pub fn set_on_stream<F>(&self, f: F)
    where
        F: Fn(MediaStream) + Send + Sync + 'static,
    {
        self.write().on_stream = Some(Arc::new(f));
    }

    pub fn set_on_disconnect<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.write().on_disconnect = Some(Arc::new(f));
    }

    pub fn set_on_viewer_count<F>(&self, f: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.write().on_viewer_count = Some(Arc::new(f));
    }

    pub fn set_on_error<F>(&self, f: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.write().on_error = Some(Arc::new(f));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }

    /// Runs the matching handler (if any) and publishes the event.
    pub fn dispatch(&self, event: ViewerEvent) {
        // Clone the handler out so it runs without the lock held.
        match &event {
            ViewerEvent::Stream { stream, .. } => {
                let handler = self.read().on_stream.clone();
                if let Some(handler) = handler {
                    handler(stream.clone());
                }
            }
            ViewerEvent::Disconnected { .. } => {
                let handler = self.read().on_disconnect.clone();
                if let Some(handler) = handler {
                    handler();
                }
            }
            ViewerEvent::ViewerCount { count, .. } => {
                let handler = self.read().on_viewer_count.clone();
                if let Some(handler) = handler {
                    handler(*count);
                }
            }
            ViewerEvent::Error { message, .. } => {
                let handler = self.read().on_error.clone();
                if let Some(handler) = handler {
                    handler(message.clone());
                }
            }
        }

        let _ = self.events.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, Handlers> {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Handlers> {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
