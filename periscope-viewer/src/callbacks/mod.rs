mod callback_registry;
mod viewer_event;

pub use callback_registry::CallbackRegistry;
pub use viewer_event::ViewerEvent;
