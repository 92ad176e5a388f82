mod peer_slot;
mod session_actor;
mod session_command;
mod session_state;
mod viewer_session;

pub use session_state::{SessionSnapshot, ViewerState};
pub use viewer_session::ViewerSession;
