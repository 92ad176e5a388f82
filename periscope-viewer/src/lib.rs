//! Viewer side of a one-to-many live broadcast.
//!
//! A [`ViewerSession`] connects to the signaling server, joins a stream by id,
//! answers the broadcaster's WebRTC offer and hands the received media to the
//! consumer through callbacks or a [`ViewerEvent`] subscription.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod peer;
pub mod session;
pub mod signaling;

pub use callbacks::{CallbackRegistry, ViewerEvent};
pub use config::{ReconnectPolicy, ViewerConfig};
pub use error::{PeerError, TransportError, ViewerError};
pub use peer::MediaStream;
pub use session::{SessionSnapshot, ViewerSession, ViewerState};
