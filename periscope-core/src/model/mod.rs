mod negotiation;
mod peer;
mod signaling;
mod stream;

pub use negotiation::{IceCandidate, SdpKind, SessionDescription};
pub use peer::PeerId;
pub use signaling::{IceServerConfig, SignalMessage};
pub use stream::StreamId;
