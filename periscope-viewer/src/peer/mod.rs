mod media_stream;
mod peer_event;
mod peer_session;
mod rtc_peer;

pub use media_stream::MediaStream;
pub use peer_event::{PeerEvent, PeerEventKind, PeerEvents};
pub use peer_session::{PeerFactory, PeerSession};
pub use rtc_peer::{RtcPeerFactory, RtcPeerSession};
