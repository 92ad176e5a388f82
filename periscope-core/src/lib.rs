pub mod model;
pub mod utils;

pub use model::{
    IceCandidate, IceServerConfig, PeerId, SdpKind, SessionDescription, SignalMessage, StreamId,
};
