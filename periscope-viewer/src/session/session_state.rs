use periscope_core::{PeerId, StreamId};

/// Externally visible phase of a viewer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerState {
    /// No stream joined. The transport may or may not be up.
    #[default]
    Idle,
    /// `initialize()` is dialing the signaling server.
    Connecting,
    /// Join sent, waiting for the acknowledgment.
    Joining,
    /// Join acknowledged, waiting for the broadcaster's offer.
    Joined,
    /// Offer answered, waiting for media.
    Negotiating,
    Streaming,
}

impl ViewerState {
    /// True once the server acknowledged the join and until the stream is gone.
    pub fn is_joined(self) -> bool {
        matches!(
            self,
            ViewerState::Joined | ViewerState::Negotiating | ViewerState::Streaming
        )
    }

    /// True while a stream id is held (join pending or later).
    pub fn has_stream(self) -> bool {
        self.is_joined() || self == ViewerState::Joining
    }
}

/// Point-in-time copy of the session fields, published after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: ViewerState,
    pub stream_id: Option<StreamId>,
    pub streamer_id: Option<PeerId>,
    pub transport_ready: bool,
}

/// Why a joined stream was torn down.
#[derive(Debug, Clone)]
pub(crate) enum SessionEnd {
    /// Broadcaster stopped or the peer connection closed.
    Ended,
    /// Signaling connection dropped underneath the stream.
    TransportLost,
    /// The server refused the join.
    Rejected(String),
    /// Negotiation failed locally; the server is told we left.
    Failed(String),
}
