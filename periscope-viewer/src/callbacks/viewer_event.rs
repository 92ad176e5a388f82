use crate::peer::MediaStream;
use periscope_core::StreamId;

/// Notifications delivered to the consumer of a viewer session.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// Media from the broadcaster is flowing.
    Stream {
        stream_id: StreamId,
        stream: MediaStream,
    },

    /// The stream that was joined is gone (ended, closed, or the transport dropped).
    Disconnected { stream_id: StreamId },

    ViewerCount { stream_id: StreamId, count: u32 },

    /// A join or negotiation failed; the session is back to idle.
    Error {
        stream_id: Option<StreamId>,
        message: String,
    },
}
