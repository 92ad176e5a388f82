use periscope_core::SignalMessage;

/// What the signaling transport reports to the viewer session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A decoded frame from the server.
    Message(SignalMessage),

    /// The connection dropped; the transport is retrying on its own.
    Disconnected(String),

    /// A retry succeeded. Nothing is rejoined automatically.
    Reconnected,

    /// The transport stopped for good (closed locally or out of retries).
    Closed,
}
