use std::time::Duration;
use thiserror::Error;

/// Failures of the signaling connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid signaling endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("signaling connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("signaling connection refused: {0}")]
    Refused(String),

    #[error("signaling transport is not connected")]
    NotConnected,

    #[error("signaling transport is closed")]
    Closed,

    #[error("failed to encode signal message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of a single peer negotiation.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("webrtc error: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("offer was already accepted by this peer session")]
    OfferAlreadyAccepted,

    #[error("no offer has been accepted yet")]
    NoRemoteDescription,

    #[error("cannot answer a session description of type {0:?}")]
    UnexpectedDescription(periscope_core::SdpKind),

    #[error("peer session was destroyed")]
    Destroyed,
}

/// Errors returned directly by [`crate::ViewerSession`] calls.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("viewer is not initialized; call initialize() first")]
    NotInitialized,

    #[error("viewer is not connected to the signaling server")]
    NotConnected,

    #[error("stream id must not be empty")]
    InvalidStreamId,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("viewer session has shut down")]
    SessionClosed,
}
