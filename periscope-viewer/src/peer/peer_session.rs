use crate::error::PeerError;
use crate::peer::PeerEvents;
use async_trait::async_trait;
use periscope_core::{IceCandidate, SessionDescription};

/// One answer-side negotiation with the broadcaster.
///
/// Terminal outcomes (`Stream`, `Closed`, `Error`) are reported through the
/// [`PeerEvents`] the session was created with. A session is never reused:
/// the owner destroys it and creates a new one.
#[async_trait]
pub trait PeerSession: Send + Sync {
    /// Applies the remote offer and returns the local answer. Only valid once.
    async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, PeerError>;

    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    /// Releases the connection. Idempotent; no events are emitted afterwards.
    async fn destroy(&mut self);
}

#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self, events: PeerEvents) -> Result<Box<dyn PeerSession>, PeerError>;
}
