use crate::error::PeerError;
use crate::peer::{PeerEvent, PeerEvents, PeerFactory, PeerSession};
use periscope_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;
use tracing::debug;

struct ActivePeer {
    generation: u64,
    session: Box<dyn PeerSession>,
    answered: bool,
    stream_delivered: bool,
}

/// Holds the single live peer session of a viewer.
///
/// A new session can only be installed through [`PeerSlot::replace`], which
/// destroys the previous occupant before the factory is asked for another.
pub(crate) struct PeerSlot {
    current: Option<ActivePeer>,
    last_generation: u64,
}

impl PeerSlot {
    pub fn new() -> Self {
        Self {
            current: None,
            last_generation: 0,
        }
    }

    pub async fn replace(
        &mut self,
        factory: &dyn PeerFactory,
        events: &mpsc::Sender<PeerEvent>,
    ) -> Result<u64, PeerError> {
        self.clear().await;

        self.last_generation += 1;
        let generation = self.last_generation;
        let session = factory
            .create(PeerEvents::new(generation, events.clone()))
            .await?;

        debug!("Installed peer #{}", generation);
        self.current = Some(ActivePeer {
            generation,
            session,
            answered: false,
            stream_delivered: false,
        });
        Ok(generation)
    }

    pub async fn clear(&mut self) {
        if let Some(mut peer) = self.current.take() {
            debug!("Releasing peer #{}", peer.generation);
            peer.session.destroy().await;
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|peer| peer.generation == generation)
    }

    pub fn is_answered(&self) -> bool {
        self.current.as_ref().is_some_and(|peer| peer.answered)
    }

    pub async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, PeerError> {
        let peer = self.current.as_mut().ok_or(PeerError::Destroyed)?;
        let answer = peer.session.accept_offer(offer).await?;
        peer.answered = true;
        Ok(answer)
    }

    pub async fn apply_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        match &self.current {
            Some(peer) => peer.session.apply_remote_candidate(candidate).await,
            None => Err(PeerError::Destroyed),
        }
    }

    /// First call per session returns true; later ones false.
    pub fn claim_stream(&mut self, generation: u64) -> bool {
        match self.current.as_mut() {
            Some(peer) if peer.generation == generation && !peer.stream_delivered => {
                peer.stream_delivered = true;
                true
            }
            _ => false,
        }
    }
}
