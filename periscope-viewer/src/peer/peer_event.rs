use crate::peer::MediaStream;
use periscope_core::IceCandidate;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum PeerEventKind {
    /// Local candidate to trickle to the broadcaster.
    LocalCandidate(IceCandidate),
    /// The peer connection reached the connected state.
    Connected,
    /// Connectivity dropped but may come back without renegotiation.
    Interrupted,
    /// Remote media arrived. Reported at most once per peer session.
    Stream(MediaStream),
    /// The connection ended without an error.
    Closed,
    /// Negotiation or transport failure.
    Error(String),
}

impl PeerEventKind {
    /// Whether the peer session is over once this event is emitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PeerEventKind::Closed | PeerEventKind::Error(_))
    }
}

/// An event tagged with the peer session that produced it.
#[derive(Debug, Clone)]
pub struct PeerEvent {
    pub generation: u64,
    pub kind: PeerEventKind,
}

/// Sender handed to each peer session; stamps events with the session's generation.
#[derive(Clone)]
pub struct PeerEvents {
    generation: u64,
    tx: mpsc::Sender<PeerEvent>,
}

impl PeerEvents {
    pub fn new(generation: u64, tx: mpsc::Sender<PeerEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn emit(&self, kind: PeerEventKind) {
        let event = PeerEvent {
            generation: self.generation,
            kind,
        };
        if self.tx.send(event).await.is_err() {
            debug!(
                "Viewer session gone, dropping event of peer #{}",
                self.generation
            );
        }
    }
}
