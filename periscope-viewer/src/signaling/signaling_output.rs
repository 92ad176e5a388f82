use crate::error::TransportError;
use async_trait::async_trait;
use periscope_core::{IceCandidate, PeerId, SessionDescription, SignalMessage, StreamId};

/// Outbound half of a signaling connection.
///
/// Implementors only provide [`send_signal`](Self::send_signal) and
/// [`close`](Self::close); the typed helpers build the wire messages.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), TransportError>;

    /// Tear the connection down. Calling it more than once is harmless.
    async fn close(&self);

    async fn send_join(&self, stream_id: StreamId) -> Result<(), TransportError> {
        self.send_signal(SignalMessage::Join { stream_id }).await
    }

    async fn send_leave(&self, stream_id: StreamId) -> Result<(), TransportError> {
        self.send_signal(SignalMessage::Leave { stream_id }).await
    }

    async fn send_answer(
        &self,
        stream_id: StreamId,
        target_id: PeerId,
        answer: SessionDescription,
    ) -> Result<(), TransportError> {
        self.send_signal(SignalMessage::Answer {
            stream_id,
            target_id,
            answer,
        })
        .await
    }

    async fn send_ice(
        &self,
        stream_id: StreamId,
        target_id: Option<PeerId>,
        candidate: IceCandidate,
    ) -> Result<(), TransportError> {
        self.send_signal(SignalMessage::IceCandidate {
            stream_id,
            candidate,
            target_id,
        })
        .await
    }
}
