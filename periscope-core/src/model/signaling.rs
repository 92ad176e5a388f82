use crate::model::negotiation::{IceCandidate, SessionDescription};
use crate::model::peer::PeerId;
use crate::model::stream::StreamId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }
}

/// Every frame exchanged with the signaling server.
///
/// Encoded as `{"event": "<name>", "data": {...}}` with camelCase payload
/// fields. Both directions share this enum; `Join` and `Leave` are only ever
/// sent by the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    #[serde(rename = "join-webrtc-stream")]
    Join { stream_id: StreamId },

    #[serde(rename = "webrtc-stream-joined")]
    JoinAck {
        stream_id: StreamId,
        streamer_id: PeerId,
    },

    #[serde(rename = "stream-not-found")]
    NotFound { stream_id: StreamId },

    #[serde(rename = "webrtc-offer")]
    Offer {
        stream_id: StreamId,
        from_id: PeerId,
        offer: SessionDescription,
    },

    #[serde(rename = "webrtc-answer")]
    Answer {
        stream_id: StreamId,
        target_id: PeerId,
        answer: SessionDescription,
    },

    #[serde(rename = "webrtc-ice-candidate")]
    IceCandidate {
        stream_id: StreamId,
        candidate: IceCandidate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<PeerId>,
    },

    #[serde(rename = "webrtc-stream-ended")]
    StreamEnded { stream_id: StreamId },

    #[serde(rename = "leave-webrtc-stream")]
    Leave { stream_id: StreamId },

    #[serde(rename = "viewer-count")]
    ViewerCount { stream_id: StreamId, count: u32 },
}

impl SignalMessage {
    pub fn stream_id(&self) -> &StreamId {
        match self {
            SignalMessage::Join { stream_id }
            | SignalMessage::JoinAck { stream_id, .. }
            | SignalMessage::NotFound { stream_id }
            | SignalMessage::Offer { stream_id, .. }
            | SignalMessage::Answer { stream_id, .. }
            | SignalMessage::IceCandidate { stream_id, .. }
            | SignalMessage::StreamEnded { stream_id }
            | SignalMessage::Leave { stream_id }
            | SignalMessage::ViewerCount { stream_id, .. } => stream_id,
        }
    }

    /// Wire name of the message kind, handy for logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join-webrtc-stream",
            SignalMessage::JoinAck { .. } => "webrtc-stream-joined",
            SignalMessage::NotFound { .. } => "stream-not-found",
            SignalMessage::Offer { .. } => "webrtc-offer",
            SignalMessage::Answer { .. } => "webrtc-answer",
            SignalMessage::IceCandidate { .. } => "webrtc-ice-candidate",
            SignalMessage::StreamEnded { .. } => "webrtc-stream-ended",
            SignalMessage::Leave { .. } => "leave-webrtc-stream",
            SignalMessage::ViewerCount { .. } => "viewer-count",
        }
    }
}
