use crate::config::ViewerConfig;
use crate::error::PeerError;
use crate::peer::{MediaStream, PeerEventKind, PeerEvents, PeerFactory, PeerSession};
use async_trait::async_trait;
use periscope_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`RtcPeerSession`]s with the configured ICE servers.
#[derive(Clone)]
pub struct RtcPeerFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcPeerFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.ice_servers.clone())
    }
}

#[async_trait]
impl PeerFactory for RtcPeerFactory {
    async fn create(&self, events: PeerEvents) -> Result<Box<dyn PeerSession>, PeerError> {
        let session = RtcPeerSession::new(&self.ice_servers, events).await?;
        Ok(Box::new(session))
    }
}

/// Guards which events a session may still emit.
#[derive(Default)]
struct SessionFlags {
    destroyed: AtomicBool,
    finished: AtomicBool,
    stream_reported: AtomicBool,
}

impl SessionFlags {
    fn is_live(&self) -> bool {
        !self.destroyed.load(Ordering::SeqCst) && !self.finished.load(Ordering::SeqCst)
    }

    fn claim_stream(&self) -> bool {
        self.is_live() && !self.stream_reported.swap(true, Ordering::SeqCst)
    }

    fn claim_terminal(&self) -> bool {
        !self.destroyed.load(Ordering::SeqCst) && !self.finished.swap(true, Ordering::SeqCst)
    }
}

/// Receive-only peer connection answering a broadcaster's offer.
pub struct RtcPeerSession {
    generation: u64,
    peer_connection: Arc<RTCPeerConnection>,
    flags: Arc<SessionFlags>,
    answered: bool,
}

impl RtcPeerSession {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: PeerEvents,
    ) -> Result<Self, PeerError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let generation = events.generation();
        let flags = Arc::new(SessionFlags::default());

        let state_events = events.clone();
        let state_flags = flags.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                let flags = state_flags.clone();

                Box::pin(async move {
                    info!("Peer #{} connection state: {:?}", events.generation(), s);
                    let Some(kind) = event_for_state(s) else {
                        return;
                    };
                    let allowed = if kind.is_terminal() {
                        flags.claim_terminal()
                    } else {
                        flags.is_live()
                    };
                    if allowed {
                        events.emit(kind).await;
                    }
                })
            },
        ));

        let ice_events = events.clone();
        let ice_flags = flags.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            let flags = ice_flags.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                if flags.is_live() {
                    events
                        .emit(PeerEventKind::LocalCandidate(IceCandidate::from(init)))
                        .await;
                }
            })
        }));

        let track_events = events.clone();
        let track_flags = flags.clone();
        let media: Arc<Mutex<Option<MediaStream>>> = Arc::new(Mutex::new(None));
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                let flags = track_flags.clone();
                let media = media.clone();

                Box::pin(async move {
                    info!(
                        "Peer #{} received {:?} track '{}'",
                        events.generation(),
                        track.kind(),
                        track.id()
                    );

                    let mut slot = media.lock().await;
                    if let Some(stream) = slot.as_ref() {
                        stream.add_track(track).await;
                        return;
                    }

                    let stream = MediaStream::new(track.stream_id());
                    stream.add_track(track).await;
                    *slot = Some(stream.clone());
                    drop(slot);

                    if flags.claim_stream() {
                        events.emit(PeerEventKind::Stream(stream)).await;
                    }
                })
            },
        ));

        debug!("Peer #{} created", generation);

        Ok(Self {
            generation,
            peer_connection,
            flags,
            answered: false,
        })
    }
}

#[async_trait]
impl PeerSession for RtcPeerSession {
    async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, PeerError> {
        if self.flags.destroyed.load(Ordering::SeqCst) {
            return Err(PeerError::Destroyed);
        }
        if self.answered {
            return Err(PeerError::OfferAlreadyAccepted);
        }
        if offer.kind != SdpKind::Offer {
            return Err(PeerError::UnexpectedDescription(offer.kind));
        }
        self.answered = true;

        let desc = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;

        info!("Peer #{} produced answer", self.generation);
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        if self.flags.destroyed.load(Ordering::SeqCst) {
            return Err(PeerError::Destroyed);
        }
        if self.peer_connection.remote_description().await.is_none() {
            return Err(PeerError::NoRemoteDescription);
        }

        self.peer_connection
            .add_ice_candidate(candidate.into())
            .await?;
        Ok(())
    }

    async fn destroy(&mut self) {
        if self.flags.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!("Destroying peer #{}", self.generation);
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer #{}: {:?}", self.generation, e);
        }
    }
}

/// `Disconnected` is transient: ICE may still recover to `Connected` on its own.
fn event_for_state(state: RTCPeerConnectionState) -> Option<PeerEventKind> {
    match state {
        RTCPeerConnectionState::Connected => Some(PeerEventKind::Connected),
        RTCPeerConnectionState::Disconnected => Some(PeerEventKind::Interrupted),
        RTCPeerConnectionState::Failed => {
            Some(PeerEventKind::Error("peer connection failed".to_owned()))
        }
        RTCPeerConnectionState::Closed => Some(PeerEventKind::Closed),
        _ => None,
    }
}

impl Drop for RtcPeerSession {
    fn drop(&mut self) {
        if self.flags.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let pc = self.peer_connection.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = pc.close().await;
            });
        }
    }
}
