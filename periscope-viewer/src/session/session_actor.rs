use crate::callbacks::{CallbackRegistry, ViewerEvent};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::peer::{PeerEvent, PeerEventKind, PeerFactory};
use crate::session::peer_slot::PeerSlot;
use crate::session::session_command::SessionCommand;
use crate::session::session_state::{SessionEnd, SessionSnapshot, ViewerState};
use crate::signaling::{SignalingConnector, SignalingOutput, TransportEvent};
use periscope_core::{IceCandidate, PeerId, SessionDescription, SignalMessage, StreamId};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

pub(crate) const STREAM_NOT_FOUND: &str = "Stream not found or not live";
pub(crate) const NEGOTIATION_TIMED_OUT: &str = "negotiation timed out";
pub(crate) const MAX_PENDING_CANDIDATES: usize = 64;

/// Owns all mutable viewer state and processes one input at a time.
pub(crate) struct SessionActor {
    config: ViewerConfig,
    connector: Arc<dyn SignalingConnector>,
    peers: Arc<dyn PeerFactory>,
    callbacks: CallbackRegistry,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: Option<mpsc::Receiver<TransportEvent>>,
    peer_tx: mpsc::Sender<PeerEvent>,
    peer_rx: mpsc::Receiver<PeerEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,

    signaling: Option<Arc<dyn SignalingOutput>>,
    transport_ready: bool,
    state: ViewerState,
    stream_id: Option<StreamId>,
    streamer_id: Option<PeerId>,
    peer: PeerSlot,
    pending_candidates: Vec<IceCandidate>,
    deadline: Option<Instant>,
    rejoin_target: Option<StreamId>,
}

impl SessionActor {
    pub fn new(
        config: ViewerConfig,
        connector: Arc<dyn SignalingConnector>,
        peers: Arc<dyn PeerFactory>,
        callbacks: CallbackRegistry,
        command_rx: mpsc::Receiver<SessionCommand>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let (peer_tx, peer_rx) = mpsc::channel(256);

        Self {
            config,
            connector,
            peers,
            callbacks,
            command_rx,
            transport_rx: None,
            peer_tx,
            peer_rx,
            snapshot_tx,
            signaling: None,
            transport_ready: false,
            state: ViewerState::Idle,
            stream_id: None,
            streamer_id: None,
            peer: PeerSlot::new(),
            pending_candidates: Vec::new(),
            deadline: None,
            rejoin_target: None,
        }
    }

    pub async fn run(mut self) {
        info!("Viewer session loop started");

        loop {
            let deadline = self.deadline;

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Viewer handle dropped. Shutting down session.");
                            break;
                        }
                    }
                }

                evt = next_transport_event(&mut self.transport_rx) => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => self.handle_transport_event(TransportEvent::Closed).await,
                    }
                }

                Some(evt) = self.peer_rx.recv() => self.handle_peer_event(evt).await,

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_negotiation_timeout().await;
                }
            }

            self.publish();
        }

        self.shutdown().await;
        self.publish();
        info!("Viewer session loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Initialize { reply } => {
                let result = self.initialize().await;
                let _ = reply.send(result);
            }
            SessionCommand::Join { stream_id, reply } => {
                let result = self.join(stream_id).await;
                let _ = reply.send(result);
            }
            SessionCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
            SessionCommand::Disconnect { reply } => {
                info!("Disconnecting viewer");
                self.shutdown().await;
                let _ = reply.send(());
            }
        }
    }

    async fn initialize(&mut self) -> Result<(), ViewerError> {
        if self.signaling.is_some() && self.transport_ready {
            debug!("initialize(): already connected");
            return Ok(());
        }

        // A transport stuck in its reconnect loop is replaced by a fresh dial.
        self.drop_transport().await;

        self.state = ViewerState::Connecting;
        self.publish();

        let (events_tx, events_rx) = mpsc::channel(256);
        match self.connector.connect(events_tx).await {
            Ok(signaling) => {
                info!("Viewer connected to signaling server");
                self.signaling = Some(signaling);
                self.transport_rx = Some(events_rx);
                self.transport_ready = true;
                self.state = ViewerState::Idle;
                Ok(())
            }
            Err(e) => {
                error!("Viewer failed to connect to signaling server: {}", e);
                self.state = ViewerState::Idle;
                Err(e.into())
            }
        }
    }

    async fn join(&mut self, stream_id: StreamId) -> Result<(), ViewerError> {
        if stream_id.is_empty() {
            return Err(ViewerError::InvalidStreamId);
        }
        let Some(signaling) = self.signaling.clone() else {
            return Err(ViewerError::NotInitialized);
        };
        if !self.transport_ready {
            return Err(ViewerError::NotConnected);
        }

        if self.stream_id.as_ref() == Some(&stream_id) {
            debug!("Already joined stream {}", stream_id);
            return Ok(());
        }
        if let Some(current) = self.stream_id.clone() {
            info!("Switching from stream {} to {}", current, stream_id);
            self.leave().await;
        }

        info!("Joining stream {}", stream_id);
        self.stream_id = Some(stream_id.clone());
        self.state = ViewerState::Joining;
        self.deadline = self.config.negotiation_timeout.map(|t| Instant::now() + t);
        self.publish();

        if let Err(e) = signaling.send_join(stream_id.clone()).await {
            error!("Failed to send join for stream {}: {}", stream_id, e);
            self.reset().await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn leave(&mut self) {
        let Some(stream_id) = self.stream_id.clone() else {
            debug!("leave_stream(): no stream joined");
            return;
        };

        info!("Leaving stream {}", stream_id);
        self.send_leave(&stream_id).await;
        self.reset().await;
    }

    async fn shutdown(&mut self) {
        self.leave().await;
        self.rejoin_target = None;
        self.drop_transport().await;
    }

    async fn drop_transport(&mut self) {
        self.transport_rx = None;
        self.transport_ready = false;
        if let Some(signaling) = self.signaling.take() {
            signaling.close().await;
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(msg) => self.handle_signal(msg).await,

            TransportEvent::Disconnected(reason) => {
                warn!("Signaling transport disconnected: {}", reason);
                self.transport_ready = false;
                if self.config.rejoin_on_reconnect {
                    self.rejoin_target = self.stream_id.clone();
                }
                self.end_session(SessionEnd::TransportLost).await;
            }

            TransportEvent::Reconnected => {
                info!("Signaling transport reconnected");
                self.transport_ready = true;
                if let Some(stream_id) = self.rejoin_target.take() {
                    info!("Rejoining stream {} after reconnect", stream_id);
                    if let Err(e) = self.join(stream_id).await {
                        warn!("Rejoin after reconnect failed: {}", e);
                    }
                }
            }

            TransportEvent::Closed => {
                if self.signaling.is_none() && self.transport_rx.is_none() {
                    return;
                }
                warn!("Signaling transport closed");
                self.transport_rx = None;
                self.transport_ready = false;
                self.signaling = None;
                self.rejoin_target = None;
                self.end_session(SessionEnd::TransportLost).await;
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        if self.stream_id.as_ref() != Some(msg.stream_id()) {
            debug!(
                "Ignoring {} for stream {} (current: {:?})",
                msg.event_name(),
                msg.stream_id(),
                self.stream_id
            );
            return;
        }

        match msg {
            SignalMessage::JoinAck {
                stream_id,
                streamer_id,
            } => {
                if self.state != ViewerState::Joining {
                    debug!("Duplicate join-ack for stream {}", stream_id);
                    return;
                }
                info!("Joined stream {} (streamer {})", stream_id, streamer_id);
                self.streamer_id = Some(streamer_id);
                self.state = ViewerState::Joined;
            }

            SignalMessage::NotFound { stream_id } => {
                warn!("Stream {} not found or not live", stream_id);
                self.end_session(SessionEnd::Rejected(STREAM_NOT_FOUND.to_owned()))
                    .await;
            }

            SignalMessage::Offer {
                stream_id,
                from_id,
                offer,
            } => self.handle_offer(stream_id, from_id, offer).await,

            SignalMessage::Answer { stream_id, .. } => {
                warn!("Ignoring answer for stream {}: viewers never offer", stream_id);
            }

            SignalMessage::IceCandidate { candidate, .. } => {
                self.handle_remote_candidate(candidate).await;
            }

            SignalMessage::StreamEnded { stream_id } => {
                info!("Broadcaster ended stream {}", stream_id);
                self.end_session(SessionEnd::Ended).await;
            }

            SignalMessage::ViewerCount { stream_id, count } => {
                debug!("Stream {} has {} viewers", stream_id, count);
                self.callbacks
                    .dispatch(ViewerEvent::ViewerCount { stream_id, count });
            }

            msg @ (SignalMessage::Join { .. } | SignalMessage::Leave { .. }) => {
                warn!("Ignoring client-only {} sent by server", msg.event_name());
            }
        }
    }

    async fn handle_offer(
        &mut self,
        stream_id: StreamId,
        from_id: PeerId,
        offer: SessionDescription,
    ) {
        info!(
            "Received offer from streamer {} for stream {}",
            from_id, stream_id
        );
        self.streamer_id = Some(from_id.clone());
        self.state = ViewerState::Negotiating;
        if self.deadline.is_none() {
            self.deadline = self.config.negotiation_timeout.map(|t| Instant::now() + t);
        }
        self.publish();

        if let Err(e) = self.peer.replace(self.peers.as_ref(), &self.peer_tx).await {
            self.end_session(SessionEnd::Failed(format!(
                "failed to create peer connection: {e}"
            )))
            .await;
            return;
        }

        let answer = match self.peer.accept_offer(offer).await {
            Ok(answer) => answer,
            Err(e) => {
                self.end_session(SessionEnd::Failed(format!("failed to answer offer: {e}")))
                    .await;
                return;
            }
        };

        let buffered = std::mem::take(&mut self.pending_candidates);
        if !buffered.is_empty() {
            debug!("Applying {} buffered ICE candidates", buffered.len());
        }
        for candidate in buffered {
            if let Err(e) = self.peer.apply_candidate(candidate).await {
                warn!("Failed to apply buffered ICE candidate: {}", e);
            }
        }

        let Some(signaling) = self.signaling.clone() else {
            return;
        };
        if let Err(e) = signaling
            .send_answer(stream_id.clone(), from_id, answer)
            .await
        {
            self.end_session(SessionEnd::Failed(format!("failed to send answer: {e}")))
                .await;
            return;
        }
        info!("Answer sent for stream {}", stream_id);
    }

    async fn handle_remote_candidate(&mut self, candidate: IceCandidate) {
        if !self.peer.is_answered() {
            if self.pending_candidates.len() >= MAX_PENDING_CANDIDATES {
                warn!(
                    "Dropping ICE candidate: {} already buffered before the offer",
                    MAX_PENDING_CANDIDATES
                );
                return;
            }
            debug!("Buffering ICE candidate until the offer arrives");
            self.pending_candidates.push(candidate);
            return;
        }

        if let Err(e) = self.peer.apply_candidate(candidate).await {
            warn!("Failed to add ICE candidate: {}", e);
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        if !self.peer.is_current(event.generation) {
            debug!("Dropping event from stale peer #{}", event.generation);
            return;
        }
        let Some(stream_id) = self.stream_id.clone() else {
            return;
        };

        match event.kind {
            PeerEventKind::LocalCandidate(candidate) => {
                let Some(signaling) = self.signaling.clone() else {
                    return;
                };
                if let Err(e) = signaling
                    .send_ice(stream_id, self.streamer_id.clone(), candidate)
                    .await
                {
                    debug!("Local ICE candidate not sent: {}", e);
                }
            }

            PeerEventKind::Connected => {
                info!("Peer connected to streamer for stream {}", stream_id);
            }

            PeerEventKind::Interrupted => {
                warn!(
                    "Peer connectivity for stream {} interrupted, waiting for recovery",
                    stream_id
                );
            }

            PeerEventKind::Stream(media) => {
                if !self.peer.claim_stream(event.generation) {
                    debug!("Peer #{} already delivered its stream", event.generation);
                    return;
                }
                info!("Receiving media for stream {}", stream_id);
                self.state = ViewerState::Streaming;
                self.deadline = None;
                self.publish();
                self.callbacks.dispatch(ViewerEvent::Stream {
                    stream_id,
                    stream: media,
                });
            }

            PeerEventKind::Closed => {
                info!("Peer connection for stream {} closed", stream_id);
                self.end_session(SessionEnd::Ended).await;
            }

            PeerEventKind::Error(reason) => {
                error!("Peer error on stream {}: {}", stream_id, reason);
                self.end_session(SessionEnd::Failed(reason)).await;
            }
        }
    }

    async fn handle_negotiation_timeout(&mut self) {
        self.deadline = None;
        if !matches!(
            self.state,
            ViewerState::Joining | ViewerState::Joined | ViewerState::Negotiating
        ) {
            return;
        }

        warn!("Negotiation for stream {:?} timed out", self.stream_id);
        self.end_session(SessionEnd::Failed(NEGOTIATION_TIMED_OUT.to_owned()))
            .await;
    }

    /// Tears the joined stream down and tells the consumer why.
    async fn end_session(&mut self, end: SessionEnd) {
        let Some(stream_id) = self.stream_id.clone() else {
            return;
        };

        if let SessionEnd::Failed(_) = &end {
            self.send_leave(&stream_id).await;
        }
        self.reset().await;

        match end {
            SessionEnd::Ended | SessionEnd::TransportLost => {
                info!("Stream {} disconnected", stream_id);
                self.callbacks
                    .dispatch(ViewerEvent::Disconnected { stream_id });
            }
            SessionEnd::Rejected(message) | SessionEnd::Failed(message) => {
                warn!("Stream {} failed: {}", stream_id, message);
                self.callbacks.dispatch(ViewerEvent::Error {
                    stream_id: Some(stream_id),
                    message,
                });
            }
        }
    }

    async fn send_leave(&self, stream_id: &StreamId) {
        let Some(signaling) = &self.signaling else {
            return;
        };
        if !self.transport_ready {
            return;
        }
        if let Err(e) = signaling.send_leave(stream_id.clone()).await {
            debug!("Leave for stream {} not delivered: {}", stream_id, e);
        }
    }

    /// Back to idle without notifying anyone.
    async fn reset(&mut self) {
        self.peer.clear().await;
        self.stream_id = None;
        self.streamer_id = None;
        self.pending_candidates.clear();
        self.deadline = None;
        self.state = ViewerState::Idle;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            state: self.state,
            stream_id: self.stream_id.clone(),
            streamer_id: self.streamer_id.clone(),
            transport_ready: self.transport_ready,
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

async fn next_transport_event(
    rx: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
