use crate::callbacks::{CallbackRegistry, ViewerEvent};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::peer::{MediaStream, PeerFactory, RtcPeerFactory};
use crate::session::session_actor::SessionActor;
use crate::session::session_command::SessionCommand;
use crate::session::session_state::{SessionSnapshot, ViewerState};
use crate::signaling::{SignalingConnector, WsConnector};
use periscope_core::{PeerId, StreamId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::debug;

/// Client handle for watching one live stream at a time.
///
/// All work happens on a background task; this handle only forwards requests
/// and reads the latest published [`SessionSnapshot`]. Dropping the last
/// handle leaves the current stream and closes the signaling connection.
///
/// Must be created inside a Tokio runtime.
pub struct ViewerSession {
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    callbacks: CallbackRegistry,
}

impl ViewerSession {
    /// Session backed by the WebSocket signaling client and WebRTC peers.
    pub fn new(config: ViewerConfig) -> Self {
        let connector = Arc::new(WsConnector::new(config.clone()));
        let peers = Arc::new(RtcPeerFactory::from_config(&config));
        Self::with_parts(config, connector, peers)
    }

    pub fn with_parts(
        config: ViewerConfig,
        connector: Arc<dyn SignalingConnector>,
        peers: Arc<dyn PeerFactory>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let callbacks = CallbackRegistry::new();

        let actor = SessionActor::new(
            config,
            connector,
            peers,
            callbacks.clone(),
            command_rx,
            snapshot_tx,
        );
        tokio::spawn(actor.run());

        Self {
            command_tx,
            snapshot_rx,
            callbacks,
        }
    }

    /// Connects to the signaling server. Returns immediately when already connected.
    pub async fn initialize(&self) -> Result<(), ViewerError> {
        self.request(|reply| SessionCommand::Initialize { reply })
            .await?
    }

    /// Requests to watch `stream_id`, leaving any other stream first.
    ///
    /// Returns once the join was sent; the outcome arrives through the
    /// stream or error callbacks.
    pub async fn join_stream(&self, stream_id: impl Into<StreamId>) -> Result<(), ViewerError> {
        let stream_id = stream_id.into();
        self.request(|reply| SessionCommand::Join { stream_id, reply })
            .await?
    }

    /// Leaves the current stream, if any. No callback fires.
    pub async fn leave_stream(&self) {
        if let Err(e) = self.request(|reply| SessionCommand::Leave { reply }).await {
            debug!("leave_stream(): {}", e);
        }
    }

    /// Leaves the current stream and closes the signaling connection.
    pub async fn disconnect(&self) {
        if let Err(e) = self
            .request(|reply| SessionCommand::Disconnect { reply })
            .await
        {
            debug!("disconnect(): {}", e);
        }
    }

    pub fn is_stream_connected(&self) -> bool {
        self.snapshot_rx.borrow().state.is_joined()
    }

    pub fn stream_id(&self) -> Option<StreamId> {
        self.snapshot_rx.borrow().stream_id.clone()
    }

    pub fn streamer_id(&self) -> Option<PeerId> {
        self.snapshot_rx.borrow().streamer_id.clone()
    }

    pub fn state(&self) -> ViewerState {
        self.snapshot_rx.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that changes with every state transition.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.callbacks.subscribe()
    }

    pub fn set_on_stream<F>(&self, f: F)
    where
        F: Fn(MediaStream) + Send + Sync + 'static,
    {
        self.callbacks.set_on_stream(f);
    }

    pub fn set_on_disconnect<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.set_on_disconnect(f);
    }

    pub fn set_on_viewer_count<F>(&self, f: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.callbacks.set_on_viewer_count(f);
    }

    pub fn set_on_error<F>(&self, f: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.callbacks.set_on_error(f);
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, ViewerError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| ViewerError::SessionClosed)?;
        response.await.map_err(|_| ViewerError::SessionClosed)
    }
}
