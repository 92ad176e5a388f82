use crate::config::{ReconnectPolicy, ViewerConfig};
use crate::error::TransportError;
use crate::signaling::{SignalingConnector, SignalingOutput, TransportEvent};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use periscope_core::SignalMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the signaling server over a WebSocket and keeps the link alive.
#[derive(Clone)]
pub struct WsConnector {
    config: ViewerConfig,
}

impl WsConnector {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn SignalingOutput>, TransportError> {
        let url = self.config.websocket_url()?;
        info!("Connecting to signaling server {}", url);

        let stream = dial(&url, self.config.connect_timeout).await?;
        info!("Signaling connected: {}", url);

        let shared = Arc::new(LinkShared {
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let link = WsLink {
            url,
            connect_timeout: self.config.connect_timeout,
            policy: self.config.reconnect.clone(),
            shared: shared.clone(),
            events,
            outbound_rx,
        };
        tokio::spawn(link.run(stream));

        Ok(Arc::new(WsSignaling {
            outbound_tx,
            shared,
        }))
    }
}

async fn dial(url: &Url, timeout: Duration) -> Result<WsStream, TransportError> {
    match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(TransportError::Refused(e.to_string())),
        Err(_) => Err(TransportError::Timeout(timeout)),
    }
}

struct LinkShared {
    connected: AtomicBool,
    closed: AtomicBool,
    shutdown: Notify,
}

struct Outbound {
    event: &'static str,
    json: String,
}

struct WsSignaling {
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    shared: Arc<LinkShared>,
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }

        let json = serde_json::to_string(&msg)?;
        self.outbound_tx
            .send(Outbound {
                event: msg.event_name(),
                json,
            })
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            self.shared.shutdown.notify_one();
        }
    }
}

enum LinkExit {
    Shutdown,
    Lost(String),
}

/// Background task owning the socket: pumps frames both ways and redials on drops.
struct WsLink {
    url: Url,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
    shared: Arc<LinkShared>,
    events: mpsc::Sender<TransportEvent>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl WsLink {
    async fn run(mut self, mut stream: WsStream) {
        loop {
            match self.pump(&mut stream).await {
                LinkExit::Shutdown => {
                    while let Ok(frame) = self.outbound_rx.try_recv() {
                        debug!("WS OUT (flush): {}", frame.event);
                        if stream.send(Message::Text(frame.json)).await.is_err() {
                            break;
                        }
                    }
                    let _ = stream.close(None).await;
                    break;
                }
                LinkExit::Lost(reason) => {
                    self.shared.connected.store(false, Ordering::SeqCst);
                    warn!("Signaling connection to {} lost: {}", self.url, reason);

                    if !self.emit(TransportEvent::Disconnected(reason)).await {
                        break;
                    }

                    let Some(next) = self.redial().await else {
                        break;
                    };
                    stream = next;

                    let mut stale = 0usize;
                    while self.outbound_rx.try_recv().is_ok() {
                        stale += 1;
                    }
                    if stale > 0 {
                        debug!("Dropped {} frames queued before the reconnect", stale);
                    }

                    self.shared.connected.store(true, Ordering::SeqCst);
                    info!("Signaling reconnected: {}", self.url);
                    if !self.emit(TransportEvent::Reconnected).await {
                        break;
                    }
                }
            }
        }

        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.closed.store(true, Ordering::SeqCst);
        self.emit(TransportEvent::Closed).await;
        info!("Signaling transport for {} stopped", self.url);
    }

    async fn pump(&mut self, stream: &mut WsStream) -> LinkExit {
        loop {
            tokio::select! {
                _ = self.shared.shutdown.notified() => return LinkExit::Shutdown,

                outbound = self.outbound_rx.recv() => {
                    let Some(frame) = outbound else {
                        return LinkExit::Shutdown;
                    };
                    debug!("WS OUT: {}", frame.event);
                    if let Err(e) = stream.send(Message::Text(frame.json)).await {
                        return LinkExit::Lost(e.to_string());
                    }
                }

                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if !self.handle_text(&text).await {
                            return LinkExit::Shutdown;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => {
                            if !self.handle_text(&text).await {
                                return LinkExit::Shutdown;
                            }
                        }
                        Err(_) => warn!("Ignoring non UTF-8 binary frame from signaling server"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("closed by server: {}", f.reason))
                            .unwrap_or_else(|| "closed by server".to_owned());
                        return LinkExit::Lost(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return LinkExit::Lost(e.to_string()),
                    None => return LinkExit::Lost("connection closed".to_owned()),
                },
            }
        }
    }

    /// Returns `false` once nobody listens for transport events anymore.
    async fn handle_text(&self, text: &str) -> bool {
        match serde_json::from_str::<SignalMessage>(text) {
            Ok(msg) => {
                debug!("WS IN: {}", msg.event_name());
                self.emit(TransportEvent::Message(msg)).await
            }
            Err(e) => {
                warn!("Invalid SignalMessage from server: {}. Text: {}", e, text);
                true
            }
        }
    }

    async fn redial(&mut self) -> Option<WsStream> {
        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay_for(attempt);
            info!(
                "Reconnecting to {} in {:?} (attempt {}/{})",
                self.url, delay, attempt, self.policy.max_attempts
            );

            let url = self.url.clone();
            let timeout = self.connect_timeout;
            let attempt_result = tokio::select! {
                _ = self.shared.shutdown.notified() => return None,
                result = async move {
                    tokio::time::sleep(delay).await;
                    dial(&url, timeout).await
                } => result,
            };

            match attempt_result {
                Ok(stream) => return Some(stream),
                Err(e) => warn!("Reconnect attempt {} failed: {}", attempt, e),
            }
        }

        error!(
            "Giving up on signaling server {} after {} attempts",
            self.url, self.policy.max_attempts
        );
        None
    }

    async fn emit(&self, event: TransportEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("Viewer session no longer listens to transport events");
            return false;
        }
        true
    }
}
