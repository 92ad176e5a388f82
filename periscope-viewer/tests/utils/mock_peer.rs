use anyhow::{Context, Result};
use async_trait::async_trait;
use periscope_core::{IceCandidate, SessionDescription};
use periscope_viewer::peer::{MediaStream, PeerEventKind, PeerEvents, PeerFactory, PeerSession};
use periscope_viewer::PeerError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

#[derive(Default)]
struct PeerRecord {
    offers: Vec<SessionDescription>,
    candidates: Vec<IceCandidate>,
    destroy_count: usize,
}

/// Test-side view of one peer session handed to the viewer.
#[derive(Clone)]
pub struct MockPeerHandle {
    events: PeerEvents,
    record: Arc<Mutex<PeerRecord>>,
}

impl MockPeerHandle {
    pub fn generation(&self) -> u64 {
        self.events.generation()
    }

    pub fn offers(&self) -> Vec<SessionDescription> {
        self.record.lock().unwrap().offers.clone()
    }

    pub fn candidates(&self) -> Vec<IceCandidate> {
        self.record.lock().unwrap().candidates.clone()
    }

    pub fn destroy_count(&self) -> usize {
        self.record.lock().unwrap().destroy_count
    }

    pub async fn emit_stream(&self, id: &str) {
        self.events
            .emit(PeerEventKind::Stream(MediaStream::new(id)))
            .await;
    }

    pub async fn emit_local_candidate(&self, candidate: IceCandidate) {
        self.events
            .emit(PeerEventKind::LocalCandidate(candidate))
            .await;
    }

    pub async fn emit_connected(&self) {
        self.events.emit(PeerEventKind::Connected).await;
    }

    pub async fn emit_interrupted(&self) {
        self.events.emit(PeerEventKind::Interrupted).await;
    }

    pub async fn emit_closed(&self) {
        self.events.emit(PeerEventKind::Closed).await;
    }

    pub async fn emit_error(&self, reason: &str) {
        self.events
            .emit(PeerEventKind::Error(reason.to_owned()))
            .await;
    }
}

struct MockPeerSession {
    handle: MockPeerHandle,
    fail_accept: bool,
}

#[async_trait]
impl PeerSession for MockPeerSession {
    async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, PeerError> {
        let mut record = self.handle.record.lock().unwrap();
        if record.destroy_count > 0 {
            return Err(PeerError::Destroyed);
        }
        if !record.offers.is_empty() {
            return Err(PeerError::OfferAlreadyAccepted);
        }
        record.offers.push(offer);

        if self.fail_accept {
            return Err(PeerError::Rtc(webrtc::Error::ErrConnectionClosed));
        }
        Ok(SessionDescription::answer(format!(
            "mock-answer-{}",
            self.handle.generation()
        )))
    }

    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        let mut record = self.handle.record.lock().unwrap();
        if record.offers.is_empty() {
            return Err(PeerError::NoRemoteDescription);
        }
        record.candidates.push(candidate);
        Ok(())
    }

    async fn destroy(&mut self) {
        self.handle.record.lock().unwrap().destroy_count += 1;
    }
}

#[derive(Default)]
struct FactoryState {
    peers: Vec<MockPeerHandle>,
    fail_create: bool,
    fail_accept: bool,
}

/// Peer factory whose sessions only record what the viewer asks of them.
#[derive(Clone, Default)]
pub struct MockPeerFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockPeerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn set_fail_accept(&self, fail: bool) {
        self.state.lock().unwrap().fail_accept = fail;
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }

    pub fn peer(&self, index: usize) -> Option<MockPeerHandle> {
        self.state.lock().unwrap().peers.get(index).cloned()
    }

    /// Waits until the `index`-th session (zero based) was created.
    pub async fn wait_for_peer(&self, index: usize) -> Result<MockPeerHandle> {
        tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), async {
            loop {
                if let Some(peer) = self.peer(index) {
                    return peer;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .context("peer session was never created")
    }
}

#[async_trait]
impl PeerFactory for MockPeerFactory {
    async fn create(&self, events: PeerEvents) -> Result<Box<dyn PeerSession>, PeerError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(PeerError::Rtc(webrtc::Error::ErrConnectionClosed));
        }

        let handle = MockPeerHandle {
            events,
            record: Arc::new(Mutex::new(PeerRecord::default())),
        };
        state.peers.push(handle.clone());
        tracing::debug!("[MockPeer] created peer #{}", handle.generation());

        Ok(Box::new(MockPeerSession {
            handle,
            fail_accept: state.fail_accept,
        }))
    }
}
