
use periscope_viewer::{ReconnectPolicy, ViewerConfig, ViewerSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use crate::utils::{MockConnector, MockPeerFactory, MockServer};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> ViewerConfig {
    ViewerConfig::new("http://signaling.test")
        .with_ice_servers(vec![])
        .with_reconnect(ReconnectPolicy::disabled())
        .with_negotiation_timeout(Some(Duration::from_secs(10)))
}

pub fn create_test_viewer(config: ViewerConfig) -> (ViewerSession, MockServer, MockPeerFactory) {
    let (connector, server) = MockConnector::new();
    let peers = MockPeerFactory::new();

    let viewer = ViewerSession::with_parts(config, Arc::new(connector), Arc::new(peers.clone()));

    (viewer, server, peers)
}

/// Viewer that already completed `initialize()`.
pub async fn create_connected_viewer(
    config: ViewerConfig,
) -> (ViewerSession, MockServer, MockPeerFactory) {
    let (viewer, server, peers) = create_test_viewer(config);
    viewer.initialize().await.expect("initialize failed");
    (viewer, server, peers)
}
