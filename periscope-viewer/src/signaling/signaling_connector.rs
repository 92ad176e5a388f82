use crate::error::TransportError;
use crate::signaling::{SignalingOutput, TransportEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opens signaling connections for a viewer session.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    /// Resolves once the connection is usable. Everything received afterwards,
    /// including drops and reconnects, is reported on `events`.
    async fn connect(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn SignalingOutput>, TransportError>;
}
