use crate::error::ViewerError;
use periscope_core::StreamId;
use tokio::sync::oneshot;

/// Requests from the [`crate::ViewerSession`] handle to its actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Initialize {
        reply: oneshot::Sender<Result<(), ViewerError>>,
    },

    Join {
        stream_id: StreamId,
        reply: oneshot::Sender<Result<(), ViewerError>>,
    },

    Leave { reply: oneshot::Sender<()> },

    /// Leave the stream and close the signaling transport.
    Disconnect { reply: oneshot::Sender<()> },
}
