mod signaling_connector;
mod signaling_output;
mod transport_event;
mod ws_transport;

pub use signaling_connector::SignalingConnector;
pub use signaling_output::SignalingOutput;
pub use transport_event::TransportEvent;
pub use ws_transport::WsConnector;
