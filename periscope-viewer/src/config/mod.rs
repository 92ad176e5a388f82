mod reconnect_policy;
mod viewer_config;

pub use reconnect_policy::ReconnectPolicy;
pub use viewer_config::{ENDPOINT_ENV, ViewerConfig};
