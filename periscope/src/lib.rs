pub use periscope_core::model::{PeerId, StreamId};

pub mod model {
    pub use periscope_core::model::*;
}

pub mod utils {
    pub use periscope_core::utils::*;
}

#[cfg(feature = "viewer")]
pub mod viewer {
    pub use periscope_viewer::*;
}
