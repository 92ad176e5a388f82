use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use webrtc::track::track_remote::TrackRemote;

/// Inbound media from the broadcaster.
///
/// Cloning is cheap; all clones see tracks that arrive after the stream was
/// first reported.
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Arc<RwLock<Vec<Arc<TrackRemote>>>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn tracks(&self) -> Vec<Arc<TrackRemote>> {
        self.tracks.read().await.clone()
    }

    pub async fn track_count(&self) -> usize {
        self.tracks.read().await.len()
    }

    pub(crate) async fn add_track(&self, track: Arc<TrackRemote>) {
        self.tracks.write().await.push(track);
    }

    /// True when both handles refer to the same underlying stream.
    pub fn same_stream(&self, other: &MediaStream) -> bool {
        Arc::ptr_eq(&self.tracks, &other.tracks)
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream").field("id", &self.id).finish()
    }
}
