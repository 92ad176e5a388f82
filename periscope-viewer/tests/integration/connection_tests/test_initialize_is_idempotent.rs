use periscope_viewer::ViewerState;

use crate::integration::{create_test_viewer, init_tracing, test_config};

#[tokio::test]
async fn test_initialize_is_idempotent() {
    init_tracing();

    let (viewer, server, _peers) = create_test_viewer(test_config());
    assert_eq!(viewer.state(), ViewerState::Idle);
    assert!(!viewer.snapshot().transport_ready);

    viewer.initialize().await.expect("first initialize failed");
    viewer.initialize().await.expect("second initialize failed");

    assert_eq!(server.connect_count(), 1, "should dial only once");
    let snapshot = viewer.snapshot();
    assert!(snapshot.transport_ready);
    assert_eq!(snapshot.state, ViewerState::Idle);
    assert!(!viewer.is_stream_connected());
}
