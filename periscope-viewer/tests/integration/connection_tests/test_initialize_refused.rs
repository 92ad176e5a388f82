use periscope_viewer::{TransportError, ViewerError, ViewerState};

use crate::integration::{create_test_viewer, init_tracing, test_config};
use crate::utils::{CallbackLog, EventRecorder};

#[tokio::test]
async fn test_initialize_refused() {
    init_tracing();

    let (viewer, server, _peers) = create_test_viewer(test_config());
    let log = CallbackLog::attach(&viewer);
    let mut recorder = EventRecorder::new(&viewer);
    server.set_refuse(true);

    let result = viewer.initialize().await;
    assert!(
        matches!(
            result,
            Err(ViewerError::Transport(TransportError::Refused(_)))
        ),
        "unexpected result: {:?}",
        result
    );
    assert_eq!(viewer.state(), ViewerState::Idle);
    assert!(!viewer.snapshot().transport_ready);

    // Connection failures surface through the return value only.
    recorder.expect_none().await.expect("no event expected");
    assert!(log.entries().is_empty());

    // A later attempt can still succeed.
    server.set_refuse(false);
    viewer.initialize().await.expect("retry failed");
    assert!(viewer.snapshot().transport_ready);
}
