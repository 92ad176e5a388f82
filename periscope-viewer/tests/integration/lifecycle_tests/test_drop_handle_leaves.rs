use periscope_core::SignalMessage;

use crate::integration::{create_connected_viewer, init_tracing, test_config};
use crate::utils::join_and_ack;

#[tokio::test]
async fn test_drop_handle_leaves() {
    init_tracing();

    let (viewer, mut server, _peers) = create_connected_viewer(test_config()).await;

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");

    drop(viewer);

    match server.next_sent().await.expect("leave not sent") {
        SignalMessage::Leave { stream_id } => assert_eq!(stream_id, "s1"),
        other => panic!("expected leave, got {:?}", other),
    }

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while server.close_count() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("transport never closed");
}

#[tokio::test]
async fn test_disconnect_closes_transport() {
    init_tracing();

    let (viewer, mut server, _peers) = create_connected_viewer(test_config()).await;

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");

    viewer.disconnect().await;

    assert!(matches!(
        server.next_sent().await.expect("leave not sent"),
        SignalMessage::Leave { .. }
    ));
    assert_eq!(server.close_count(), 1);
    assert!(!viewer.snapshot().transport_ready);
    assert!(matches!(
        viewer.join_stream("s1").await,
        Err(periscope_viewer::ViewerError::NotInitialized)
    ));

    // Reconnecting dials again.
    viewer.initialize().await.expect("initialize failed");
    assert_eq!(server.connect_count(), 2);
}
