use periscope_core::SignalMessage;
use periscope_viewer::{ViewerEvent, ViewerState};

use crate::integration::{create_connected_viewer, init_tracing, test_config};
use crate::utils::{EventRecorder, join_and_ack, offer_message, STREAMER};

#[tokio::test]
async fn test_offer_failure_reports_error() {
    init_tracing();

    let (viewer, mut server, peers) = create_connected_viewer(test_config()).await;
    let mut recorder = EventRecorder::new(&viewer);
    peers.set_fail_accept(true);

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");
    server
        .push(offer_message("s1", STREAMER, "v=0 broken"))
        .await
        .expect("push failed");

    match recorder.next().await.expect("no error event") {
        ViewerEvent::Error { message, .. } => {
            assert!(
                message.starts_with("failed to answer offer"),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected error, got {:?}", other),
    }

    // No answer goes out; the server is told we left instead.
    match server.next_sent().await.expect("leave not sent") {
        SignalMessage::Leave { stream_id } => assert_eq!(stream_id, "s1"),
        other => panic!("expected leave, got {:?}", other),
    }
    assert_eq!(peers.peer(0).expect("peer missing").destroy_count(), 1);
    assert_eq!(viewer.state(), ViewerState::Idle);
}

#[tokio::test]
async fn test_peer_creation_failure_reports_error() {
    init_tracing();

    let (viewer, mut server, peers) = create_connected_viewer(test_config()).await;
    let mut recorder = EventRecorder::new(&viewer);
    peers.set_fail_create(true);

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");
    server
        .push(offer_message("s1", STREAMER, "v=0 offer"))
        .await
        .expect("push failed");

    match recorder.next().await.expect("no error event") {
        ViewerEvent::Error { message, .. } => {
            assert!(message.starts_with("failed to create peer connection"));
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(peers.created(), 0);
    assert_eq!(viewer.state(), ViewerState::Idle);
}
