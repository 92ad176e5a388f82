use periscope_viewer::{ViewerEvent, ViewerState};

use crate::integration::{create_connected_viewer, init_tracing, test_config};
use crate::utils::{EventRecorder, join_and_ack, offer_and_answer, sync};

#[tokio::test]
async fn test_reoffer_replaces_peer() {
    init_tracing();

    let (viewer, mut server, peers) = create_connected_viewer(test_config()).await;
    let mut recorder = EventRecorder::new(&viewer);

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");
    offer_and_answer(&mut server, "s1", "v=0 offer-1")
        .await
        .expect("no first answer");

    let first = peers.peer(0).expect("first peer missing");
    first.emit_stream("media-1").await;
    assert!(matches!(
        recorder.next().await.expect("no stream"),
        ViewerEvent::Stream { .. }
    ));

    // The broadcaster renegotiates.
    let (_, answer) = offer_and_answer(&mut server, "s1", "v=0 offer-2")
        .await
        .expect("no second answer");
    assert_eq!(answer.sdp, "mock-answer-2");
    assert_eq!(peers.created(), 2);
    assert_eq!(first.destroy_count(), 1, "old peer must be released");
    assert_eq!(viewer.state(), ViewerState::Negotiating);

    let second = peers.peer(1).expect("second peer missing");
    assert_eq!(second.offers()[0].sdp, "v=0 offer-2");
    assert_eq!(second.destroy_count(), 0);

    // Late events of the replaced peer are dropped.
    first.emit_stream("media-stale").await;
    first.emit_error("stale failure").await;
    let seen = sync(&server, &mut recorder, "s1").await.expect("sync failed");
    assert!(seen.is_empty(), "stale events leaked: {:?}", seen);
    assert_eq!(viewer.state(), ViewerState::Negotiating);

    second.emit_stream("media-2").await;
    match recorder.next().await.expect("no stream from new peer") {
        ViewerEvent::Stream { stream, .. } => assert_eq!(stream.id(), "media-2"),
        other => panic!("expected stream, got {:?}", other),
    }
    assert_eq!(viewer.state(), ViewerState::Streaming);
}
