use periscope_core::SignalMessage;
use periscope_viewer::peer::RtcPeerFactory;
use periscope_viewer::{ViewerEvent, ViewerSession, ViewerState};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{init_tracing, test_config};
use crate::utils::{
    EventRecorder, MockConnector, STREAMER, TestBroadcaster, join_and_ack, offer_message,
};

/// Timeout for media to arrive over a real connection (ms).
const MEDIA_TIMEOUT_MS: u64 = 15000;

#[tokio::test]
async fn test_end_to_end_media() {
    init_tracing();

    let (connector, mut server) = MockConnector::new();
    let viewer = ViewerSession::with_parts(
        test_config(),
        Arc::new(connector),
        Arc::new(RtcPeerFactory::new(vec![])),
    );
    let mut recorder = EventRecorder::new(&viewer);
    viewer.initialize().await.expect("initialize failed");

    let mut broadcaster = TestBroadcaster::new()
        .await
        .expect("Failed to create broadcaster");

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");

    let offer = broadcaster.create_offer().await.expect("Failed to offer");
    server
        .push(offer_message("s1", STREAMER, &offer))
        .await
        .expect("push failed");

    let answer = match server
        .wait_for_sent(|m| matches!(m, SignalMessage::Answer { .. }))
        .await
        .expect("no answer")
    {
        SignalMessage::Answer { answer, .. } => answer,
        other => panic!("expected answer, got {:?}", other),
    };
    broadcaster
        .set_remote_answer(answer.sdp)
        .await
        .expect("Broadcaster rejected the answer");

    // Trickle candidates both ways and push frames until media shows up.
    let stream = tokio::time::timeout(Duration::from_millis(MEDIA_TIMEOUT_MS), async {
        loop {
            for sent in server.drain_sent() {
                if let SignalMessage::IceCandidate { candidate, .. } = sent {
                    broadcaster
                        .add_remote_candidate(candidate)
                        .await
                        .expect("Broadcaster rejected candidate");
                }
            }
            for candidate in broadcaster.drain_candidates() {
                server
                    .push(SignalMessage::IceCandidate {
                        stream_id: "s1".into(),
                        candidate,
                        target_id: None,
                    })
                    .await
                    .expect("push failed");
            }

            let _ = broadcaster.write_frame().await;

            match recorder.poll(30).await {
                Some(ViewerEvent::Stream { stream, .. }) => return stream,
                Some(ViewerEvent::Error { message, .. }) => panic!("viewer failed: {}", message),
                _ => {}
            }
        }
    })
    .await
    .expect("media never arrived");

    assert_eq!(viewer.state(), ViewerState::Streaming);
    assert!(stream.track_count().await >= 1);

    viewer.leave_stream().await;
    assert_eq!(viewer.state(), ViewerState::Idle);
    broadcaster.close().await.expect("Failed to close broadcaster");
}
