use periscope_viewer::ViewerEvent;

use crate::integration::{create_connected_viewer, init_tracing, test_config};
use crate::utils::{CallbackLog, EventRecorder, join_and_ack, offer_and_answer, sync};

#[tokio::test]
async fn test_stream_delivered_once() {
    init_tracing();

    let (viewer, mut server, peers) = create_connected_viewer(test_config()).await;
    let log = CallbackLog::attach(&viewer);
    let mut recorder = EventRecorder::new(&viewer);

    join_and_ack(&viewer, &mut server, "s1")
        .await
        .expect("join failed");
    offer_and_answer(&mut server, "s1", "v=0 offer")
        .await
        .expect("no answer");

    let peer = peers.peer(0).expect("peer not created");
    peer.emit_stream("media-1").await;
    peer.emit_stream("media-1").await;

    assert!(matches!(
        recorder.next().await.expect("no stream"),
        ViewerEvent::Stream { .. }
    ));
    let seen = sync(&server, &mut recorder, "s1").await.expect("sync failed");
    assert!(seen.is_empty(), "duplicate stream events: {:?}", seen);
    assert_eq!(log.entries(), vec!["stream:media-1".to_owned()]);
}
