mod common;

use std::time::Duration;

use common::{channel, config, eventually, RecordingSurface, WAIT};
use termbridge_session::{
    AttachError, ForwardError, InputEvent, OutputChunk, SessionBridge, SessionEvent,
    SessionState, TermSize,
};
use tokio::sync::mpsc;

/// Chunks of varying size with recognisable content.
fn chunks(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("{i}:{}|", "x".repeat(i % 37)).into_bytes())
        .collect()
}

// =============================================================================
// OUTPUT
// =============================================================================

#[tokio::test]
async fn output_is_lossless_with_ample_queue() {
    let surface = RecordingSurface::new();
    let bridge = SessionBridge::new(config(4096), surface.clone());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let sent = chunks(500);
    for chunk in &sent {
        remote.output(chunk);
    }

    let expected = sent.concat();
    eventually("all output", || surface.bytes().len() == expected.len()).await;
    assert_eq!(surface.bytes(), expected);
}

#[tokio::test]
async fn output_is_lossless_under_backpressure() {
    let surface = RecordingSurface::slow(Duration::from_millis(1));
    let bridge = SessionBridge::new(config(1), surface.clone());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let sent = chunks(60);
    for chunk in &sent {
        remote.output(chunk);
    }

    let expected = sent.concat();
    eventually("all output", || surface.bytes().len() == expected.len()).await;
    assert_eq!(surface.bytes(), expected);
    assert_eq!(surface.writes().len(), sent.len());
}

#[tokio::test]
async fn full_queue_pauses_channel_reads() {
    let (surface, gate) = RecordingSurface::gated();
    let bridge = SessionBridge::new(config(1), surface.clone());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let sent = chunks(10);
    for chunk in &sent {
        remote.output(chunk);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    // One chunk in the surface, one queued, one waiting for queue space.
    assert!(remote.log.receives() <= 3, "reads: {}", remote.log.receives());
    assert!(surface.bytes().is_empty());

    gate.send_replace(true);
    let expected = sent.concat();
    eventually("all output", || surface.bytes() == expected).await;
}

#[tokio::test]
async fn on_output_preserves_order() {
    let surface = RecordingSurface::slow(Duration::from_millis(1));
    let bridge = SessionBridge::new(config(2), surface.clone());
    let (c1, _remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let sent = chunks(40);
    for chunk in &sent {
        bridge.on_output(OutputChunk::new(chunk.clone())).await.unwrap();
    }

    let expected = sent.concat();
    eventually("all output", || surface.bytes() == expected).await;
}

#[tokio::test]
async fn on_output_requires_a_channel() {
    let bridge = SessionBridge::new(config(4), RecordingSurface::new());
    let err = bridge.on_output("early".into()).await.unwrap_err();
    assert!(matches!(err, ForwardError::Inactive(SessionState::Idle)));
}

#[tokio::test]
async fn surface_failure_skips_chunk_and_keeps_session() {
    let surface = RecordingSurface::failing_on(b"bad");
    let bridge = SessionBridge::new(config(8), surface.clone());
    let (c1, remote) = channel("a");
    let handle = bridge.connect(c1, 24, 80).await.unwrap();
    let mut events = handle.subscribe();

    remote.output(b"one");
    remote.output(b"bad");
    remote.output(b"two");
    eventually("surviving output", || surface.bytes() == b"onetwo").await;

    assert_eq!(bridge.state(), SessionState::Active);
    let failed = tokio::time::timeout(WAIT, async {
        loop {
            if let Ok(SessionEvent::SurfaceWriteFailed { error }) = events.recv().await {
                return error;
            }
        }
    })
    .await
    .unwrap();
    assert!(failed.contains("renderer not ready"));
}

#[tokio::test]
async fn repaint_rewrites_history() {
    let surface = RecordingSurface::new();
    let bridge = SessionBridge::new(config(8), surface.clone());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    remote.output(b"$ ");
    remote.output(b"ls");
    eventually("prompt", || surface.bytes() == b"$ ls").await;

    bridge.repaint().await.unwrap();
    eventually("repaint", || surface.writes().len() == 3).await;
    assert_eq!(surface.writes()[2], b"$ ls");
}

#[tokio::test]
async fn empty_reads_are_not_forwarded() {
    let surface = RecordingSurface::new();
    let bridge = SessionBridge::new(config(8), surface.clone());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    remote.output(b"");
    remote.output(b"x");
    eventually("output", || surface.bytes() == b"x").await;
    assert_eq!(surface.writes().len(), 1);
}

// =============================================================================
// INPUT
// =============================================================================

#[tokio::test]
async fn input_bytes_reach_channel_in_order() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let events = vec![
        InputEvent::keystroke("e"),
        InputEvent::keystroke("c"),
        InputEvent::resize(40, 120),
        InputEvent::paste("ho hi"),
        InputEvent::keystroke(b"\x1b[A".to_vec()),
        InputEvent::keystroke("\r"),
    ];
    let expected: Vec<u8> = events
        .iter()
        .filter_map(|e| e.payload())
        .flatten()
        .copied()
        .collect();

    for event in events {
        bridge.on_input(event).await.unwrap();
    }

    assert_eq!(remote.log.sent(), expected);
    assert_eq!(bridge.size(), TermSize::new(40, 120));
}

#[tokio::test]
async fn input_rejected_before_connect() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let err = bridge.on_input(InputEvent::keystroke("x")).await.unwrap_err();
    assert!(matches!(err, ForwardError::Inactive(SessionState::Idle)));
}

#[tokio::test]
async fn zero_resize_is_rejected() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let err = bridge.on_input(InputEvent::resize(0, 0)).await.unwrap_err();
    assert!(matches!(err, ForwardError::InvalidSize(_)));
    assert_eq!(bridge.size(), TermSize::new(24, 80));
    assert_eq!(remote.log.resizes().len(), 1);
}

#[tokio::test]
async fn failed_resize_keeps_session() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (c1, remote) = channel("a");
    let handle = bridge.connect(c1, 24, 80).await.unwrap();
    let mut events = handle.subscribe();
    remote.fail_resizes();

    bridge.on_input(InputEvent::resize(50, 132)).await.unwrap();
    assert_eq!(bridge.state(), SessionState::Active);
    assert_eq!(bridge.size(), TermSize::new(50, 132));
    assert_eq!(
        events.try_recv().ok(),
        Some(SessionEvent::Resized(TermSize::new(50, 132)))
    );
}

#[tokio::test]
async fn attached_stream_is_forwarded_in_order() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (c1, remote) = channel("a");
    bridge.connect(c1, 24, 80).await.unwrap();

    let (tx, rx) = mpsc::channel(16);
    bridge.attach_input(rx).unwrap();

    for key in ["l", "s", " ", "-", "l"] {
        tx.send(InputEvent::keystroke(key)).await.unwrap();
    }
    tx.send(InputEvent::resize(25, 90)).await.unwrap();
    tx.send(InputEvent::paste("\r")).await.unwrap();

    eventually("typed command", || remote.log.sent() == b"ls -l\r").await;
    assert_eq!(bridge.size(), TermSize::new(25, 90));
}

#[tokio::test]
async fn input_stream_has_one_consumer() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (_tx1, rx1) = mpsc::channel(4);
    let (_tx2, rx2) = mpsc::channel(4);

    bridge.attach_input(rx1).unwrap();
    let err = bridge.attach_input(rx2).unwrap_err();
    assert!(matches!(err, AttachError::AlreadyAttached));
}

#[tokio::test]
async fn attached_stream_survives_reconnect() {
    let bridge = SessionBridge::new(config(8), RecordingSurface::new());
    let (c1, r1) = channel("a");
    let handle = bridge.connect(c1, 24, 80).await.unwrap();

    let (tx, rx) = mpsc::channel(16);
    bridge.attach_input(rx).unwrap();
    tx.send(InputEvent::keystroke("a")).await.unwrap();
    eventually("first key", || r1.log.sent() == b"a").await;

    r1.eof();
    common::wait_state(&handle, SessionState::Disconnected).await;

    let (c2, r2) = channel("a");
    bridge.reconnect(c2).await.unwrap();
    tx.send(InputEvent::keystroke("b")).await.unwrap();
    eventually("second key", || r2.log.sent() == b"b").await;
    assert_eq!(r1.log.sent(), b"a");
}
