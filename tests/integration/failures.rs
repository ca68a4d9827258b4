use crate::*;

use simplemsg_client::{exchange, ClientError, ConnectError, DirSink, ProtocolErrorKind};
use simplemsg_core::{DecoderConfig, Posting};

fn posting() -> Posting {
    Posting::new("mallory", "anything", None).unwrap()
}

/// The peer closes in the middle of a payload: the partial file is kept.
#[tokio::test]
async fn test_truncated_payload_keeps_partial_file() {
    let mut bytes = reply(0, &[("first.txt", b"complete")]);
    bytes.extend_from_slice(b"file=second.bin\nlen=100\n0123");
    let peer = ScriptedPeer::start(bytes, Delivery::Pieces(3)).await.unwrap();
    let endpoint = peer.endpoint();

    let dir = tempfile::tempdir().unwrap();
    let err = exchange(
        &endpoint,
        &posting(),
        &DecoderConfig::default(),
        &mut DirSink::new(dir.path()),
    )
    .await
    .unwrap_err();

    match err {
        ClientError::Protocol(e) => assert_eq!(e.kind(), ProtocolErrorKind::TruncatedPayload),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(dir.path().join("first.txt")).unwrap(), b"complete");
    assert_eq!(std::fs::read(dir.path().join("second.bin")).unwrap(), b"0123");
    peer.request().await.unwrap();
}

/// A peer naming a file outside the output directory gets nothing written.
#[tokio::test]
async fn test_traversal_name_is_refused() {
    let peer = ScriptedPeer::start(
        reply(0, &[("../outside.txt", b"nope")]),
        Delivery::Whole,
    )
    .await
    .unwrap();
    let endpoint = peer.endpoint();

    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    std::fs::create_dir(&out).unwrap();

    let err = exchange(
        &endpoint,
        &posting(),
        &DecoderConfig::default(),
        &mut DirSink::new(&out),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::Protocol(e) if e.kind() == ProtocolErrorKind::SinkOpenFailed));
    assert!(!root.path().join("outside.txt").exists());
}

#[tokio::test]
async fn test_garbage_after_records_is_rejected() {
    let mut bytes = reply(0, &[("a", b"1")]);
    bytes.extend_from_slice(b"len=1\n");
    let peer = ScriptedPeer::start(bytes, Delivery::Whole).await.unwrap();
    let endpoint = peer.endpoint();

    let dir = tempfile::tempdir().unwrap();
    let err = exchange(
        &endpoint,
        &posting(),
        &DecoderConfig::default(),
        &mut DirSink::new(dir.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::Protocol(e) if e.kind() == ProtocolErrorKind::UnexpectedLine));
}

#[tokio::test]
async fn test_nothing_listening_is_a_connect_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let err = exchange(
        &Endpoint::new("127.0.0.1", port),
        &posting(),
        &DecoderConfig::default(),
        &mut DirSink::new(dir.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Connect(ConnectError::AllCandidatesFailed { .. })
    ));
}

#[tokio::test]
async fn test_unresolvable_host_is_a_resolution_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = exchange(
        &Endpoint::new("host.invalid", 7329),
        &posting(),
        &DecoderConfig::default(),
        &mut DirSink::new(dir.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Connect(ConnectError::ResolutionFailed { .. })
    ));
}
