use crate::*;

use simplemsg_client::{exchange, DirSink, MemorySink};
use simplemsg_core::{DecoderConfig, Posting};

/// A server-like reply: an HTML page and a binary image.
fn page_and_image() -> (Vec<u8>, Vec<u8>) {
    let html = b"<html>\n<body>\n<p>posted</p>\n</body>\n</html>\n".to_vec();
    let png: Vec<u8> = (0..2048u32).map(|i| (i * 31 % 256) as u8).collect();
    (html, png)
}

#[tokio::test]
async fn test_exchange_writes_records_to_directory() {
    let (html, png) = page_and_image();
    let peer = ScriptedPeer::start(
        reply(0, &[("response.html", &html), ("image.png", &png)]),
        Delivery::Whole,
    )
    .await
    .unwrap();
    let endpoint = peer.endpoint();

    let dir = tempfile::tempdir().unwrap();
    let posting = Posting::new("alice", "hello world", None).unwrap();
    let mut sinks = DirSink::new(dir.path());

    let response = exchange(&endpoint, &posting, &DecoderConfig::default(), &mut sinks)
        .await
        .unwrap();

    assert_eq!(peer.request().await.unwrap(), b"user=alice\nhello world\n");
    assert!(response.is_success());
    assert_eq!(response.records.len(), 2);
    assert_eq!(response.records[0].name, "response.html");
    assert_eq!(response.records[1].len, png.len() as u64);

    assert_eq!(std::fs::read(dir.path().join("response.html")).unwrap(), html);
    assert_eq!(std::fs::read(dir.path().join("image.png")).unwrap(), png);
}

#[tokio::test]
async fn test_image_line_reaches_the_peer() {
    let peer = ScriptedPeer::start(reply(0, &[]), Delivery::Whole)
        .await
        .unwrap();
    let endpoint = peer.endpoint();

    let posting = Posting::new(
        "bob",
        "see attached",
        Some("https://example.org/cat.jpg".into()),
    )
    .unwrap();
    let response = exchange(
        &endpoint,
        &posting,
        &DecoderConfig::default(),
        &mut MemorySink::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        peer.request().await.unwrap(),
        b"user=bob\nimg=https://example.org/cat.jpg\nsee attached\n"
    );
    assert!(response.records.is_empty());
}

#[tokio::test]
async fn test_tiny_segments_and_small_chunks() {
    let (html, png) = page_and_image();
    let peer = ScriptedPeer::start(
        reply(0, &[("response.html", &html), ("image.png", &png)]),
        Delivery::Pieces(5),
    )
    .await
    .unwrap();
    let endpoint = peer.endpoint();

    let decoder = DecoderConfig {
        chunk_size: 7,
        ..DecoderConfig::default()
    };
    let mut sinks = MemorySink::new();
    let posting = Posting::new("carol", "slow network", None).unwrap();
    exchange(&endpoint, &posting, &decoder, &mut sinks)
        .await
        .unwrap();
    peer.request().await.unwrap();

    let records = sinks.records();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0].payload[..], &html[..]);
    assert_eq!(&records[1].payload[..], &png[..]);
}

#[tokio::test]
async fn test_failure_status_is_a_complete_response() {
    let peer = ScriptedPeer::start(
        reply(3, &[("response.html", b"<p>rejected</p>")]),
        Delivery::Whole,
    )
    .await
    .unwrap();
    let endpoint = peer.endpoint();

    let mut sinks = MemorySink::new();
    let posting = Posting::new("dave", "spam", None).unwrap();
    let response = exchange(&endpoint, &posting, &DecoderConfig::default(), &mut sinks)
        .await
        .unwrap();

    assert_eq!(response.status, 3);
    assert!(!response.is_success());
    assert_eq!(&sinks.records()[0].payload[..], b"<p>rejected</p>");
}
