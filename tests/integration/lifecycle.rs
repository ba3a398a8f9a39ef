use crate::*;

/// Unsubscribe mid-stream goes idle; the next subscribe reloads from disk.
#[tokio::test]
async fn test_unsubscribe_then_resubscribe_reloads() -> Result<()> {
    let mut p = Peripheral::serve("resubscribe", &pattern(100));

    p.central.subscribe(20).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"100"));
    p.ack().await?;
    p.expect_frame().await?;
    p.ack().await?;
    p.expect_frame().await?;

    p.central.unsubscribe().await?;

    let fresh = b"a completely different blob";
    p.replace_blob(fresh);

    p.central.subscribe(20).await?;
    let first = p.expect_frame().await?;
    assert_eq!(first, Bytes::from(fresh.len().to_string()));
    let frames = p.ack_until_end(Some(first)).await?;
    assert_eq!(join_data(&frames), fresh);

    p.stop().await
}

/// A second subscribe mid-stream restarts with a new announcement.
#[tokio::test]
async fn test_second_subscribe_supersedes() -> Result<()> {
    let mut p = Peripheral::serve("supersede", &pattern(60));

    p.central.subscribe(10).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"60"));
    p.ack().await?;
    p.expect_frame().await?;

    p.replace_blob(&pattern(12));
    p.central.subscribe(10).await?;
    let first = p.expect_frame().await?;
    assert_eq!(first, Bytes::from_static(b"12"));

    let frames = p.ack_until_end(Some(first)).await?;
    assert_eq!(frames.len(), 3);
    assert_eq!(join_data(&frames), pattern(12));

    p.stop().await
}

/// Missing blob: subscribe produces nothing and the peripheral stays usable.
#[tokio::test]
async fn test_missing_blob_emits_nothing() -> Result<()> {
    let mut p = Peripheral::serve_missing("missing");

    p.central.subscribe(20).await?;
    p.expect_end().await?;

    // ACK without a session is accepted and harmless.
    p.ack().await?;

    p.replace_blob(b"late");
    p.central.subscribe(20).await?;
    let first = p.expect_frame().await?;
    assert_eq!(first, Bytes::from_static(b"4"));
    let frames = p.ack_until_end(Some(first)).await?;
    assert_eq!(join_data(&frames), b"late");

    p.stop().await
}

/// Payload size of one is rejected before any frame goes out.
#[tokio::test]
async fn test_payload_size_one_rejected() -> Result<()> {
    let mut p = Peripheral::serve("size-one", b"abc");

    p.central.subscribe(1).await?;
    p.expect_end().await?;

    p.central.subscribe(4).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"3"));

    p.stop().await
}

/// Back-to-back transfers on one peripheral each start from frame 0.
#[tokio::test]
async fn test_repeat_transfers() -> Result<()> {
    let blob = pattern(40);
    let mut p = Peripheral::serve("repeat", &blob);

    for _ in 0..3 {
        p.central.subscribe(16).await?;
        let first = p.expect_frame().await?;
        assert_eq!(first, Bytes::from_static(b"40"));
        let frames = p.ack_until_end(Some(first)).await?;
        assert_eq!(join_data(&frames), blob);
    }

    p.stop().await
}
