use crate::*;

/// Anything other than the exact token is accepted and ignored.
#[tokio::test]
async fn test_unrecognized_writes_do_not_advance() -> Result<()> {
    let blob = pattern(30);
    let mut p = Peripheral::serve("unrecognized", &blob);

    p.central.subscribe(11).await?;
    let first = p.expect_frame().await?;
    assert_eq!(first, Bytes::from_static(b"30"));

    for junk in ["ack", "NACK", "ACK\n", "hello", ""] {
        assert_eq!(p.central.write(junk).await?, AttResult::Success);
    }
    p.central.write_without_response("ACKACK").await?;

    // Still waiting on the first ACK: the next frame is blob[0..10].
    p.ack().await?;
    assert_eq!(&p.expect_frame().await?[..], &blob[0..10]);

    p.stop().await
}

/// Offset writes are refused upstream of the gate.
#[tokio::test]
async fn test_offset_write_rejected() -> Result<()> {
    let blob = pattern(30);
    let mut p = Peripheral::serve("offset", &blob);

    p.central.subscribe(11).await?;
    p.expect_frame().await?;

    assert_eq!(p.central.write_at(3, ACK_TOKEN).await?, AttResult::AttrNotLong);

    p.ack().await?;
    assert_eq!(&p.expect_frame().await?[..], &blob[0..10]);

    p.stop().await
}

/// Write-without-response ACKs advance the session like normal writes.
#[tokio::test]
async fn test_ack_without_response() -> Result<()> {
    let mut p = Peripheral::serve("no-response", b"abcdef");

    p.central.subscribe(4).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"6"));
    p.central.write_without_response(ACK_TOKEN).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"abc"));

    p.stop().await
}

/// Writes before any subscribe are no-ops.
#[tokio::test]
async fn test_write_before_subscribe() -> Result<()> {
    let mut p = Peripheral::serve("early-write", b"xyz");

    assert_eq!(p.central.write(ACK_TOKEN).await?, AttResult::Success);
    assert_eq!(p.central.write("garbage").await?, AttResult::Success);

    p.central.subscribe(8).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"3"));

    p.stop().await
}

/// Reads always return the service banner.
#[tokio::test]
async fn test_read_banner() -> Result<()> {
    let mut p = Peripheral::serve("banner", b"data");

    let (result, value) = p.central.read().await?;
    assert_eq!(result, AttResult::Success);
    assert_eq!(value, Bytes::from_static(READ_BANNER.as_bytes()));

    // Reading mid-transfer does not disturb the session.
    p.central.subscribe(8).await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"4"));
    let (_, value) = p.central.read().await?;
    assert_eq!(&value[..], READ_BANNER.as_bytes());
    p.ack().await?;
    assert_eq!(p.expect_frame().await?, Bytes::from_static(b"data"));

    p.stop().await
}
