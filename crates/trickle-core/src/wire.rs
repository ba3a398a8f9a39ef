//! trickle wire format: what the subscribed peer sees on the characteristic.
//!
//! A transfer is a sequence of notifications, one per frame:
//!
//!   frame 0     ASCII decimal of the blob length, no delimiter
//!   frame 1..N  raw slices of the blob, `max_payload_size - 1` bytes each,
//!               the last one possibly shorter
//!
//! After consuming each frame the peer writes the literal `ACK` to the same
//! characteristic to release the next one. There is no sequence number, no
//! checksum and no retransmission: the protocol is cooperative stop-and-wait.

use bytes::Bytes;

// ── Acknowledgement ───────────────────────────────────────────────────────────

/// The token a peer writes to release the next frame.
pub const ACK_TOKEN: &str = "ACK";

/// Returns true if `payload` decodes as UTF-8 and equals [`ACK_TOKEN`] exactly.
///
/// Invalid UTF-8 is never an acknowledgement.
pub fn is_ack(payload: &[u8]) -> bool {
    std::str::from_utf8(payload).is_ok_and(|text| text == ACK_TOKEN)
}

// ── Framing ───────────────────────────────────────────────────────────────────

/// Smallest negotiated payload size that still makes progress.
/// One byte of every notification is reserved, so 1 would yield empty slices.
pub const MIN_PAYLOAD_SIZE: usize = 2;

/// Number of blob bytes carried by each data frame for a negotiated size.
pub fn data_frame_len(max_payload_size: usize) -> Result<usize, FrameError> {
    if max_payload_size < MIN_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooSmall(max_payload_size));
    }
    Ok(max_payload_size - 1)
}

/// The length-announcement frame for a blob of `len` bytes.
pub fn length_announcement(len: usize) -> Bytes {
    Bytes::from(len.to_string())
}

/// Split `blob` into the ordered frame sequence for one transfer.
///
/// The result always holds at least the length announcement. Data frames are
/// zero-copy slices of `blob`. Fails before slicing if `max_payload_size` is
/// below [`MIN_PAYLOAD_SIZE`] or if the announcement itself would not fit.
pub fn build_frames(blob: &Bytes, max_payload_size: usize) -> Result<Vec<Bytes>, FrameError> {
    let frame_len = data_frame_len(max_payload_size)?;

    let announcement = length_announcement(blob.len());
    if announcement.len() > frame_len {
        return Err(FrameError::AnnouncementTooLarge {
            len: announcement.len(),
            max: frame_len,
        });
    }

    let mut frames = Vec::with_capacity(1 + blob.len().div_ceil(frame_len));
    frames.push(announcement);

    let mut start = 0;
    while start < blob.len() {
        let end = (start + frame_len).min(blob.len());
        frames.push(blob.slice(start..end));
        start = end;
    }

    Ok(frames)
}

/// BLAKE3 digest of a blob. Logged on load and checked by the loopback peer.
pub fn blob_digest(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

// ── ATT results ───────────────────────────────────────────────────────────────

/// Result codes returned to the transport for read and write requests.
///
/// Values are the Bluetooth ATT error codes the peripheral stack forwards
/// to the central unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttResult {
    /// Request handled.
    Success = 0x00,

    /// Offset past the end of the attribute value.
    InvalidOffset = 0x07,

    /// The attribute cannot be written with a non-zero offset.
    AttrNotLong = 0x0b,
}

impl From<AttResult> for u8 {
    fn from(r: AttResult) -> u8 {
        r as u8
    }
}

// ── GATT identity ─────────────────────────────────────────────────────────────

/// Primary service UUID advertised by the file transfer peripheral.
pub const SERVICE_UUID: &str = "12345678-1234-5678-1234-56789abcdef0";

/// The single read/write/notify characteristic carrying frames and ACKs.
pub const CHARACTERISTIC_UUID: &str = "12345678-1234-5678-1234-56789abcdef1";

/// Advertised local name.
pub const LOCAL_NAME: &str = "FileTransferPeripheral";

/// Value returned for any read of the characteristic.
pub const READ_BANNER: &str = "File Transfer Service Ready";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised while framing a blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("max payload size {0} is too small, need at least {}", MIN_PAYLOAD_SIZE)]
    PayloadTooSmall(usize),

    #[error("length announcement of {len} bytes exceeds frame capacity {max}")]
    AnnouncementTooLarge { len: usize, max: usize },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
