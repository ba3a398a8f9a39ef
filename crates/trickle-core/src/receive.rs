//! Peer-side reassembly: turns received notifications back into a blob.

use bytes::{Bytes, BytesMut};

/// Upper bound on the buffer reserved from an announcement. Anything larger
/// grows as data frames arrive.
const MAX_PREALLOC: usize = 64 * 1024;

/// What a single pushed frame did to the assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyEvent {
    /// Length announcement accepted; data frames follow.
    Announced { total: usize },
    /// A data frame was appended.
    Progress { received: usize, total: usize },
    /// All announced bytes arrived. The reassembler is ready for a new transfer.
    Complete(Bytes),
}

/// Rebuilds one blob at a time from the frame sequence.
///
/// Expects a length announcement first, then raw data frames until the
/// announced byte count is reached. A zero-length announcement completes
/// immediately.
#[derive(Debug, Default)]
pub struct Reassembler {
    total: Option<usize>,
    buf: BytesMut,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes announced for the transfer in progress, if any.
    pub fn expected(&self) -> Option<usize> {
        self.total
    }

    /// Bytes received so far for the transfer in progress.
    pub fn received(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial transfer.
    pub fn reset(&mut self) {
        self.total = None;
        self.buf.clear();
    }

    pub fn push(&mut self, frame: &[u8]) -> Result<ReassemblyEvent, ReassemblyError> {
        let Some(total) = self.total else {
            let total = parse_announcement(frame)?;
            if total == 0 {
                return Ok(ReassemblyEvent::Complete(Bytes::new()));
            }
            self.total = Some(total);
            self.buf.reserve(total.min(MAX_PREALLOC));
            return Ok(ReassemblyEvent::Announced { total });
        };

        let received = self.buf.len() + frame.len();
        if received > total {
            self.reset();
            return Err(ReassemblyError::Overflow { received, total });
        }
        self.buf.extend_from_slice(frame);

        if received == total {
            self.total = None;
            let blob = self.buf.split().freeze();
            return Ok(ReassemblyEvent::Complete(blob));
        }
        Ok(ReassemblyEvent::Progress { received, total })
    }
}

fn parse_announcement(frame: &[u8]) -> Result<usize, ReassemblyError> {
    let malformed = || ReassemblyError::BadAnnouncement(String::from_utf8_lossy(frame).into_owned());
    if frame.is_empty() || !frame.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    std::str::from_utf8(frame)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(malformed)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassemblyError {
    #[error("malformed length announcement: {0:?}")]
    BadAnnouncement(String),

    #[error("received {received} bytes but only {total} were announced")]
    Overflow { received: usize, total: usize },
}
