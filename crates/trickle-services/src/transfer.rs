//! Transfer source and acknowledgement gate: the stop-and-wait state machine.
//!
//! One session exists at a time. A subscribe (re)loads the blob, rebuilds the
//! frames and emits the length announcement immediately. Every `ACK` written
//! by the peer releases exactly one more frame; the `ACK` that arrives after
//! the last frame tears the session down. Unsubscribe or a second subscribe
//! discards whatever was in flight.
//!
//!   Idle ──subscribe──▶ Announcing ──ACK──▶ Streaming ──ACK…──▶ Drained ──ACK──▶ Idle
//!
//! Nothing here times out. A peer that stops acknowledging parks the session
//! until the next unsubscribe or subscribe.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use trickle_core::wire::{self, FrameError};

use crate::loader::{BlobLoader, LoadError};
use crate::transport::Notifier;

/// Observable position of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No subscriber, no frames.
    Idle,
    /// Length announcement emitted, waiting for the first ACK.
    Announcing,
    /// `sent` of `total` data frames emitted, waiting for the next ACK.
    Streaming { sent: usize, total: usize },
    /// Every frame emitted; the next ACK resets the session.
    Drained,
}

/// What the gate did with an inbound write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The write was the acknowledgement token; the session advanced.
    Acknowledged,
    /// Any other payload. Accepted, no protocol effect.
    Unrecognized,
}

/// Reasons a subscribe did not start a session.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] FrameError),
}

#[derive(Debug, Default)]
struct Session {
    frames: Vec<Bytes>,
    cursor: usize,
    notifier: Option<Notifier>,
}

/// Owns the blob source and the single active session.
pub struct TransferSource<L> {
    blob_path: PathBuf,
    loader: L,
    session: Session,
}

impl<L: BlobLoader> TransferSource<L> {
    pub fn new(blob_path: impl Into<PathBuf>, loader: L) -> Self {
        Self {
            blob_path: blob_path.into(),
            loader,
            session: Session::default(),
        }
    }

    pub fn blob_path(&self) -> &Path {
        &self.blob_path
    }

    /// Load the blob for a new session. No retry.
    pub async fn load(&self) -> Result<Bytes, LoadError> {
        let blob = self.loader.load(&self.blob_path).await?;
        let digest = wire::blob_digest(&blob);
        tracing::info!(
            path = %self.blob_path.display(),
            bytes = blob.len(),
            digest = hex::encode(&digest[..8]),
            "blob loaded"
        );
        Ok(blob)
    }

    /// Begin a session for a new subscriber and emit the length announcement.
    ///
    /// Any previous session is discarded first. On error no session exists
    /// and nothing was emitted.
    pub async fn start_session(
        &mut self,
        max_payload_size: usize,
        notifier: Notifier,
    ) -> Result<(), TransferError> {
        if self.session.notifier.is_some() {
            tracing::warn!(
                cursor = self.session.cursor,
                frames = self.session.frames.len(),
                "subscribe supersedes active session"
            );
        }
        self.reset();

        // Reject unusable sizes before touching the file.
        wire::data_frame_len(max_payload_size)?;

        let blob = self.load().await?;
        let frames = wire::build_frames(&blob, max_payload_size)?;
        tracing::info!(
            max_payload_size,
            frames = frames.len(),
            "blob split into frames"
        );

        self.session = Session {
            frames,
            cursor: 0,
            notifier: Some(notifier),
        };
        self.send_next();
        Ok(())
    }

    /// Emit the frame under the cursor and advance it.
    ///
    /// With no subscriber or nothing left to send this resets instead.
    /// Returns true if a frame was emitted.
    pub fn send_next(&mut self) -> bool {
        let session = &mut self.session;
        let (Some(notifier), Some(frame)) = (&session.notifier, session.frames.get(session.cursor))
        else {
            if session.notifier.is_some() {
                tracing::info!(frames = session.frames.len(), "all frames sent");
            }
            self.reset();
            return false;
        };

        tracing::debug!(
            frame = session.cursor + 1,
            of = session.frames.len(),
            len = frame.len(),
            "sending frame"
        );
        notifier.notify(frame.clone());
        session.cursor += 1;
        true
    }

    /// Drop frames and the emit capability. Safe to call repeatedly.
    pub fn reset(&mut self) {
        if self.session.notifier.is_some() || !self.session.frames.is_empty() {
            tracing::debug!("session reset");
        }
        self.session = Session::default();
    }

    /// Interpret an inbound write from the peer.
    pub fn on_write(&mut self, payload: &[u8]) -> GateOutcome {
        if wire::is_ack(payload) {
            tracing::debug!(cursor = self.session.cursor, "ack received");
            self.send_next();
            return GateOutcome::Acknowledged;
        }

        tracing::info!(
            len = payload.len(),
            preview = hex::encode(&payload[..payload.len().min(16)]),
            "unrecognized write ignored"
        );
        GateOutcome::Unrecognized
    }

    pub fn state(&self) -> SessionState {
        let Session {
            frames,
            cursor,
            notifier,
        } = &self.session;
        match (notifier, *cursor) {
            (None, _) => SessionState::Idle,
            (Some(_), 0 | 1) => SessionState::Announcing,
            (Some(_), c) if c < frames.len() => SessionState::Streaming {
                sent: c - 1,
                total: frames.len() - 1,
            },
            (Some(_), _) => SessionState::Drained,
        }
    }

    /// `(cursor, frame count)` of the current session.
    pub fn progress(&self) -> (usize, usize) {
        (self.session.cursor, self.session.frames.len())
    }

    pub fn is_subscribed(&self) -> bool {
        self.session.notifier.is_some()
    }
}
