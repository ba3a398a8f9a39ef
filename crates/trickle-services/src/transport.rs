//! Transport seam: the events a peripheral stack delivers and the single
//! action it accepts.
//!
//! The radio stack (advertising, connection setup, GATT registration) lives
//! outside this crate. Whatever hosts the characteristic translates its
//! callbacks into [`TransportEvent`]s and feeds them to the adapter in order.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use trickle_core::AttResult;

/// Capability to push a notification to the subscribed peer.
///
/// Handed over with a subscribe and only valid for that subscription.
/// Sending is fire-and-forget: no link-layer delivery confirmation is
/// awaited, and a peer that already went away is logged, not reported.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl Notifier {
    /// A notifier and the receiving end the transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, value: Bytes) {
        if self.tx.send(value).is_err() {
            tracing::debug!("notification dropped, transport receiver closed");
        }
    }
}

/// One callback from the peripheral stack.
#[derive(Debug)]
pub enum TransportEvent {
    /// A peer enabled notifications.
    Subscribe {
        max_payload_size: usize,
        notifier: Notifier,
    },

    /// The peer disabled notifications or disconnected.
    Unsubscribe,

    /// The peer wrote to the characteristic.
    Write {
        data: Bytes,
        offset: usize,
        without_response: bool,
        reply: Option<oneshot::Sender<AttResult>>,
    },

    /// The peer read the characteristic.
    Read {
        offset: usize,
        reply: oneshot::Sender<(AttResult, Bytes)>,
    },
}
