//! In-process peripheral simulator
//!
//! Stands in for the radio stack: a [`SimCentral`] plays the remote peer and
//! turns its subscribe / write / read / unsubscribe calls into
//! [`TransportEvent`]s on a channel the adapter consumes. Used by the daemon's
//! loopback mode and by integration tests, no BLE hardware required.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use trickle_core::AttResult;

use crate::transport::{Notifier, TransportEvent};

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("peripheral adapter is gone")]
    AdapterGone,

    #[error("not subscribed to notifications")]
    NotSubscribed,

    #[error("notification exceeds negotiated size ({size} > {mtu})")]
    MtuExceeded { size: usize, mtu: usize },
}

/// Create a linked central and the event stream its calls produce.
pub fn link(capacity: usize) -> (SimCentral, mpsc::Receiver<TransportEvent>) {
    let (events, rx) = mpsc::channel(capacity);
    let central = SimCentral {
        events,
        notifications: None,
        mtu: 0,
    };
    (central, rx)
}

/// The simulated remote peer.
pub struct SimCentral {
    events: mpsc::Sender<TransportEvent>,
    notifications: Option<mpsc::UnboundedReceiver<Bytes>>,
    mtu: usize,
}

impl SimCentral {
    async fn send(&self, event: TransportEvent) -> Result<(), SimError> {
        self.events.send(event).await.map_err(|_| SimError::AdapterGone)
    }

    /// Enable notifications with the given negotiated payload size.
    /// Replaces any earlier subscription's notification stream.
    pub async fn subscribe(&mut self, max_payload_size: usize) -> Result<(), SimError> {
        let (notifier, rx) = Notifier::channel();
        self.notifications = Some(rx);
        self.mtu = max_payload_size;
        self.send(TransportEvent::Subscribe {
            max_payload_size,
            notifier,
        })
        .await
    }

    pub async fn unsubscribe(&mut self) -> Result<(), SimError> {
        self.notifications = None;
        self.send(TransportEvent::Unsubscribe).await
    }

    /// Write with response at offset 0.
    pub async fn write(&self, data: impl Into<Bytes>) -> Result<AttResult, SimError> {
        self.write_at(0, data).await
    }

    /// Write with response at an explicit offset.
    pub async fn write_at(&self, offset: usize, data: impl Into<Bytes>) -> Result<AttResult, SimError> {
        let (reply, rx) = oneshot::channel();
        self.send(TransportEvent::Write {
            data: data.into(),
            offset,
            without_response: false,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| SimError::AdapterGone)
    }

    /// Write command; no result comes back.
    pub async fn write_without_response(&self, data: impl Into<Bytes>) -> Result<(), SimError> {
        self.send(TransportEvent::Write {
            data: data.into(),
            offset: 0,
            without_response: true,
            reply: None,
        })
        .await
    }

    pub async fn read_at(&self, offset: usize) -> Result<(AttResult, Bytes), SimError> {
        let (reply, rx) = oneshot::channel();
        self.send(TransportEvent::Read { offset, reply }).await?;
        rx.await.map_err(|_| SimError::AdapterGone)
    }

    pub async fn read(&self) -> Result<(AttResult, Bytes), SimError> {
        self.read_at(0).await
    }

    /// Wait for the next notification.
    ///
    /// `Ok(None)` means the peripheral dropped the emit capability: the
    /// session drained, was reset, or never started.
    pub async fn next_notification(&mut self) -> Result<Option<Bytes>, SimError> {
        let rx = self.notifications.as_mut().ok_or(SimError::NotSubscribed)?;
        match rx.recv().await {
            Some(frame) if frame.len() > self.mtu => Err(SimError::MtuExceeded {
                size: frame.len(),
                mtu: self.mtu,
            }),
            Some(frame) => Ok(Some(frame)),
            None => Ok(None),
        }
    }

    /// Whether the adapter side of the link is still alive.
    pub fn is_connected(&self) -> bool {
        !self.events.is_closed()
    }
}
