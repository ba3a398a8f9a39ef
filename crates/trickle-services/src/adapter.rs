//! Peripheral adapter: drains transport events into the transfer source.
//!
//! Events are handled one at a time, each to completion, in arrival order.
//! A subscribe awaits the blob load before the next event is taken, so a
//! write can never observe a half-built session.

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};

use trickle_core::AttResult;

use crate::loader::BlobLoader;
use crate::transfer::TransferSource;
use crate::transport::TransportEvent;

pub struct PeripheralAdapter<L> {
    source: TransferSource<L>,
    events: mpsc::Receiver<TransportEvent>,
    read_banner: Bytes,
    shutdown: broadcast::Receiver<()>,
}

impl<L: BlobLoader> PeripheralAdapter<L> {
    pub fn new(
        source: TransferSource<L>,
        events: mpsc::Receiver<TransportEvent>,
        read_banner: impl Into<Bytes>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            source,
            events,
            read_banner: read_banner.into(),
            shutdown,
        }
    }

    pub fn source(&self) -> &TransferSource<L> {
        &self.source
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        tracing::info!(path = %self.source.blob_path().display(), "peripheral adapter running");
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("peripheral adapter shutting down");
                    self.source.reset();
                    return Ok(());
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("transport closed, peripheral adapter exiting");
                        self.source.reset();
                        return Ok(());
                    };
                    self.handle(event).await;
                }
            }
        }
    }

    /// Process one transport event to completion.
    pub async fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Subscribe {
                max_payload_size,
                notifier,
            } => {
                tracing::info!(max_payload_size, "peer subscribed");
                if let Err(e) = self.source.start_session(max_payload_size, notifier).await {
                    tracing::warn!(error = %e, "transfer not started");
                }
            }

            TransportEvent::Unsubscribe => {
                let (cursor, frames) = self.source.progress();
                tracing::info!(cursor, frames, "peer unsubscribed");
                self.source.reset();
            }

            TransportEvent::Write {
                data,
                offset,
                without_response,
                reply,
            } => {
                let result = if offset != 0 {
                    tracing::info!(offset, len = data.len(), "write with offset rejected");
                    AttResult::AttrNotLong
                } else {
                    let outcome = self.source.on_write(&data);
                    tracing::debug!(?outcome, without_response, "write handled");
                    AttResult::Success
                };
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }

            TransportEvent::Read { offset, reply } => {
                let response = if offset > self.read_banner.len() {
                    (AttResult::InvalidOffset, Bytes::new())
                } else {
                    (AttResult::Success, self.read_banner.slice(offset..))
                };
                tracing::debug!(offset, result = ?response.0, "read handled");
                let _ = reply.send(response);
            }
        }
    }
}
