//! Loopback central: drives the adapter the way a remote peer would.
//!
//! Reads the service banner, subscribes, acknowledges every notification
//! and writes the reassembled blob to disk. The final ACK after the last
//! frame is what lets the peripheral drain its session.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use trickle_core::wire::{self, ACK_TOKEN};
use trickle_core::{AttResult, ReassemblyEvent, Reassembler};
use trickle_services::SimCentral;

pub struct LoopbackCentral {
    central: SimCentral,
    mtu: usize,
    output_path: PathBuf,
}

impl LoopbackCentral {
    pub fn new(central: SimCentral, mtu: usize, output_path: PathBuf) -> Self {
        Self {
            central,
            mtu,
            output_path,
        }
    }

    /// Run one complete transfer. Returns where the blob was written.
    pub async fn run(mut self) -> Result<PathBuf> {
        let (result, banner) = self.central.read().await.context("banner read failed")?;
        tracing::info!(
            ?result,
            banner = %String::from_utf8_lossy(&banner),
            "peripheral banner"
        );

        self.central
            .subscribe(self.mtu)
            .await
            .context("subscribe failed")?;
        tracing::info!(mtu = self.mtu, "loopback central subscribed");

        let mut reassembler = Reassembler::new();
        let mut frames = 0usize;
        let blob = loop {
            let Some(frame) = self
                .central
                .next_notification()
                .await
                .context("notification stream failed")?
            else {
                if !self.central.is_connected() {
                    bail!("peripheral adapter exited before the blob completed");
                }
                match reassembler.expected() {
                    Some(total) => bail!(
                        "peripheral ended the session before the blob completed ({} of {total} bytes)",
                        reassembler.received()
                    ),
                    None => bail!("peripheral ended the session before the blob completed"),
                }
            };
            frames += 1;

            let event = reassembler.push(&frame).context("frame rejected")?;
            self.ack().await?;

            match event {
                ReassemblyEvent::Announced { total } => {
                    tracing::info!(total, "length announced");
                }
                ReassemblyEvent::Progress { received, total } => {
                    tracing::debug!(received, total, "frame received");
                }
                ReassemblyEvent::Complete(blob) => break blob,
            }
        };

        // The ACK for the last frame drains the peripheral's session.
        if self.central.next_notification().await?.is_some() {
            bail!("peripheral kept sending after the announced length");
        }
        self.central.unsubscribe().await.context("unsubscribe failed")?;

        write_blob(&self.output_path, &blob).await?;
        tracing::info!(
            path = %self.output_path.display(),
            bytes = blob.len(),
            frames,
            digest = hex::encode(&wire::blob_digest(&blob)[..8]),
            "blob received and reassembled"
        );
        Ok(self.output_path)
    }

    async fn ack(&self) -> Result<()> {
        match self.central.write(ACK_TOKEN).await.context("ack write failed")? {
            AttResult::Success => Ok(()),
            other => bail!("ack rejected by peripheral: {other:?}"),
        }
    }
}

async fn write_blob(path: &Path, blob: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, blob)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
