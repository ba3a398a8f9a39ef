//! trickle integration test harness.
//!
//! Each test runs a real `PeripheralAdapter` on its own task, serving a blob
//! from a temp file, and drives it through a `SimCentral` exactly as a remote
//! peer would: subscribe, read notifications, write ACKs, unsubscribe.
//!
//!   cargo test --test integration

mod gate;
mod lifecycle;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use trickle_core::wire::{ACK_TOKEN, READ_BANNER};
use trickle_core::AttResult;
use trickle_services::{simulated, FsLoader, PeripheralAdapter, SimCentral, TransferSource};

// ── Harness ───────────────────────────────────────────────────────────────────

/// A running adapter plus the central that talks to it.
pub struct Peripheral {
    pub central: SimCentral,
    pub blob_path: PathBuf,
    dir: PathBuf,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl Peripheral {
    /// Serve `blob` from a fresh temp file. `name` keeps parallel tests apart.
    pub fn serve(name: &str, blob: &[u8]) -> Self {
        let peripheral = Self::serve_missing(name);
        std::fs::write(&peripheral.blob_path, blob).expect("failed to write blob");
        peripheral
    }

    /// Serve a path that does not exist yet.
    pub fn serve_missing(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("trickle-it-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("failed to create test dir");
        let blob_path = dir.join("blob.bin");

        let (central, events) = simulated::link(64);
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let adapter = PeripheralAdapter::new(
            TransferSource::new(blob_path.clone(), FsLoader),
            events,
            READ_BANNER,
            shutdown_rx,
        );
        let task = tokio::spawn(adapter.run());

        Self {
            central,
            blob_path,
            dir,
            shutdown,
            task,
        }
    }

    /// Replace the blob on disk; picked up by the next subscribe.
    pub fn replace_blob(&self, blob: &[u8]) {
        std::fs::write(&self.blob_path, blob).expect("failed to replace blob");
    }

    pub async fn ack(&self) -> Result<()> {
        match self.central.write(ACK_TOKEN).await? {
            AttResult::Success => Ok(()),
            other => bail!("ack rejected: {other:?}"),
        }
    }

    /// Next notification, failing if the session ended instead.
    pub async fn expect_frame(&mut self) -> Result<Bytes> {
        self.central
            .next_notification()
            .await?
            .context("session ended, expected a frame")
    }

    /// Assert the peripheral dropped the emit capability with nothing queued.
    pub async fn expect_end(&mut self) -> Result<()> {
        if let Some(frame) = self.central.next_notification().await? {
            bail!("expected end of session, got frame {frame:?}");
        }
        Ok(())
    }

    /// ACK every frame until the session ends. Returns all frames seen,
    /// starting with `first` if given.
    pub async fn ack_until_end(&mut self, first: Option<Bytes>) -> Result<Vec<Bytes>> {
        let mut frames: Vec<Bytes> = first.into_iter().collect();
        loop {
            self.ack().await?;
            match self.central.next_notification().await? {
                Some(frame) => frames.push(frame),
                None => return Ok(frames),
            }
        }
    }

    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task.await.context("adapter task panicked")??;
        let _ = std::fs::remove_dir_all(&self.dir);
        Ok(())
    }
}

/// Deterministic test blob.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

/// Concatenate the data frames (everything after the announcement).
pub fn join_data(frames: &[Bytes]) -> Vec<u8> {
    frames[1..].iter().flat_map(|f| f.iter().copied()).collect()
}
