//! trickled: stop-and-wait blob transfer peripheral.
//!
//! The radio stack is not bundled: the adapter is driven through the
//! in-process simulated link by a loopback central that plays the remote
//! peer, fetches the configured blob once and writes it back out.
//!
//! Usage: trickled [BLOB_PATH]

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use trickle_core::config::TrickleConfig;
use trickle_services::{simulated, FsLoader, PeripheralAdapter, TransferSource};

mod loopback;

use loopback::LoopbackCentral;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = TrickleConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let mut config = TrickleConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        TrickleConfig::default()
    });

    if let Some(path) = std::env::args().nth(1) {
        config.transfer.blob_path = path.into();
    }
    tracing::info!(
        blob = %config.transfer.blob_path.display(),
        local_name = %config.peripheral.local_name,
        service = %config.peripheral.service_uuid,
        characteristic = %config.peripheral.characteristic_uuid,
        "trickled starting"
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let (central, events) = simulated::link(64);

    let mut adapter_task = tokio::spawn(
        PeripheralAdapter::new(
            TransferSource::new(config.transfer.blob_path.clone(), FsLoader),
            events,
            config.peripheral.read_banner.clone(),
            shutdown_tx.subscribe(),
        )
        .run(),
    );

    let loopback_task = tokio::spawn(
        LoopbackCentral::new(central, config.loopback.mtu, config.loopback.output_path.clone())
            .run(),
    );

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    let adapter_running = tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::info!("shutting down");
            true
        }
        r = loopback_task => {
            match r.context("loopback task panicked")? {
                Ok(path) => tracing::info!(path = %path.display(), "loopback transfer complete"),
                Err(e) => tracing::error!(error = %format!("{e:#}"), "loopback transfer failed"),
            }
            true
        }
        r = &mut adapter_task => {
            tracing::error!("peripheral adapter exited: {:?}", r);
            false
        }
    };

    let _ = shutdown_tx.send(());
    if adapter_running {
        stop_adapter(adapter_task).await?;
    }
    Ok(())
}

/// Wait for the adapter to reset its session after the shutdown broadcast.
async fn stop_adapter(task: JoinHandle<Result<()>>) -> Result<()> {
    task.await.context("peripheral adapter panicked")??;
    tracing::info!("peripheral adapter stopped");
    Ok(())
}
