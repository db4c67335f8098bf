// Copyright (c) 2025 Tipstream Contributors

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::gateway::{HttpFraudClient, HttpNotifier, TipGateway};
use crate::ledger::Snapshot;
use crate::rpc::{self, RpcState};
use crate::transfer::TransferEngine;

/// Run the service
pub fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    let config =
        Config::load(config_path).context("No config found. Run 'tipstream init' first.")?;

    println!("Tipstream starting. Press Ctrl+C to stop.");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(config, port))
}

async fn run_async(config: Config, port: Option<u16>) -> Result<()> {
    let snapshot_path = config.data.snapshot_path();
    let store = Snapshot::restore(&snapshot_path);

    let engine = TransferEngine::new(&snapshot_path);
    let gateway = TipGateway::new(
        Arc::new(HttpFraudClient::new(
            config.peers.fraud_url.clone(),
            config.peers.shared_secret.clone(),
        )),
        Arc::new(HttpNotifier::new(config.peers.notifications_url.clone())),
        engine.clone(),
    );

    let state = Arc::new(RpcState {
        store: Mutex::new(store),
        engine,
        gateway,
        snapshot_path: snapshot_path.clone(),
    });

    let port = port.unwrap_or(config.server.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut shutdown_tx = Some(shutdown_tx);
    ctrlc::set_handler(move || {
        if let Some(tx) = shutdown_tx.take() {
            let _ = tx.send(());
        }
    })?;

    tokio::select! {
        result = rpc::serve(listener, state.clone()) => result?,
        _ = shutdown_rx => {
            info!("shutdown signal received");
        }
    }

    // Final synchronous persist so nothing since the last mutation is lost.
    let store = state.store.lock();
    Snapshot::from_store(&store)
        .persist(&snapshot_path)
        .context("Failed to persist ledger snapshot on shutdown")?;
    info!("ledger snapshot persisted, exiting");

    Ok(())
}
