//! Application orchestrator: wires the registry onto the session bus.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use traywatch_protocol::names::{WATCHER_BUS, WATCHER_PATH};
use traywatch_registry::{Registry, RegistryEvent, Watcher, run_monitor};

use crate::config::Config;
use crate::surface::{LoggingResizeNotifier, LoggingSurfaceProvider};

/// Runs the daemon until shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let connection = zbus::Connection::session()
        .await
        .context("session bus unavailable")?;

    let (registry, mut events) = Registry::new(
        connection.clone(),
        Arc::new(LoggingSurfaceProvider),
        Arc::new(LoggingResizeNotifier),
        config.icon_size,
    );

    // Serving the directory object and owning the well-known name are both
    // fatal on failure: either another watcher is already running or the
    // bus is unusable, and there is no degraded mode.
    connection
        .object_server()
        .at(WATCHER_PATH, Watcher::new(Arc::clone(&registry)))
        .await
        .context("could not register the watcher object")?;
    connection
        .request_name(WATCHER_BUS)
        .await
        .with_context(|| {
            format!("could not acquire {WATCHER_BUS}; is another watcher running?")
        })?;

    registry.announce_host_registered().await?;
    tracing::info!(name = WATCHER_BUS, "watcher registered on the session bus");

    // -- Liveness monitor --
    let cancel = CancellationToken::new();
    let monitor_registry = Arc::clone(&registry);
    let monitor_cancel = cancel.child_token();
    tokio::spawn(async move {
        if let Err(e) = run_monitor(monitor_registry, monitor_cancel).await {
            tracing::error!("liveness monitor failed: {e}");
        }
    });

    tracing::info!("watcher ready");

    // -- Main loop: drain registry events until shutdown --
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            Some(event) = events.recv() => log_event(&event),
        }
    }

    // -- Graceful shutdown --
    cancel.cancel();
    registry.shutdown().await;
    Ok(())
}

fn log_event(event: &RegistryEvent) {
    match event {
        RegistryEvent::ItemRegistered(service) => {
            tracing::info!(service = %service, "item registered");
        }
        RegistryEvent::ItemUnregistered(service) => {
            tracing::info!(service = %service, "item unregistered");
        }
        RegistryEvent::ItemReady { service, theme_path, .. } => {
            tracing::info!(
                service = %service,
                theme_path = theme_path.as_deref().unwrap_or(""),
                "item ready"
            );
        }
        RegistryEvent::IconUpdated { service, .. } => {
            tracing::debug!(service = %service, "icon updated");
        }
    }
}
