//! Bus liveness monitoring.
//!
//! Watches `NameOwnerChanged` for every name. When a live item's name
//! loses its owner the item is not unregistered immediately: some peers
//! briefly drop and reacquire their name during their own startup or
//! shutdown, so a short grace timer runs first and re-checks before acting.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use futures_util::StreamExt;

use crate::RegistryError;
use crate::registry::Registry;

/// Grace period between a name-lost event and the unregistration it would
/// cause.
pub const NAME_LOST_GRACE: Duration = Duration::from_secs(2);

/// Runs until cancelled. Must be spawned once the registry is serving.
pub async fn run_monitor(
    registry: Arc<Registry>,
    cancel: CancellationToken,
) -> Result<(), RegistryError> {
    let dbus = zbus::fdo::DBusProxy::new(registry.connection()).await?;
    let mut owner_changes = dbus.receive_name_owner_changed().await?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(signal) = owner_changes.next() => {
                let Ok(args) = signal.args() else { continue };
                let name = args.name().to_string();
                if args.new_owner().is_none() {
                    handle_name_lost(&registry, &cancel, name).await;
                } else {
                    // Reacquired (or first acquired): a pending grace timer
                    // for this identity must not fire.
                    registry.clear_closing(&name).await;
                }
            }
            else => break,
        }
    }
    Ok(())
}

async fn handle_name_lost(registry: &Arc<Registry>, cancel: &CancellationToken, name: String) {
    if !registry.mark_closing(&name).await {
        return;
    }
    debug!(service = %name, "peer dropped off the bus, starting grace timer");

    let registry = Arc::clone(registry);
    let cancel = cancel.child_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(NAME_LOST_GRACE) => {
                registry.unregister_if_closing(&name).await;
            }
        }
    });
}
