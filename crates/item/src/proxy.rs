//! The item proxy task: one per registered peer.
//!
//! Connects to the peer's item object, resolves the initial icon source,
//! forwards primary clicks as `Activate` calls, and raises a menu-request
//! event on secondary clicks; the proxy itself knows nothing about menus.
//! Transient remote errors during property reads are expected (peers go
//! away mid-shutdown) and are logged at debug, never propagated.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use futures_util::StreamExt;
use traywatch_protocol::{StatusNotifierItemProxy, is_transient_peer_error};

use crate::icon_state::IconState;
use crate::{ItemCommand, ItemEvent};

/// Everything an item proxy task needs; built by the registry on
/// registration.
pub struct ItemProxyTask {
    pub conn: zbus::Connection,
    /// Bus identity the item lives under.
    pub service: String,
    /// Object path of the item.
    pub object_path: String,
    /// Target icon width for bitmap selection.
    pub icon_size: i32,
    pub commands: mpsc::Receiver<ItemCommand>,
    pub events: mpsc::Sender<ItemEvent>,
    pub cancel: CancellationToken,
}

/// Spawns the proxy task. Construction failures are confined to this item:
/// the task logs, emits nothing, and exits.
pub fn spawn(task: ItemProxyTask) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(task))
}

async fn run(task: ItemProxyTask) {
    let ItemProxyTask {
        conn,
        service,
        object_path,
        icon_size,
        mut commands,
        events,
        cancel,
    } = task;

    let proxy = match connect(&conn, &service, &object_path).await {
        Some(proxy) => proxy,
        None => return,
    };

    // Initial property reads. Each is optional; a peer mid-shutdown answers
    // with a transient error and the property counts as absent.
    let name = read(proxy.icon_name().await, &service, "IconName");
    let pixmaps = read(proxy.icon_pixmap().await, &service, "IconPixmap")
        .filter(|set: &Vec<_>| !set.is_empty());
    let theme_path = read(proxy.icon_theme_path().await, &service, "IconThemePath")
        .filter(|path: &String| !path.is_empty());
    let menu_path = read(proxy.menu().await, &service, "Menu")
        .filter(|path| !path.as_str().is_empty() && path.as_str() != "/");

    let mut icon = IconState::new(icon_size);
    let source = icon.initialize(name, pixmaps);
    let ready = ItemEvent::Ready {
        icon: source,
        theme_path,
        menu_path,
    };
    if events.send(ready).await.is_err() {
        return;
    }

    let mut new_icon = match proxy.receive_new_icon().await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(service = %service, error = %e, "NewIcon subscription failed");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = new_icon.next() => {
                refresh_icon(&proxy, &mut icon, &events, &service).await;
            }
            Some(command) = commands.recv() => match command {
                ItemCommand::Activate { x, y } => {
                    // Fire-and-forget; the reply is ignored by design.
                    if let Err(e) = proxy.activate(x, y).await {
                        debug!(service = %service, error = %e, "Activate call failed");
                    }
                }
                ItemCommand::SecondaryClick => {
                    let _ = events.send(ItemEvent::MenuRequested).await;
                }
            },
            else => break,
        }
    }
}

async fn connect(
    conn: &zbus::Connection,
    service: &str,
    object_path: &str,
) -> Option<StatusNotifierItemProxy<'static>> {
    let built = match StatusNotifierItemProxy::builder(conn)
        .destination(service.to_owned())
        .and_then(|builder| builder.path(object_path.to_owned()))
    {
        // Items signal icon changes via NewIcon, not PropertiesChanged, so
        // the default property cache would go stale.
        Ok(builder) => {
            builder
                .cache_properties(zbus::proxy::CacheProperties::No)
                .build()
                .await
        }
        Err(e) => Err(e),
    };
    match built {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            debug!(service = %service, path = %object_path, error = %e, "item binding failed");
            None
        }
    }
}

/// Turns a property read result into an option, swallowing transient
/// errors.
fn read<T>(result: zbus::Result<T>, service: &str, property: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if is_transient_peer_error(&e) => {
            debug!(service = %service, property, error = %e, "property read abandoned");
            None
        }
        Err(e) => {
            debug!(service = %service, property, error = %e, "property unavailable");
            None
        }
    }
}

/// Re-reads whichever representations are currently tracked and emits an
/// update only when the fetched value differs from the cached one.
async fn refresh_icon(
    proxy: &StatusNotifierItemProxy<'static>,
    icon: &mut IconState,
    events: &mpsc::Sender<ItemEvent>,
    service: &str,
) {
    if icon.tracks_name() {
        match proxy.icon_name().await {
            Ok(fresh) => {
                if let Some(source) = icon.refresh_name(fresh) {
                    let _ = events.send(ItemEvent::IconChanged(source)).await;
                } else {
                    debug!(service = %service, "icon name unchanged, skipping");
                }
            }
            Err(e) => debug!(service = %service, error = %e, "IconName re-read failed"),
        }
    }
    if icon.tracks_pixmaps() {
        match proxy.icon_pixmap().await {
            Ok(fresh) => {
                if let Some(source) = icon.refresh_pixmaps(fresh) {
                    let _ = events.send(ItemEvent::IconChanged(source)).await;
                } else {
                    debug!(service = %service, "icon pixmap unchanged, skipping");
                }
            }
            Err(e) => debug!(service = %service, error = %e, "IconPixmap re-read failed"),
        }
    }
}
