//! The registry core: owns the live item set and one proxy (plus menu
//! synchronizer, when the item has a menu) per registered peer.
//!
//! Registration never fails at the protocol level; whatever goes wrong
//! while binding an individual item is confined to that item's own teardown
//! path. Removal from the live set is the authoritative teardown trigger:
//! the item's cancellation token is cancelled first, which makes its tasks
//! detach their presentation resources before anything is released.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;

use traywatch_item::{IconSource, ItemCommand, ItemEvent, ItemProxyTask};
use traywatch_menu::{MenuCommand, MenuSyncTask};
use traywatch_protocol::names::WATCHER_PATH;

use crate::RegistryError;
use crate::set::{ItemSet, resolve_registration};
use crate::surface::{ResizeNotifier, SurfaceEvent, SurfaceProvider};
use crate::watcher::Watcher;

/// Directory-change and item-state events for the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    ItemRegistered(String),
    ItemUnregistered(String),
    /// The item's proxy connected and resolved its initial state.
    ItemReady {
        service: String,
        icon: IconSource,
        theme_path: Option<String>,
    },
    /// The item's icon changed to a genuinely new value.
    IconUpdated { service: String, icon: IconSource },
}

struct Inner {
    set: ItemSet,
    /// Per-item cancellation tokens; cancelling one tears the item down.
    handles: HashMap<String, CancellationToken>,
}

/// The single point of truth for "who is currently registered".
pub struct Registry {
    conn: zbus::Connection,
    inner: Mutex<Inner>,
    events_tx: mpsc::Sender<RegistryEvent>,
    surfaces: Arc<dyn SurfaceProvider>,
    resize: Arc<dyn ResizeNotifier>,
    icon_size: i32,
    cancel: CancellationToken,
}

impl Registry {
    /// Creates the registry and the event channel the host drains.
    pub fn new(
        conn: zbus::Connection,
        surfaces: Arc<dyn SurfaceProvider>,
        resize: Arc<dyn ResizeNotifier>,
        icon_size: i32,
    ) -> (Arc<Self>, mpsc::Receiver<RegistryEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let registry = Arc::new(Self {
            conn,
            inner: Mutex::new(Inner {
                set: ItemSet::default(),
                handles: HashMap::new(),
            }),
            events_tx,
            surfaces,
            resize,
            icon_size,
            cancel: CancellationToken::new(),
        });
        (registry, events_rx)
    }

    pub fn connection(&self) -> &zbus::Connection {
        &self.conn
    }

    /// Accepts a registration request. `declared` is the service argument
    /// from the wire, `caller` the literal sender identity.
    pub async fn register(self: &Arc<Self>, declared: &str, caller: &str) {
        let (service, object_path) = resolve_registration(declared, caller);
        info!(service = %service, path = %object_path, "registering item");

        // A peer registering again replaces its previous item.
        if self.contains(&service).await {
            debug!(service = %service, "replacing existing registration");
            self.unregister(&service).await;
        }

        let token = self.cancel.child_token();
        {
            let mut inner = self.inner.lock().await;
            inner.set.insert(service.clone(), object_path.clone());
            inner.handles.insert(service.clone(), token.clone());
        }

        tokio::spawn(run_item(ItemSupervisor {
            conn: self.conn.clone(),
            service: service.clone(),
            object_path,
            icon_size: self.icon_size,
            surfaces: Arc::clone(&self.surfaces),
            events_tx: self.events_tx.clone(),
            cancel: token,
        }));

        self.notify_resize().await;
        self.emit_item_signal(&service, true).await;
        let _ = self
            .events_tx
            .send(RegistryEvent::ItemRegistered(service))
            .await;
    }

    /// Removes an item from the live set and tears it down. Idempotent:
    /// unregistering an absent item is a no-op with no broadcast.
    pub async fn unregister(&self, service: &str) -> bool {
        let removed = {
            let mut inner = self.inner.lock().await;
            let removed = inner.set.remove(service);
            if removed.is_some()
                && let Some(token) = inner.handles.remove(service)
            {
                // Phase one: cancel, so the item's tasks detach their
                // presentation resources; resources drop with the tasks.
                token.cancel();
            }
            removed
        };
        if removed.is_none() {
            return false;
        }

        info!(service = %service, "unregistering item");
        self.notify_resize().await;
        self.emit_item_signal(service, false).await;
        let _ = self
            .events_tx
            .send(RegistryEvent::ItemUnregistered(service.to_owned()))
            .await;
        true
    }

    /// Grace-timer callback: unregisters only when the item is still
    /// flagged as closing, since the peer may have reacquired its name.
    pub async fn unregister_if_closing(&self, service: &str) {
        let still_gone = { self.inner.lock().await.set.is_closing(service) };
        if still_gone {
            debug!(service = %service, "grace period elapsed without reacquisition");
            self.unregister(service).await;
        }
    }

    /// Flags an item whose bus name lost its owner. Returns `true` when a
    /// grace timer should be started.
    pub async fn mark_closing(&self, service: &str) -> bool {
        self.inner.lock().await.set.mark_closing(service)
    }

    /// Clears the closing flag after a name reacquisition.
    pub async fn clear_closing(&self, service: &str) {
        self.inner.lock().await.set.clear_closing(service);
    }

    pub async fn contains(&self, service: &str) -> bool {
        self.inner.lock().await.set.contains(service)
    }

    /// Peer identities in registration order.
    pub async fn registered_items(&self) -> Vec<String> {
        self.inner.lock().await.set.services()
    }

    pub async fn item_count(&self) -> usize {
        self.inner.lock().await.set.len()
    }

    /// Broadcast once the well-known name is acquired and the directory is
    /// serving.
    pub async fn announce_host_registered(&self) -> Result<(), RegistryError> {
        let emitter = SignalEmitter::new(&self.conn, WATCHER_PATH)?;
        Watcher::status_notifier_host_registered(&emitter).await?;
        Ok(())
    }

    /// Unregisters everything and cancels all item tasks.
    pub async fn shutdown(&self) {
        for service in self.registered_items().await {
            self.unregister(&service).await;
        }
        self.cancel.cancel();
        info!("registry shut down");
    }

    async fn notify_resize(&self) {
        let count = self.item_count().await;
        self.resize.notify_item_count_changed(count);
    }

    async fn emit_item_signal(&self, service: &str, registered: bool) {
        let result = async {
            let emitter = SignalEmitter::new(&self.conn, WATCHER_PATH)?;
            if registered {
                Watcher::status_notifier_item_registered(&emitter, service).await
            } else {
                Watcher::status_notifier_item_unregistered(&emitter, service).await
            }
        }
        .await;
        if let Err(e) = result {
            warn!(service = %service, error = %e, "directory-change broadcast failed");
        }
    }
}

/// Context for one item's supervisor task.
struct ItemSupervisor {
    conn: zbus::Connection,
    service: String,
    object_path: String,
    icon_size: i32,
    surfaces: Arc<dyn SurfaceProvider>,
    events_tx: mpsc::Sender<RegistryEvent>,
    cancel: CancellationToken,
}

/// Supervises one item: routes surface input to the proxy and menu tasks
/// and forwards item events to the host. Exits when the item's token is
/// cancelled.
async fn run_item(ctx: ItemSupervisor) {
    let (surface, mut surface_events) = ctx.surfaces.create_surface(&ctx.service);

    let (item_cmd_tx, item_cmd_rx) = mpsc::channel(16);
    let (item_events_tx, mut item_events) = mpsc::channel(16);
    traywatch_item::spawn(ItemProxyTask {
        conn: ctx.conn.clone(),
        service: ctx.service.clone(),
        object_path: ctx.object_path.clone(),
        icon_size: ctx.icon_size,
        commands: item_cmd_rx,
        events: item_events_tx,
        cancel: ctx.cancel.child_token(),
    });

    // Created once the item reports a menu path.
    let mut menu_cmd_tx: Option<mpsc::Sender<MenuCommand>> = None;

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            Some(event) = item_events.recv() => match event {
                ItemEvent::Ready { icon, theme_path, menu_path } => {
                    if let Some(menu_path) = menu_path {
                        let (tx, rx) = mpsc::channel(16);
                        menu_cmd_tx = Some(tx);
                        traywatch_menu::spawn(MenuSyncTask {
                            conn: ctx.conn.clone(),
                            service: ctx.service.clone(),
                            menu_path,
                            surface: Arc::clone(&surface),
                            commands: rx,
                            cancel: ctx.cancel.child_token(),
                        });
                    }
                    let _ = ctx.events_tx.send(RegistryEvent::ItemReady {
                        service: ctx.service.clone(),
                        icon,
                        theme_path,
                    }).await;
                }
                ItemEvent::IconChanged(icon) => {
                    let _ = ctx.events_tx.send(RegistryEvent::IconUpdated {
                        service: ctx.service.clone(),
                        icon,
                    }).await;
                }
                ItemEvent::MenuRequested => {
                    if let Some(tx) = &menu_cmd_tx {
                        let _ = tx.send(MenuCommand::Show).await;
                    } else {
                        debug!(service = %ctx.service, "menu requested but item has none");
                    }
                }
            },
            Some(event) = surface_events.recv() => match event {
                SurfaceEvent::PrimaryClick { x, y } => {
                    let _ = item_cmd_tx.send(ItemCommand::Activate { x, y }).await;
                }
                SurfaceEvent::SecondaryClick => {
                    let _ = item_cmd_tx.send(ItemCommand::SecondaryClick).await;
                }
                SurfaceEvent::MenuOpened => {
                    if let Some(tx) = &menu_cmd_tx {
                        let _ = tx.send(MenuCommand::VisibilityChanged(true)).await;
                    }
                }
                SurfaceEvent::MenuClosed => {
                    if let Some(tx) = &menu_cmd_tx {
                        let _ = tx.send(MenuCommand::VisibilityChanged(false)).await;
                    }
                }
                SurfaceEvent::ActionInvoked(id) => {
                    if let Some(tx) = &menu_cmd_tx {
                        let _ = tx.send(MenuCommand::Invoke(id)).await;
                    }
                }
            },
            else => break,
        }
    }
}
