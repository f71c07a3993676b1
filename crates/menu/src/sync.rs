//! The synchronizer driver: one task per item that advertises a menu.
//!
//! The task owns the menu proxy and the [`SyncState`] machine, listens to
//! the peer's update signals and the owner's commands, and executes the
//! actions the machine returns. Every peer error is resolved in place,
//! logged and abandoned, so nothing ever propagates out of this task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zbus::zvariant::Value;

use futures_util::StreamExt;
use traywatch_protocol::{
    DBusMenuProxy, MenuRecord, is_transient_peer_error, is_unknown_method_error,
};

use crate::model::{ActionBinding, build_menu};
use crate::state::{COALESCE_DELAY, SyncAction, SyncEvent, SyncState};
use crate::surface::PresentationSurface;

/// Settle delay between the `AboutToShow` round trip and the popup, giving
/// a layout update triggered by the call time to land.
pub const ABOUT_TO_SHOW_GRACE: Duration = Duration::from_millis(150);

/// Commands from the owning item to its synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Secondary click: run the about-to-show courtesy and pop the menu.
    Show,
    /// The surface reported the menu opened (`true`) or closed (`false`).
    VisibilityChanged(bool),
    /// The user invoked the action bound to this item id.
    Invoke(i32),
}

/// Everything a synchronizer task needs; built by the registry when an item
/// advertises a menu path.
pub struct MenuSyncTask {
    pub conn: zbus::Connection,
    /// Bus identity of the peer owning the menu object.
    pub service: String,
    /// Advertised menu object path.
    pub menu_path: zbus::zvariant::OwnedObjectPath,
    pub surface: Arc<dyn PresentationSurface>,
    pub commands: mpsc::Receiver<MenuCommand>,
    pub cancel: CancellationToken,
}

/// Spawns the synchronizer task. Binding to the menu object is best-effort:
/// on connect failure the task logs and exits, and the item simply has no
/// menu.
pub fn spawn(task: MenuSyncTask) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(task))
}

async fn run(task: MenuSyncTask) {
    let MenuSyncTask {
        conn,
        service,
        menu_path,
        surface,
        mut commands,
        cancel,
    } = task;

    let proxy = match connect(&conn, &service, &menu_path).await {
        Some(proxy) => proxy,
        None => return,
    };
    let mut layout_updated = match proxy.receive_layout_updated().await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(service = %service, error = %e, "menu signal subscription failed");
            return;
        }
    };
    let mut props_updated = match proxy.receive_items_properties_updated().await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(service = %service, error = %e, "menu signal subscription failed");
            return;
        }
    };

    let mut engine = SyncEngine {
        proxy,
        surface,
        service,
        state: SyncState::default(),
        bindings: Vec::new(),
    };

    // Initial fetch: unconditional, no revision check.
    engine.fetch_and_apply().await;

    let mut coalesce_at: Option<Instant> = None;
    let mut popup_at: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(signal) = layout_updated.next() => {
                if let Ok(args) = signal.args() {
                    let revision = *args.revision();
                    engine.dispatch(
                        SyncEvent::LayoutUpdated { revision },
                        &mut coalesce_at,
                    ).await;
                }
            }
            Some(_) = props_updated.next() => {
                engine.dispatch(SyncEvent::PropertiesUpdated, &mut coalesce_at).await;
            }
            Some(command) = commands.recv() => match command {
                MenuCommand::Show => {
                    engine.about_to_show().await;
                    popup_at = Some(Instant::now() + ABOUT_TO_SHOW_GRACE);
                }
                MenuCommand::VisibilityChanged(visible) => {
                    let event = if visible {
                        SyncEvent::MenuOpened
                    } else {
                        SyncEvent::MenuClosed
                    };
                    engine.dispatch(event, &mut coalesce_at).await;
                }
                MenuCommand::Invoke(id) => engine.invoke(id).await,
            },
            _ = deadline(coalesce_at), if coalesce_at.is_some() => {
                coalesce_at = None;
                engine.dispatch(SyncEvent::CoalesceElapsed, &mut coalesce_at).await;
            }
            _ = deadline(popup_at), if popup_at.is_some() => {
                popup_at = None;
                engine.surface.popup_menu();
            }
            else => break,
        }
    }

    // Teardown: detach presentation resources before the proxy drops, so a
    // torn-down item never leaves stale entries or bindings behind.
    engine.detach();
}

async fn connect(
    conn: &zbus::Connection,
    service: &str,
    menu_path: &zbus::zvariant::OwnedObjectPath,
) -> Option<DBusMenuProxy<'static>> {
    let built = match DBusMenuProxy::builder(conn)
        .destination(service.to_owned())
        .and_then(|builder| builder.path(menu_path.clone()))
    {
        Ok(builder) => builder.build().await,
        Err(e) => Err(e),
    };
    match built {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            // Best-effort: the item degrades to "no menu".
            debug!(service = %service, path = %menu_path, error = %e, "menu binding failed");
            None
        }
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

struct SyncEngine {
    proxy: DBusMenuProxy<'static>,
    surface: Arc<dyn PresentationSurface>,
    service: String,
    state: SyncState,
    /// Bindings of the currently installed generation.
    bindings: Vec<ActionBinding>,
}

impl SyncEngine {
    async fn dispatch(&mut self, event: SyncEvent, coalesce_at: &mut Option<Instant>) {
        match self.state.handle(event) {
            Some(SyncAction::ScheduleFetch) => {
                *coalesce_at = Some(Instant::now() + COALESCE_DELAY);
            }
            Some(SyncAction::Fetch) => self.fetch_and_apply().await,
            // Install/Discard only follow FetchCompleted, which is fed
            // inside fetch_and_apply.
            Some(SyncAction::Install) | Some(SyncAction::Discard) | None => {}
        }
    }

    async fn fetch_and_apply(&mut self) {
        match self.proxy.get_layout(0, -1, &[]).await {
            Ok((revision, root)) => {
                let root = MenuRecord::from_node(&root);
                // The menu may have opened while the fetch was in flight;
                // trust the surface accessor over possibly queued events.
                self.state.set_visible(self.surface.is_menu_visible());
                match self.state.handle(SyncEvent::FetchCompleted { revision }) {
                    Some(SyncAction::Install) => {
                        debug!(
                            service = %self.service,
                            revision,
                            "installing rebuilt menu"
                        );
                        self.install(&root.children);
                    }
                    Some(SyncAction::Discard) => {
                        debug!(
                            service = %self.service,
                            revision,
                            "menu visible, deferring rebuilt layout"
                        );
                    }
                    _ => {}
                }
            }
            Err(e) => {
                self.state.handle(SyncEvent::FetchFailed);
                if is_transient_peer_error(&e) {
                    debug!(service = %self.service, error = %e, "layout fetch abandoned");
                } else {
                    warn!(service = %self.service, error = %e, "layout fetch failed");
                }
            }
        }
    }

    /// Swaps in a new generation: old bindings are invalidated before the
    /// new tree is installed, so stale ids can never fire against it.
    fn install(&mut self, records: &[MenuRecord]) {
        let (model, bindings) = build_menu(records);
        for stale in &self.bindings {
            self.surface.remove_action(&stale.name);
        }
        self.surface.install_menu(&model);
        for binding in &bindings {
            self.surface.add_action(binding);
        }
        self.bindings = bindings;
    }

    async fn about_to_show(&self) {
        match self.proxy.about_to_show(0).await {
            // The returned needUpdate flag is informational only.
            Ok(_) => {}
            Err(e) if is_unknown_method_error(&e) => {
                // Peers that don't implement AboutToShow answer with an
                // unknown-method class error; success-equivalent.
                debug!(service = %self.service, error = %e, "peer lacks AboutToShow");
            }
            Err(e) => {
                debug!(service = %self.service, error = %e, "AboutToShow failed");
            }
        }
    }

    async fn invoke(&self, id: i32) {
        let known = self
            .bindings
            .iter()
            .any(|binding| binding.item_id == id && binding.enabled);
        if !known {
            debug!(service = %self.service, id, "dropping click for stale or disabled item");
            return;
        }
        let timestamp = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        if let Err(e) = self
            .proxy
            .event(id, "clicked", &Value::from(""), timestamp)
            .await
        {
            if is_transient_peer_error(&e) {
                debug!(service = %self.service, id, error = %e, "click event abandoned");
            } else {
                warn!(service = %self.service, id, error = %e, "click event failed");
            }
        }
    }

    fn detach(&mut self) {
        for binding in &self.bindings {
            self.surface.remove_action(&binding.name);
        }
        self.bindings.clear();
        self.surface.clear_menu();
    }
}
