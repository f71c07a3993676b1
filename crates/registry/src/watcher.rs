//! The served `org.kde.StatusNotifierWatcher` interface.
//!
//! Thin shim over [`Registry`]: method and property handlers delegate, and
//! the signal definitions live here so the registry can broadcast through
//! them. Unknown methods and properties are answered with the standard
//! D-Bus errors by the object server.

use std::sync::Arc;

use tracing::warn;
use zbus::message::Header;
use zbus::object_server::SignalEmitter;

use traywatch_protocol::names::PROTOCOL_VERSION;

use crate::registry::Registry;

pub struct Watcher {
    registry: Arc<Registry>,
}

impl Watcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

#[zbus::interface(name = "org.kde.StatusNotifierWatcher")]
impl Watcher {
    /// Registration request. Always succeeds: there is no rejection path in
    /// the protocol.
    async fn register_status_notifier_item(
        &self,
        service: &str,
        #[zbus(header)] header: Header<'_>,
    ) {
        let caller = match header.sender() {
            Some(sender) => sender.to_string(),
            None => {
                // Bus-delivered calls always carry a sender.
                warn!(service = %service, "registration without a sender");
                String::new()
            }
        };
        self.registry.register(service, &caller).await;
    }

    #[zbus(property)]
    async fn registered_status_notifier_items(&self) -> Vec<String> {
        self.registry.registered_items().await
    }

    /// Always true once the registry is live; this process is the host.
    #[zbus(property)]
    async fn is_status_notifier_host_registered(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn protocol_version(&self) -> i32 {
        PROTOCOL_VERSION
    }

    #[zbus(signal)]
    pub async fn status_notifier_item_registered(
        emitter: &SignalEmitter<'_>,
        service: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn status_notifier_item_unregistered(
        emitter: &SignalEmitter<'_>,
        service: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn status_notifier_host_registered(
        emitter: &SignalEmitter<'_>,
    ) -> zbus::Result<()>;
}
