//! Headless implementations of the rendering collaborators.
//!
//! The daemon itself draws nothing: installed menus, actions, and popup
//! requests are logged, and the menu is never reported visible. A panel
//! embedding the registry supplies real implementations of these traits
//! and feeds user input back through the surface-event channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use traywatch_menu::{ActionBinding, MenuModel, PresentationSurface};
use traywatch_registry::{ResizeNotifier, SurfaceEvent, SurfaceProvider};

pub struct LoggingSurfaceProvider;

impl SurfaceProvider for LoggingSurfaceProvider {
    fn create_surface(
        &self,
        service: &str,
    ) -> (Arc<dyn PresentationSurface>, mpsc::Receiver<SurfaceEvent>) {
        // The sender stays alive inside the surface; a real panel would use
        // it to report clicks and menu visibility changes.
        let (events_tx, events_rx) = mpsc::channel(16);
        let surface = LoggingSurface {
            service: service.to_owned(),
            _events: events_tx,
        };
        (Arc::new(surface), events_rx)
    }
}

struct LoggingSurface {
    service: String,
    _events: mpsc::Sender<SurfaceEvent>,
}

impl PresentationSurface for LoggingSurface {
    fn install_menu(&self, model: &MenuModel) {
        tracing::debug!(
            service = %self.service,
            entries = model.entry_count(),
            "menu installed"
        );
    }

    fn clear_menu(&self) {
        tracing::debug!(service = %self.service, "menu cleared");
    }

    fn add_action(&self, binding: &ActionBinding) {
        tracing::debug!(
            service = %self.service,
            action = %binding.name,
            enabled = binding.enabled,
            "action added"
        );
    }

    fn remove_action(&self, name: &str) {
        tracing::debug!(service = %self.service, action = %name, "action removed");
    }

    fn is_menu_visible(&self) -> bool {
        false
    }

    fn popup_menu(&self) {
        tracing::debug!(service = %self.service, "popup requested");
    }
}

/// Logs the requested panel width change instead of talking to a bar.
pub struct LoggingResizeNotifier;

impl ResizeNotifier for LoggingResizeNotifier {
    fn notify_item_count_changed(&self, count: usize) {
        tracing::debug!(count, "item count changed");
    }
}
