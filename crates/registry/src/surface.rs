//! Collaborator boundaries for rendering and panel sizing.
//!
//! The registry core never draws anything: a host panel supplies one
//! presentation surface per item and a resize notifier for the panel
//! itself. User input comes back as [`SurfaceEvent`] messages on the
//! channel handed out alongside each surface.

use std::sync::Arc;

use tokio::sync::mpsc;

use traywatch_menu::PresentationSurface;

/// User/UI events originating at an item's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Primary click on the item's icon.
    PrimaryClick { x: i32, y: i32 },
    /// Secondary click on the item's icon.
    SecondaryClick,
    /// The item's menu became visible.
    MenuOpened,
    /// The item's menu was closed.
    MenuClosed,
    /// The action bound to this menu item id was invoked.
    ActionInvoked(i32),
}

/// Creates the per-item presentation surface and its event channel.
pub trait SurfaceProvider: Send + Sync {
    fn create_surface(
        &self,
        service: &str,
    ) -> (Arc<dyn PresentationSurface>, mpsc::Receiver<SurfaceEvent>);
}

/// Sizing collaborator: told how many items are live so the panel can
/// resize. The transport behind it is not the registry's concern.
pub trait ResizeNotifier: Send + Sync {
    fn notify_item_count_changed(&self, count: usize);
}
