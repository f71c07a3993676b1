//! Boundary to the presentation surface that actually renders menus.
//!
//! The synchronizer only installs models and bindings and asks for popups;
//! widget creation, theming, and layout belong to whoever implements this
//! trait. Visibility changes and action clicks travel the other way, as
//! messages on the owning item's event channel.

use crate::model::{ActionBinding, MenuModel};

/// One item's rendering surface.
///
/// Implementations must tolerate calls after the item started tearing down;
/// the synchronizer clears its installed state as its last act.
pub trait PresentationSurface: Send + Sync {
    /// Replaces the currently displayed menu model.
    fn install_menu(&self, model: &MenuModel);

    /// Removes any displayed menu model.
    fn clear_menu(&self);

    /// Registers an invokable action for the current generation.
    fn add_action(&self, binding: &ActionBinding);

    /// Removes a previously registered action by name.
    fn remove_action(&self, name: &str);

    /// Whether the menu is displayed to the user right now.
    fn is_menu_visible(&self) -> bool;

    /// Requests that the menu be popped open.
    fn popup_menu(&self);
}
