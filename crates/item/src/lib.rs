//! Per-item remote connection handling.
//!
//! The registry owns one item proxy per registered peer. The proxy is
//! channel-driven: commands (clicks) in, events (readiness, icon changes,
//! menu requests) out, so the GUI side stays completely decoupled from the
//! bus side.

pub mod icon_state;
pub mod proxy;

use zbus::zvariant::OwnedObjectPath;

pub use icon_state::{FALLBACK_ICON, IconSource, IconState};
pub use proxy::{ItemProxyTask, spawn};

/// Commands from the owning item to its proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCommand {
    /// Primary click at the given coordinates; forwarded as a
    /// fire-and-forget `Activate` call.
    Activate { x: i32, y: i32 },
    /// Secondary click; answered with [`ItemEvent::MenuRequested`].
    SecondaryClick,
}

/// Events from an item proxy to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    /// The remote object answered and the initial state is resolved.
    Ready {
        icon: IconSource,
        /// Extra icon theme search path advertised by the peer.
        theme_path: Option<String>,
        /// Menu object path, when the item exposes one.
        menu_path: Option<OwnedObjectPath>,
    },
    /// The peer changed its icon to a genuinely new value.
    IconChanged(IconSource),
    /// The user asked for the item's menu.
    MenuRequested,
}
