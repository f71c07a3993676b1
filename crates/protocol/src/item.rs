//! Client proxy for the `org.kde.StatusNotifierItem` interface.

use serde::{Deserialize, Serialize};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Type, Value};

/// One raw icon bitmap as broadcast by a peer: width, height, and
/// 4-byte-per-pixel samples in alpha-first (ARGB) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type, Value, OwnedValue)]
pub struct IconPixmap {
    pub width: i32,
    pub height: i32,
    pub bytes: Vec<u8>,
}

/// Proxy for a peer's item object.
///
/// Property caching is disabled when building this proxy: items announce
/// icon changes via the custom `NewIcon` signal rather than
/// `PropertiesChanged`, so cached values would go stale.
#[zbus::proxy(
    interface = "org.kde.StatusNotifierItem",
    default_path = "/StatusNotifierItem",
    gen_blocking = false
)]
pub trait StatusNotifierItem {
    /// Primary-click forwarding. The result is ignored by callers.
    fn activate(&self, x: i32, y: i32) -> zbus::Result<()>;

    #[zbus(property)]
    fn icon_name(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn icon_pixmap(&self) -> zbus::Result<Vec<IconPixmap>>;

    #[zbus(property)]
    fn icon_theme_path(&self) -> zbus::Result<String>;

    /// Object path of the item's menu, empty if it has none.
    #[zbus(property)]
    fn menu(&self) -> zbus::Result<OwnedObjectPath>;

    /// Emitted by the peer whenever its icon changed; carries no data, the
    /// consumer re-reads whichever icon properties it tracks.
    #[zbus(signal)]
    fn new_icon(&self) -> zbus::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_pixmap_wire_signature() {
        assert_eq!(IconPixmap::SIGNATURE.to_string(), "(iiay)");
    }

    #[test]
    fn icon_pixmap_equality_is_by_value() {
        let a = IconPixmap {
            width: 2,
            height: 1,
            bytes: vec![0, 1, 2, 3, 4, 5, 6, 7],
        };
        let b = a.clone();
        assert_eq!(a, b);

        let c = IconPixmap {
            bytes: vec![9, 9, 9, 9, 9, 9, 9, 9],
            ..a.clone()
        };
        assert_ne!(a, c);
    }
}
