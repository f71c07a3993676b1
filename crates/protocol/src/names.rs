//! Well-known bus names, object paths, and protocol constants.

/// Well-known name the registry owns on the session bus.
pub const WATCHER_BUS: &str = "org.kde.StatusNotifierWatcher";

/// Object path the registry serves its interface at.
pub const WATCHER_PATH: &str = "/StatusNotifierWatcher";

/// Default object path for items whose registration carries a bare token
/// instead of an absolute path.
pub const DEFAULT_ITEM_PATH: &str = "/StatusNotifierItem";

/// Interface name items expose.
pub const ITEM_INTERFACE: &str = "org.kde.StatusNotifierItem";

/// Interface name menu objects expose.
pub const MENU_INTERFACE: &str = "com.canonical.dbusmenu";

/// Version reported by the `ProtocolVersion` property.
pub const PROTOCOL_VERSION: i32 = 0;
