//! Wire-facing types for the StatusNotifier and DBusMenu protocols.
//!
//! Everything that touches raw bus data lives here: the well-known names,
//! the client proxies for the two peer interfaces, and the typed records
//! built from the dynamic property maps peers send. The rest of the
//! workspace never sees an untyped variant map.

pub mod errors;
pub mod item;
pub mod menu;
pub mod names;

pub use errors::{is_transient_peer_error, is_unknown_method_error};
pub use item::{IconPixmap, StatusNotifierItemProxy};
pub use menu::{DBusMenuProxy, LayoutNode, MenuRecord};
