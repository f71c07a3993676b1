//! The item directory: accepts registrations on the well-known watcher
//! name, tracks the live item set, monitors the bus for peers that vanish,
//! and owns each item's proxy and menu synchronizer.

pub mod monitor;
pub mod registry;
pub mod set;
pub mod surface;
pub mod watcher;

pub use monitor::{NAME_LOST_GRACE, run_monitor};
pub use registry::{Registry, RegistryEvent};
pub use surface::{ResizeNotifier, SurfaceEvent, SurfaceProvider};
pub use watcher::Watcher;

/// Errors for registry operations.
///
/// Peer-facing traffic never produces these; peer errors are logged and
/// swallowed at the site that observes them. What remains are bus-level
/// failures of the registry's own plumbing.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("bus error: {0}")]
    Bus(#[from] zbus::Error),
}
