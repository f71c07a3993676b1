//! Menu synchronization for registered items.
//!
//! Each item that advertises a menu object gets one synchronizer: a task
//! that pulls the remotely-owned, revisioned layout tree, rebuilds the local
//! menu model with bound actions, and keeps it current under revision-gated,
//! debounced, visibility-aware refresh. A menu the user currently has open
//! is never rebuilt underneath them; qualifying updates are deferred and
//! re-applied when it closes.

pub mod model;
pub mod state;
pub mod surface;
pub mod sync;

pub use model::{ACTION_PREFIX, ActionBinding, MenuEntry, MenuModel, build_menu};
pub use state::{COALESCE_DELAY, SyncAction, SyncEvent, SyncState};
pub use surface::PresentationSurface;
pub use sync::{ABOUT_TO_SHOW_GRACE, MenuCommand, MenuSyncTask, spawn};
