//! The synchronization state machine.
//!
//! All debounce/defer/reschedule decisions are made here as a pure
//! `(state, event) -> action` function; the driver in [`crate::sync`] only
//! executes the returned actions. Invariants enforced:
//!
//! - a layout-changed notification triggers a fetch only when its revision
//!   is strictly greater than the last applied one;
//! - at most one fetch is in flight or scheduled at a time, except for the
//!   one fetch a menu-closed event is allowed to issue directly;
//! - nothing is fetched or installed while the menu is visible; such
//!   updates are remembered and re-applied once it closes.

use std::time::Duration;

/// Delay used to coalesce bursts of update signals into one fetch.
pub const COALESCE_DELAY: Duration = Duration::from_millis(100);

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Remote `LayoutUpdated` signal with its revision number.
    LayoutUpdated { revision: u32 },
    /// Remote `ItemsPropertiesUpdated` signal (updated or removed sets).
    PropertiesUpdated,
    /// The coalescing timer armed by [`SyncAction::ScheduleFetch`] fired.
    CoalesceElapsed,
    /// A layout fetch finished and the tree was built.
    FetchCompleted { revision: u32 },
    /// A layout fetch failed; the error was already logged.
    FetchFailed,
    /// The presentation surface reported the menu opened.
    MenuOpened,
    /// The presentation surface reported the menu closed.
    MenuClosed,
}

/// Outputs of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Arm the coalescing timer; a fetch follows when it fires.
    ScheduleFetch,
    /// Issue a layout fetch now.
    Fetch,
    /// Install the freshly built tree into the presentation surface.
    Install,
    /// Drop the freshly built tree (the menu opened while fetching).
    Discard,
}

/// Per-synchronizer state. Mutated only by its own driver task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncState {
    /// Last applied revision; `None` until the first fetch completes.
    revision: Option<u32>,
    /// A fetch is in flight or scheduled.
    update_pending: bool,
    /// The coalescing timer is armed and has not fired yet.
    fetch_scheduled: bool,
    /// A remote change arrived while the menu was open and must be
    /// re-applied once it closes.
    deferred: bool,
    /// The menu is currently displayed to the user.
    visible: bool,
}

impl SyncState {
    pub fn handle(&mut self, event: SyncEvent) -> Option<SyncAction> {
        match event {
            SyncEvent::LayoutUpdated { revision } => {
                // Monotonic gate: equal or older revisions are stale or
                // duplicate deliveries.
                if self.revision.is_some_and(|current| revision <= current) {
                    return None;
                }
                self.qualify()
            }
            SyncEvent::PropertiesUpdated => self.qualify(),
            SyncEvent::CoalesceElapsed => {
                if !self.fetch_scheduled {
                    return None;
                }
                self.fetch_scheduled = false;
                if self.visible {
                    // The menu opened while the timer ran; re-apply on close.
                    self.update_pending = false;
                    self.deferred = true;
                    return None;
                }
                self.update_pending = true;
                Some(SyncAction::Fetch)
            }
            SyncEvent::FetchCompleted { revision } => {
                self.update_pending = false;
                if self.visible {
                    // Never swap a tree the user is mid-click on. The stored
                    // revision does not advance, so a later signal still
                    // passes the gate after the menu closes.
                    self.deferred = true;
                    return Some(SyncAction::Discard);
                }
                self.revision = Some(self.revision.map_or(revision, |r| r.max(revision)));
                Some(SyncAction::Install)
            }
            SyncEvent::FetchFailed => {
                self.update_pending = false;
                None
            }
            SyncEvent::MenuOpened => {
                self.visible = true;
                None
            }
            SyncEvent::MenuClosed => {
                self.visible = false;
                if self.deferred {
                    // User-driven path: fetches immediately even if a
                    // coalescing timer is still armed.
                    self.deferred = false;
                    self.update_pending = true;
                    return Some(SyncAction::Fetch);
                }
                None
            }
        }
    }

    /// Common path for signals that qualify for a refetch attempt.
    fn qualify(&mut self) -> Option<SyncAction> {
        if self.visible {
            self.deferred = true;
            return None;
        }
        if self.update_pending {
            return None;
        }
        self.update_pending = true;
        self.fetch_scheduled = true;
        Some(SyncAction::ScheduleFetch)
    }

    /// Overrides the visibility flag from the surface accessor. Used right
    /// before applying a fetch result, since the menu may have opened while
    /// the fetch was in flight and the notification not yet processed.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }
}
