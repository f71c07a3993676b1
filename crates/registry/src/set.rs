//! The live item set and registration resolution.
//!
//! Pure data handling, exercised directly by the registry under its lock:
//! exactly one writer, readers go through accessor calls. Registration
//! order is preserved for the directory listing.

use traywatch_protocol::names::DEFAULT_ITEM_PATH;

/// One registered peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Effective bus identity the item is correlated under.
    pub service: String,
    /// Object path the item lives at.
    pub object_path: String,
    /// The peer's name dropped off the bus and a grace timer is running.
    pub closing: bool,
}

/// Ordered collection of live items. Item counts are small; linear scans
/// are fine.
#[derive(Debug, Default)]
pub struct ItemSet {
    items: Vec<ItemRecord>,
}

impl ItemSet {
    /// Appends a new registration.
    pub fn insert(&mut self, service: String, object_path: String) {
        self.items.push(ItemRecord {
            service,
            object_path,
            closing: false,
        });
    }

    /// Removes an item. Idempotent: an absent service returns `None` and
    /// changes nothing.
    pub fn remove(&mut self, service: &str) -> Option<ItemRecord> {
        let index = self.items.iter().position(|item| item.service == service)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, service: &str) -> bool {
        self.items.iter().any(|item| item.service == service)
    }

    /// Flags an item whose bus name lost its owner. Returns `true` when a
    /// grace timer should be started: the item exists and is not already
    /// closing.
    pub fn mark_closing(&mut self, service: &str) -> bool {
        match self.items.iter_mut().find(|item| item.service == service) {
            Some(item) if !item.closing => {
                item.closing = true;
                true
            }
            _ => false,
        }
    }

    /// Clears the closing flag after the peer reacquired its name.
    pub fn clear_closing(&mut self, service: &str) {
        if let Some(item) = self.items.iter_mut().find(|item| item.service == service) {
            item.closing = false;
        }
    }

    /// Whether the item is still flagged as closing. Grace timer callbacks
    /// re-check this instead of assuming staleness.
    pub fn is_closing(&self, service: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.service == service && item.closing)
    }

    /// Peer identities in registration order.
    pub fn services(&self) -> Vec<String> {
        self.items.iter().map(|item| item.service.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolves a registration request into `(effective identity, object path)`.
///
/// An absolute path means the peer hosts its item there under its own
/// identity. A bare token means the default path, and when the token names
/// a bus identity different from the literal caller, the declared identity
/// is used for all subsequent correlation (peers that multiplex items under
/// one connection alias rely on this). A token equal to the caller needs no
/// special-casing.
pub fn resolve_registration(declared: &str, caller: &str) -> (String, String) {
    if declared.starts_with('/') {
        (caller.to_owned(), declared.to_owned())
    } else if !declared.is_empty() && declared != caller {
        (declared.to_owned(), DEFAULT_ITEM_PATH.to_owned())
    } else {
        (caller.to_owned(), DEFAULT_ITEM_PATH.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(services: &[&str]) -> ItemSet {
        let mut set = ItemSet::default();
        for service in services {
            set.insert((*service).to_owned(), DEFAULT_ITEM_PATH.to_owned());
        }
        set
    }

    #[test]
    fn listing_preserves_registration_order() {
        let set = set_with(&[":1.7", ":1.3", ":1.5"]);
        assert_eq!(set.services(), vec![":1.7", ":1.3", ":1.5"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = set_with(&[":1.7"]);
        assert!(set.remove(":1.7").is_some());
        assert!(set.remove(":1.7").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn mark_closing_only_starts_one_timer() {
        let mut set = set_with(&[":1.7"]);
        assert!(set.mark_closing(":1.7"));
        // Second loss notification while the timer runs: no second timer.
        assert!(!set.mark_closing(":1.7"));
        assert!(set.is_closing(":1.7"));
    }

    #[test]
    fn mark_closing_ignores_unknown_services() {
        let mut set = set_with(&[":1.7"]);
        assert!(!set.mark_closing(":1.9"));
    }

    #[test]
    fn reacquisition_clears_the_closing_flag() {
        let mut set = set_with(&[":1.7"]);
        set.mark_closing(":1.7");
        set.clear_closing(":1.7");
        // The grace timer will find nothing to do.
        assert!(!set.is_closing(":1.7"));
        assert!(set.contains(":1.7"));
    }

    #[test]
    fn absolute_path_registers_under_the_caller() {
        let (service, path) = resolve_registration("/CustomPath", ":1.42");
        assert_eq!(service, ":1.42");
        assert_eq!(path, "/CustomPath");
    }

    #[test]
    fn bare_token_uses_the_default_path() {
        let (service, path) = resolve_registration(":1.42", ":1.42");
        assert_eq!(service, ":1.42");
        assert_eq!(path, DEFAULT_ITEM_PATH);
    }

    #[test]
    fn delegated_identity_wins_over_the_caller() {
        let (service, path) = resolve_registration("org.example.Tray", ":1.42");
        assert_eq!(service, "org.example.Tray");
        assert_eq!(path, DEFAULT_ITEM_PATH);
    }

    #[test]
    fn empty_token_falls_back_to_the_caller() {
        let (service, path) = resolve_registration("", ":1.42");
        assert_eq!(service, ":1.42");
        assert_eq!(path, DEFAULT_ITEM_PATH);
    }
}
