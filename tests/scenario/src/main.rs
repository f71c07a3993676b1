fn main() {
    println!("Run `cargo test -p scenario` to execute the end-to-end scenario tests.");
}

#[cfg(test)]
mod tests {
    use traywatch_menu::{
        MenuModel, SyncAction, SyncEvent, SyncState, build_menu,
    };
    use traywatch_protocol::MenuRecord;
    use traywatch_registry::set::{ItemSet, resolve_registration};

    fn labeled(id: i32, label: &str) -> MenuRecord {
        MenuRecord {
            id,
            label: Some(label.to_owned()),
            enabled: true,
            visible: true,
            ..MenuRecord::default()
        }
    }

    /// The full lifecycle from the registry's point of view: registration
    /// with a custom path, initial menu sync, a stale and a fresh layout
    /// notification, then peer disappearance past the grace period.
    #[test]
    fn register_sync_and_vanish() {
        // Peer registers with service="/CustomPath" under identity :1.42.
        let (service, path) = resolve_registration("/CustomPath", ":1.42");
        assert_eq!(service, ":1.42");
        assert_eq!(path, "/CustomPath");

        let mut directory = ItemSet::default();
        directory.insert(service.clone(), path);
        assert_eq!(directory.services(), vec![":1.42"]);
        assert_eq!(directory.len(), 1); // resize notified with count 1

        // Initial layout fetch: revision 1, two labeled, visible, enabled
        // children, no separators.
        let mut sync = SyncState::default();
        assert_eq!(
            sync.handle(SyncEvent::FetchCompleted { revision: 1 }),
            Some(SyncAction::Install)
        );
        let (model, bindings) = build_menu(&[labeled(1, "Show"), labeled(2, "Quit")]);
        assert!(matches!(model, MenuModel::Flat(_)));
        assert_eq!(model.entry_count(), 2);
        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|binding| binding.enabled));

        // A duplicate notification for revision 1: not strictly greater,
        // no fetch.
        assert_eq!(sync.handle(SyncEvent::LayoutUpdated { revision: 1 }), None);

        // Revision 2 while the menu is closed: exactly one fetch and a
        // rebuild.
        assert_eq!(
            sync.handle(SyncEvent::LayoutUpdated { revision: 2 }),
            Some(SyncAction::ScheduleFetch)
        );
        assert_eq!(
            sync.handle(SyncEvent::CoalesceElapsed),
            Some(SyncAction::Fetch)
        );
        assert_eq!(
            sync.handle(SyncEvent::FetchCompleted { revision: 2 }),
            Some(SyncAction::Install)
        );
        assert_eq!(sync.revision(), Some(2));

        // The peer's name drops and is not reacquired within the grace
        // window.
        assert!(directory.mark_closing(":1.42"));
        assert!(directory.is_closing(":1.42"));
        assert!(directory.remove(":1.42").is_some());
        assert!(directory.is_empty()); // resize notified with count 0

        // A second unregistration attempt has no observable effect.
        assert!(directory.remove(":1.42").is_none());
    }

    /// A name lost and reacquired before the grace timer fires must not
    /// unregister the item.
    #[test]
    fn brief_name_drop_survives_the_grace_period() {
        let mut directory = ItemSet::default();
        directory.insert(":1.9".into(), "/StatusNotifierItem".into());

        assert!(directory.mark_closing(":1.9"));
        // Reacquired before the timer fired.
        directory.clear_closing(":1.9");

        // Timer callback re-checks liveness instead of assuming staleness.
        assert!(!directory.is_closing(":1.9"));
        assert_eq!(directory.services(), vec![":1.9"]);
    }

    /// Updates arriving while the user has the menu open are applied once,
    /// after it closes.
    #[test]
    fn open_menu_blocks_rebuilds_until_closed() {
        let mut sync = SyncState::default();
        sync.handle(SyncEvent::FetchCompleted { revision: 1 });
        sync.handle(SyncEvent::MenuOpened);

        // A burst of qualifying signals while visible: no fetches at all.
        assert_eq!(sync.handle(SyncEvent::LayoutUpdated { revision: 2 }), None);
        assert_eq!(sync.handle(SyncEvent::PropertiesUpdated), None);
        assert_eq!(sync.handle(SyncEvent::LayoutUpdated { revision: 3 }), None);

        // One fetch on close, and the newest layout wins.
        assert_eq!(sync.handle(SyncEvent::MenuClosed), Some(SyncAction::Fetch));
        assert_eq!(
            sync.handle(SyncEvent::FetchCompleted { revision: 3 }),
            Some(SyncAction::Install)
        );
        assert_eq!(sync.revision(), Some(3));
    }

    /// Icon resolution end to end: a peer with no usable name publishes
    /// bitmaps, the closest size is picked and converted, and a repeated
    /// notification with identical data produces no update.
    #[test]
    fn icon_pipeline_selects_converts_and_deduplicates() {
        use traywatch_item::{IconSource, IconState};
        use traywatch_protocol::IconPixmap;

        let candidates = vec![
            IconPixmap {
                width: 16,
                height: 16,
                bytes: vec![0; 4 * 16 * 16],
            },
            IconPixmap {
                width: 22,
                height: 22,
                bytes: vec![0; 4 * 22 * 22],
            },
            IconPixmap {
                width: 32,
                height: 32,
                bytes: vec![0; 4 * 32 * 32],
            },
        ];

        let mut state = IconState::new(24);
        let source = state.initialize(Some(String::new()), Some(candidates.clone()));
        match source {
            IconSource::Bitmap(bitmap) => assert_eq!(bitmap.width, 22),
            IconSource::Named(name) => panic!("expected a bitmap, got {name}"),
        }

        // Notification storm with unchanged data: no redundant re-render.
        assert!(state.refresh_pixmaps(candidates).is_none());
    }

    /// Re-registration after a menu rebuild invalidates the previous
    /// generation's bindings: ids from the old tree never fire.
    #[test]
    fn rebuilt_tree_replaces_the_action_set() {
        let (_, first) = build_menu(&[labeled(1, "Start"), labeled(2, "Stop")]);
        let (_, second) = build_menu(&[labeled(7, "Start"), labeled(9, "Stop")]);

        let stale: Vec<&str> = first.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(stale, vec!["menuitem.1", "menuitem.2"]);

        // The new generation shares no action names with the old one.
        assert!(
            second
                .iter()
                .all(|binding| !stale.contains(&binding.name.as_str()))
        );
    }
}
