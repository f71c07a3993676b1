//! Icon source selection and change detection.
//!
//! An item paints from exactly one source at a time. Precedence when
//! deciding: a non-empty symbolic name beats a bitmap set, which beats the
//! fixed fallback name. On change notifications only the representation
//! currently in use is compared; an unchanged value produces no new source,
//! which keeps notification storms from forcing redundant re-renders.

use traywatch_icon::{select_by_size, to_rgba};
use traywatch_protocol::IconPixmap;

/// Name used when a peer provides neither a symbolic name nor bitmaps.
pub const FALLBACK_ICON: &str = "image-missing";

/// The resolved presentation source for an item's icon.
///
/// Bitmap sources carry one bitmap, already selected for the target size
/// and converted to alpha-last sample order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    Named(String),
    Bitmap(IconPixmap),
}

/// Cached icon state for one item. Tracks whichever raw representation is
/// authoritative; switching representations fully replaces the source.
#[derive(Debug)]
pub struct IconState {
    target_size: i32,
    name: Option<String>,
    pixmaps: Option<Vec<IconPixmap>>,
}

impl IconState {
    pub fn new(target_size: i32) -> Self {
        Self {
            target_size,
            name: None,
            pixmaps: None,
        }
    }

    /// Decides the initial source from the properties read at setup.
    pub fn initialize(
        &mut self,
        name: Option<String>,
        pixmaps: Option<Vec<IconPixmap>>,
    ) -> IconSource {
        match name.filter(|name| !name.is_empty()) {
            Some(name) => {
                let source = IconSource::Named(name.clone());
                self.name = Some(name);
                self.pixmaps = None;
                source
            }
            None => match pixmaps.filter(|set| !set.is_empty()) {
                Some(set) => {
                    let source = self.bitmap_source(&set);
                    self.name = None;
                    self.pixmaps = Some(set);
                    source
                }
                None => IconSource::Named(FALLBACK_ICON.to_owned()),
            },
        }
    }

    /// True when a symbolic name is the authoritative representation.
    pub fn tracks_name(&self) -> bool {
        self.name.is_some()
    }

    /// True when the bitmap set is the authoritative representation.
    pub fn tracks_pixmaps(&self) -> bool {
        self.pixmaps.is_some()
    }

    /// Compares a freshly fetched name against the cached one. Returns the
    /// replacement source only when the value actually changed.
    pub fn refresh_name(&mut self, fresh: String) -> Option<IconSource> {
        if self.name.as_deref() == Some(fresh.as_str()) {
            return None;
        }
        self.name = Some(fresh.clone());
        Some(IconSource::Named(fresh))
    }

    /// Compares a freshly fetched bitmap set against the cached one by
    /// value. Returns the replacement source only on a real change.
    pub fn refresh_pixmaps(&mut self, fresh: Vec<IconPixmap>) -> Option<IconSource> {
        if self.pixmaps.as_deref() == Some(fresh.as_slice()) {
            return None;
        }
        let source = self.bitmap_source(&fresh);
        self.pixmaps = Some(fresh);
        Some(source)
    }

    fn bitmap_source(&self, set: &[IconPixmap]) -> IconSource {
        match select_by_size(set, self.target_size) {
            Some(selected) => IconSource::Bitmap(to_rgba(selected.clone())),
            None => IconSource::Named(FALLBACK_ICON.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixmap(width: i32) -> IconPixmap {
        IconPixmap {
            width,
            height: width,
            bytes: vec![0; (4 * width * width) as usize],
        }
    }

    #[test]
    fn nonempty_name_beats_pixmaps() {
        let mut state = IconState::new(22);
        let source = state.initialize(Some("audio-volume-high".into()), Some(vec![pixmap(22)]));
        assert_eq!(source, IconSource::Named("audio-volume-high".into()));
        assert!(state.tracks_name());
        assert!(!state.tracks_pixmaps());
    }

    #[test]
    fn empty_name_falls_through_to_pixmaps() {
        let mut state = IconState::new(22);
        let source = state.initialize(Some(String::new()), Some(vec![pixmap(16), pixmap(22)]));
        match source {
            IconSource::Bitmap(bitmap) => assert_eq!(bitmap.width, 22),
            IconSource::Named(name) => panic!("expected a bitmap, got {name}"),
        }
        assert!(state.tracks_pixmaps());
    }

    #[test]
    fn nothing_available_uses_the_fallback() {
        let mut state = IconState::new(22);
        let source = state.initialize(None, Some(Vec::new()));
        assert_eq!(source, IconSource::Named(FALLBACK_ICON.into()));
        assert!(!state.tracks_name());
        assert!(!state.tracks_pixmaps());
    }

    #[test]
    fn unchanged_name_produces_no_update() {
        let mut state = IconState::new(22);
        state.initialize(Some("a".into()), None);
        assert!(state.refresh_name("a".into()).is_none());
        assert_eq!(
            state.refresh_name("b".into()),
            Some(IconSource::Named("b".into()))
        );
    }

    #[test]
    fn unchanged_pixmaps_produce_no_update() {
        let mut state = IconState::new(22);
        state.initialize(None, Some(vec![pixmap(22)]));
        assert!(state.refresh_pixmaps(vec![pixmap(22)]).is_none());

        let changed = state.refresh_pixmaps(vec![pixmap(32)]);
        match changed {
            Some(IconSource::Bitmap(bitmap)) => assert_eq!(bitmap.width, 32),
            other => panic!("expected a bitmap update, got {other:?}"),
        }
    }

    #[test]
    fn bitmap_sources_are_converted_to_alpha_last() {
        let mut state = IconState::new(1);
        let raw = IconPixmap {
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3, 4],
        };
        let source = state.initialize(None, Some(vec![raw]));
        match source {
            IconSource::Bitmap(bitmap) => assert_eq!(bitmap.bytes, vec![2, 3, 4, 1]),
            IconSource::Named(name) => panic!("expected a bitmap, got {name}"),
        }
    }
}
