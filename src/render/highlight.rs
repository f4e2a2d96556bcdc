use std::collections::HashMap;

use tracing::trace;

/// Handle to one overlay box of a rendered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(usize);

/// Handle to one list entry of a rendered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(usize);

impl OverlayHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl EntryHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Element the pointer entered or left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverTarget {
    Overlay(OverlayHandle),
    Entry(EntryHandle),
}

#[derive(Debug, Clone)]
struct LinkedPair {
    id: String,
    overlay: OverlayHandle,
    entry: EntryHandle,
    highlighted: bool,
}

/// Bidirectional pairing between overlay boxes, list entries and result ids.
///
/// Every handle belongs to exactly one pair, and hovering either side of a pair
/// toggles both. Handles from another rendered set are ignored.
#[derive(Debug, Clone, Default)]
pub struct HighlightLinks {
    pairs: Vec<LinkedPair>,
    by_id: HashMap<String, usize>,
}

impl HighlightLinks {
    pub fn new<I>(ids: I) -> HighlightLinks
    where
        I: IntoIterator<Item = String>,
    {
        let mut links = HighlightLinks::default();
        for (index, id) in ids.into_iter().enumerate() {
            links.by_id.entry(id.clone()).or_insert(index);
            links.pairs.push(LinkedPair {
                id,
                overlay: OverlayHandle(index),
                entry: EntryHandle(index),
                highlighted: false,
            });
        }
        links
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = (OverlayHandle, EntryHandle)> + '_ {
        self.pairs.iter().map(|pair| (pair.overlay, pair.entry))
    }

    pub fn pair_for_id(&self, id: &str) -> Option<(OverlayHandle, EntryHandle)> {
        let pair = &self.pairs[*self.by_id.get(id)?];
        Some((pair.overlay, pair.entry))
    }

    pub fn id_of(&self, target: HoverTarget) -> Option<&str> {
        self.pair(target).map(|pair| pair.id.as_str())
    }

    /// The other half of the target's pair.
    pub fn partner(&self, target: HoverTarget) -> Option<HoverTarget> {
        let pair = self.pair(target)?;
        Some(match target {
            HoverTarget::Overlay(_) => HoverTarget::Entry(pair.entry),
            HoverTarget::Entry(_) => HoverTarget::Overlay(pair.overlay),
        })
    }

    pub fn enter(&mut self, target: HoverTarget) {
        self.set(target, true);
    }

    pub fn leave(&mut self, target: HoverTarget) {
        self.set(target, false);
    }

    pub fn is_overlay_highlighted(&self, handle: OverlayHandle) -> bool {
        self.pair(HoverTarget::Overlay(handle)).map_or(false, |pair| pair.highlighted)
    }

    pub fn is_entry_highlighted(&self, handle: EntryHandle) -> bool {
        self.pair(HoverTarget::Entry(handle)).map_or(false, |pair| pair.highlighted)
    }

    pub fn highlighted_ids(&self) -> Vec<&str> {
        self.pairs.iter().filter(|pair| pair.highlighted).map(|pair| pair.id.as_str()).collect()
    }

    fn pair(&self, target: HoverTarget) -> Option<&LinkedPair> {
        let index = match target {
            HoverTarget::Overlay(handle) => handle.0,
            HoverTarget::Entry(handle) => handle.0,
        };
        self.pairs.get(index)
    }

    fn set(&mut self, target: HoverTarget, highlighted: bool) {
        let index = match target {
            HoverTarget::Overlay(handle) => handle.0,
            HoverTarget::Entry(handle) => handle.0,
        };
        if let Some(pair) = self.pairs.get_mut(index) {
            trace!("highlight {} -> {}", pair.id, highlighted);
            pair.highlighted = highlighted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> HighlightLinks {
        HighlightLinks::new(["face-0", "face-1", "face-2"].map(String::from))
    }

    #[test]
    fn overlay_hover_highlights_both_sides() {
        let mut links = links();
        let (overlay, entry) = links.pair_for_id("face-1").unwrap();

        links.enter(HoverTarget::Overlay(overlay));
        assert!(links.is_overlay_highlighted(overlay));
        assert!(links.is_entry_highlighted(entry));
        assert_eq!(links.highlighted_ids(), vec!["face-1"]);

        links.leave(HoverTarget::Overlay(overlay));
        assert!(!links.is_overlay_highlighted(overlay));
        assert!(!links.is_entry_highlighted(entry));
        assert!(links.highlighted_ids().is_empty());
    }

    #[test]
    fn entry_hover_is_symmetric() {
        let mut links = links();
        let (overlay, entry) = links.pair_for_id("face-2").unwrap();

        links.enter(HoverTarget::Entry(entry));
        assert!(links.is_overlay_highlighted(overlay));
        // leaving through the other element clears the pair too
        links.leave(HoverTarget::Overlay(overlay));
        assert!(!links.is_entry_highlighted(entry));
    }

    #[test]
    fn other_pairs_untouched() {
        let mut links = links();
        let (overlay, _) = links.pair_for_id("face-0").unwrap();
        links.enter(HoverTarget::Overlay(overlay));

        for (other_overlay, other_entry) in links.handles().skip(1) {
            assert!(!links.is_overlay_highlighted(other_overlay));
            assert!(!links.is_entry_highlighted(other_entry));
        }
    }

    #[test]
    fn partner_and_id_lookup() {
        let links = links();
        let (overlay, entry) = links.pair_for_id("face-0").unwrap();
        assert_eq!(links.partner(HoverTarget::Overlay(overlay)), Some(HoverTarget::Entry(entry)));
        assert_eq!(links.partner(HoverTarget::Entry(entry)), Some(HoverTarget::Overlay(overlay)));
        assert_eq!(links.id_of(HoverTarget::Entry(entry)), Some("face-0"));
        assert!(links.pair_for_id("face-9").is_none());
    }

    #[test]
    fn foreign_handle_is_ignored() {
        let mut small = HighlightLinks::new(["only".to_string()]);
        let big = links();
        let (foreign, _) = big.pair_for_id("face-2").unwrap();

        small.enter(HoverTarget::Overlay(foreign));
        assert!(small.highlighted_ids().is_empty());
        assert!(small.partner(HoverTarget::Overlay(foreign)).is_none());
    }
}
