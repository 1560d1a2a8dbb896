use std::collections::{HashMap, HashSet};

use blake3::Hash;

use crate::error::{PageError, Result};
use crate::geometry::Rect;

pub type ZoneId = String;

/// User facing payload stored for each zone.
pub type ZoneContent = String;

#[derive(Debug, Clone)]
pub struct ZoneState {
    pub rect: Rect,
    pub content: ZoneContent,
    /// Content is already laid out line by line and must not be re-wrapped.
    pub pre_rendered: bool,
    hash: Option<Hash>,
}

impl ZoneState {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            content: ZoneContent::new(),
            pre_rendered: false,
            hash: None,
        }
    }

    /// Returns true when the stored content actually changed.
    fn update_content(&mut self, content: ZoneContent, pre_rendered: bool) -> bool {
        let new_hash = blake3::hash(content.as_bytes());
        let unchanged = self.hash == Some(new_hash) && self.pre_rendered == pre_rendered;
        if unchanged {
            return false;
        }
        self.content = content;
        self.pre_rendered = pre_rendered;
        self.hash = Some(new_hash);
        true
    }
}

/// Registry mapping layout zones to their last known states.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    entries: HashMap<ZoneId, ZoneState>,
    dirty: HashSet<ZoneId>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile zones with a freshly solved layout. New or moved zones are
    /// marked dirty; zones missing from the layout are dropped.
    pub fn sync_layout(&mut self, solved_rects: &HashMap<ZoneId, Rect>) {
        for (id, rect) in solved_rects {
            let state = self
                .entries
                .entry(id.clone())
                .or_insert_with(|| ZoneState::new(Rect::default()));
            if state.rect != *rect || state.hash.is_none() {
                state.rect = *rect;
                self.dirty.insert(id.clone());
            }
        }

        self.entries.retain(|id, _| solved_rects.contains_key(id));
        self.dirty.retain(|id| solved_rects.contains_key(id));
    }

    pub fn apply_content(&mut self, zone_id: &str, content: ZoneContent) -> Result<()> {
        self.apply(zone_id, content, false)
    }

    pub fn apply_pre_rendered(&mut self, zone_id: &str, content: ZoneContent) -> Result<()> {
        self.apply(zone_id, content, true)
    }

    fn apply(&mut self, zone_id: &str, content: ZoneContent, pre_rendered: bool) -> Result<()> {
        let entry = self
            .entries
            .get_mut(zone_id)
            .ok_or_else(|| PageError::ZoneNotFound(zone_id.to_string()))?;
        if entry.update_content(content, pre_rendered) {
            self.dirty.insert(zone_id.to_string());
        }
        Ok(())
    }

    pub fn take_dirty(&mut self) -> Vec<(ZoneId, ZoneState)> {
        let mut ids: Vec<_> = self.dirty.drain().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.entries.get(&id).map(|state| (id.clone(), state.clone())))
            .collect()
    }

    pub fn rect_of(&self, zone_id: &str) -> Option<Rect> {
        self.entries.get(zone_id).map(|state| state.rect)
    }

    pub fn content_of(&self, zone_id: &str) -> Option<&str> {
        self.entries.get(zone_id).map(|state| state.content.as_str())
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(id: &str, rect: Rect) -> HashMap<ZoneId, Rect> {
        let mut map = HashMap::new();
        map.insert(id.to_string(), rect);
        map
    }

    #[test]
    fn sync_layout_flags_new_zones_as_dirty() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved("eppa:map.plate", Rect::new(0, 0, 10, 5)));
        let dirty = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].0, "eppa:map.plate");
    }

    #[test]
    fn identical_content_is_not_redrawn() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved("card", Rect::new(0, 0, 10, 5)));
        registry.take_dirty();

        registry.apply_content("card", "Sala Zen".to_string()).unwrap();
        assert_eq!(registry.take_dirty().len(), 1);

        registry.apply_content("card", "Sala Zen".to_string()).unwrap();
        assert!(registry.take_dirty().is_empty());
        assert_eq!(registry.content_of("card"), Some("Sala Zen"));
    }

    #[test]
    fn moved_zone_is_dirty_again() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved("card", Rect::new(0, 0, 10, 5)));
        registry.apply_content("card", "Apoio".to_string()).unwrap();
        registry.take_dirty();

        registry.sync_layout(&solved("card", Rect::new(0, 1, 10, 5)));
        let dirty = registry.take_dirty();
        assert_eq!(dirty[0].1.rect, Rect::new(0, 1, 10, 5));
        assert_eq!(dirty[0].1.content, "Apoio");
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let mut registry = ZoneRegistry::new();
        let err = registry
            .apply_content("missing", String::new())
            .unwrap_err();
        assert!(matches!(err, PageError::ZoneNotFound(id) if id == "missing"));
    }
}
