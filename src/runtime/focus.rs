use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEntry {
    pub owner: String,
    pub zone_id: String,
}

/// Single slot recording which zone currently receives keyboard input.
#[derive(Default)]
pub struct FocusRegistry {
    inner: RwLock<Option<FocusEntry>>,
}

impl FocusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_focus(&self, owner: impl Into<String>, zone_id: impl Into<String>) {
        let entry = FocusEntry {
            owner: owner.into(),
            zone_id: zone_id.into(),
        };
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(entry);
        }
    }

    pub fn clear_focus(&self, owner: &str) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.as_ref().map(|e| e.owner.as_str()) == Some(owner) {
                *guard = None;
            }
        }
    }

    pub fn current(&self) -> Option<FocusEntry> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_focused(&self, zone_id: &str) -> bool {
        self.inner
            .read()
            .map(|guard| guard.as_ref().is_some_and(|entry| entry.zone_id == zone_id))
            .unwrap_or(false)
    }
}

pub type SharedFocus = Arc<FocusRegistry>;

/// Ordered set of focus stops cycled with Tab / BackTab.
pub struct FocusRing {
    owner: String,
    stops: Vec<(String, String)>,
    registry: SharedFocus,
}

impl FocusRing {
    pub fn new(owner: impl Into<String>, registry: SharedFocus) -> Self {
        Self {
            owner: owner.into(),
            stops: Vec::new(),
            registry,
        }
    }

    pub fn with_stop(mut self, zone_id: impl Into<String>, label: impl Into<String>) -> Self {
        self.stops.push((zone_id.into(), label.into()));
        self
    }

    pub fn registry(&self) -> &SharedFocus {
        &self.registry
    }

    /// Focus the first stop unless something already holds focus.
    pub fn ensure_focus(&self) {
        if self.registry.current().is_none() {
            if let Some((zone, _)) = self.stops.first() {
                self.registry.set_focus(&self.owner, zone.clone());
            }
        }
    }

    pub fn advance(&self) {
        self.step(1);
    }

    pub fn retreat(&self) {
        self.step(self.stops.len().saturating_sub(1));
    }

    fn step(&self, offset: usize) {
        if self.stops.is_empty() {
            return;
        }
        let next = match self.position() {
            Some(idx) => (idx + offset) % self.stops.len(),
            None => 0,
        };
        self.registry
            .set_focus(&self.owner, self.stops[next].0.clone());
    }

    fn position(&self) -> Option<usize> {
        let current = self.registry.current()?;
        self.stops.iter().position(|(zone, _)| *zone == current.zone_id)
    }

    /// Human label of the focused stop, if focus sits on one of the stops.
    pub fn current_label(&self) -> Option<&str> {
        self.position().map(|idx| self.stops[idx].1.as_str())
    }
}
