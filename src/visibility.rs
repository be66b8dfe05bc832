//! Viewport-proximity activation for lazy placeholders.
//!
//! Each observed item fires once, the first time its bounds come within the
//! margin of the viewport, and is then forgotten. Items that never get close
//! never fire.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::trace;

/// Axis-aligned bounds in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// The visible window of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(scroll_x: f32, scroll_y: f32, width: f32, height: f32) -> Self {
        Self {
            scroll_x,
            scroll_y,
            width,
            height,
        }
    }

    fn expanded(&self, margin: f32) -> Bounds {
        Bounds {
            x: self.scroll_x - margin,
            y: self.scroll_y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Gap between `bounds` and the viewport; 0 when they overlap.
    fn distance_to(&self, bounds: &Bounds) -> f32 {
        let dx = (self.scroll_x - bounds.right())
            .max(bounds.x - (self.scroll_x + self.width))
            .max(0.0);
        let dy = (self.scroll_y - bounds.bottom())
            .max(bounds.y - (self.scroll_y + self.height))
            .max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

fn intersects(a: &Bounds, b: &Bounds) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

#[derive(Debug, Clone)]
struct Observation {
    bounds: Bounds,
    margin: f32,
    /// Registration order, used to break distance ties.
    seq: u64,
}

/// Single-shot proximity observer over a set of keyed items.
#[derive(Debug, Clone)]
pub struct VisibilityScheduler<K> {
    observed: HashMap<K, Observation>,
    next_seq: u64,
    last_viewport: Option<Viewport>,
    fired: HashSet<K>,
}

impl<K> Default for VisibilityScheduler<K> {
    fn default() -> Self {
        Self {
            observed: HashMap::new(),
            next_seq: 0,
            last_viewport: None,
            fired: HashSet::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> VisibilityScheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `key` and returns `true` if it activated immediately.
    ///
    /// An item already within range of the last known viewport fires here.
    /// Re-observing an item that is still pending only updates its bounds and
    /// margin. Items that have already fired are ignored.
    pub fn observe(&mut self, key: K, bounds: Bounds, margin_px: f32) -> bool {
        if self.fired.contains(&key) {
            return false;
        }
        let margin = margin_px.max(0.0);
        if let Some(viewport) = self.last_viewport {
            if intersects(&viewport.expanded(margin), &bounds) {
                self.observed.remove(&key);
                self.fired.insert(key);
                trace!(pending = self.observed.len(), "item activated on observe");
                return true;
            }
        }
        let seq = self.next_seq;
        match self.observed.get_mut(&key) {
            Some(existing) => {
                existing.bounds = bounds;
                existing.margin = margin;
            }
            None => {
                self.next_seq += 1;
                self.observed.insert(
                    key,
                    Observation {
                        bounds,
                        margin,
                        seq,
                    },
                );
            }
        }
        false
    }

    /// Fires `key` without a viewport check. Returns `false` if it had
    /// already fired.
    pub fn mark_fired(&mut self, key: K) -> bool {
        self.observed.remove(&key);
        self.fired.insert(key)
    }

    /// Updates the bounds of a pending item after a relayout.
    pub fn update_bounds(&mut self, key: &K, bounds: Bounds) -> bool {
        match self.observed.get_mut(key) {
            Some(obs) => {
                obs.bounds = bounds;
                true
            }
            None => false,
        }
    }

    pub fn unobserve(&mut self, key: &K) -> bool {
        self.observed.remove(key).is_some()
    }

    /// Records the new viewport and returns the items that activated,
    /// nearest to the viewport first.
    pub fn on_scroll(&mut self, viewport: Viewport) -> Vec<K> {
        self.last_viewport = Some(viewport);
        self.check()
    }

    /// Re-evaluates pending items against the last known viewport.
    pub fn check(&mut self) -> Vec<K> {
        let Some(viewport) = self.last_viewport else {
            return Vec::new();
        };

        let mut hits: Vec<(f32, u64, K)> = self
            .observed
            .iter()
            .filter(|(_, obs)| intersects(&viewport.expanded(obs.margin), &obs.bounds))
            .map(|(key, obs)| (viewport.distance_to(&obs.bounds), obs.seq, key.clone()))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let activated: Vec<K> = hits.into_iter().map(|(_, _, key)| key).collect();
        for key in &activated {
            self.observed.remove(key);
            self.fired.insert(key.clone());
        }
        if !activated.is_empty() {
            trace!(count = activated.len(), pending = self.observed.len(), "items activated");
        }
        activated
    }

    pub fn is_observing(&self, key: &K) -> bool {
        self.observed.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.observed.len()
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    /// Detaches every observer.
    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.last_viewport = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(count: usize, tile_h: f32) -> VisibilityScheduler<usize> {
        let mut s = VisibilityScheduler::new();
        for i in 0..count {
            s.observe(i, Bounds::new(0.0, i as f32 * tile_h, 300.0, tile_h), 100.0);
        }
        s
    }

    #[test]
    fn test_nothing_fires_without_viewport() {
        let mut s = column(3, 400.0);
        assert!(s.check().is_empty());
        assert_eq!(s.pending_count(), 3);
    }

    #[test]
    fn test_fires_within_margin() {
        let mut s = column(5, 400.0);
        // Viewport covers 0..800, margin reaches to 900: items 0, 1, 2.
        let fired = s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0));
        assert_eq!(fired, vec![0, 1, 2]);
        assert_eq!(s.pending_count(), 2);
    }

    #[test]
    fn test_fires_once_only() {
        let mut s = column(3, 400.0);
        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 300.0)), vec![0]);
        assert!(s.on_scroll(Viewport::new(0.0, 5000.0, 1000.0, 300.0)).is_empty());
        assert!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 300.0)).is_empty());
        assert_eq!(s.fired_count(), 1);
    }

    #[test]
    fn test_observe_in_range_fires_immediately() {
        let mut s = VisibilityScheduler::new();
        assert!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0)).is_empty());
        assert!(s.observe(0usize, Bounds::new(0.0, 0.0, 300.0, 200.0), 100.0));
        assert!(!s.observe(1usize, Bounds::new(0.0, 3000.0, 300.0, 200.0), 100.0));
        assert!(!s.is_observing(&0));
        assert!(s.is_observing(&1));
        assert!(s.check().is_empty());
        assert_eq!(s.fired_count(), 1);
    }

    #[test]
    fn test_fired_item_cannot_be_observed_again() {
        let mut s = VisibilityScheduler::new();
        s.observe(0usize, Bounds::new(0.0, 0.0, 300.0, 200.0), 100.0);
        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0)), vec![0]);
        assert!(!s.observe(0, Bounds::new(0.0, 0.0, 300.0, 200.0), 100.0));
        assert!(!s.is_observing(&0));
        assert!(s.check().is_empty());
        assert!(!s.mark_fired(0));
        assert_eq!(s.fired_count(), 1);
    }

    #[test]
    fn test_activation_follows_proximity_not_registration() {
        let mut s = VisibilityScheduler::new();
        s.observe("far", Bounds::new(0.0, 1100.0, 100.0, 100.0), 200.0);
        s.observe("inside", Bounds::new(0.0, 500.0, 100.0, 100.0), 200.0);
        s.observe("near", Bounds::new(0.0, 1050.0, 100.0, 100.0), 200.0);
        let fired = s.on_scroll(Viewport::new(0.0, 0.0, 800.0, 1000.0));
        assert_eq!(fired, vec!["inside", "near", "far"]);
    }

    #[test]
    fn test_never_entering_margin_never_fires() {
        let mut s = column(10, 400.0);
        s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 400.0));
        assert!(s.is_observing(&9));
    }

    #[test]
    fn test_disconnect_detaches_everything() {
        let mut s = column(4, 100.0);
        s.disconnect();
        assert!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 1000.0)).is_empty());
    }

    #[test]
    fn test_update_bounds_moves_item_into_range() {
        let mut s = VisibilityScheduler::new();
        s.observe(1u32, Bounds::new(0.0, 5000.0, 100.0, 100.0), 50.0);
        assert!(s.on_scroll(Viewport::new(0.0, 0.0, 500.0, 500.0)).is_empty());
        assert!(s.update_bounds(&1, Bounds::new(0.0, 200.0, 100.0, 100.0)));
        assert_eq!(s.check(), vec![1]);
    }
}
