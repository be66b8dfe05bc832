//! Memory cache of probe outcomes.
//!
//! Outcomes are terminal, so a remounted gallery can reuse them instead of
//! probing again. Keys are xxhash of the URL; entries are evicted LRU.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::models::ProbeOutcome;

const MIN_CAPACITY: usize = 16;

/// Shared, cloneable outcome cache.
#[derive(Clone)]
pub struct OutcomeCache {
    entries: Arc<Mutex<LruCache<u64, ProbeOutcome>>>,
}

impl OutcomeCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_CAPACITY)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn key(url: &str) -> u64 {
        xxh3_64(url.as_bytes())
    }

    pub fn get(&self, url: &str) -> Option<ProbeOutcome> {
        let hit = self
            .entries
            .lock()
            .get(&Self::key(url))
            .filter(|o| o.url == url)
            .cloned();
        if hit.is_some() {
            trace!(url, "outcome cache hit");
        }
        hit
    }

    pub fn insert(&self, outcome: ProbeOutcome) {
        self.entries.lock().put(Self::key(&outcome.url), outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl std::fmt::Debug for OutcomeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    #[test]
    fn test_insert_and_get() {
        let cache = OutcomeCache::new(32);
        cache.insert(ProbeOutcome::failure("2.jpg", MediaKind::Image));
        let hit = cache.get("2.jpg").unwrap();
        assert!(!hit.succeeded);
        assert!(cache.get("3.jpg").is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = OutcomeCache::new(MIN_CAPACITY);
        for i in 0..MIN_CAPACITY + 4 {
            cache.insert(ProbeOutcome::success(format!("{i}.jpg"), MediaKind::Image));
        }
        assert_eq!(cache.len(), MIN_CAPACITY);
        assert!(cache.get("0.jpg").is_none());
        assert!(cache.get(&format!("{}.jpg", MIN_CAPACITY + 3)).is_some());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = OutcomeCache::new(32);
        let other = cache.clone();
        other.insert(ProbeOutcome::success("1.mp4", MediaKind::Video));
        assert_eq!(cache.len(), 1);
    }
}
