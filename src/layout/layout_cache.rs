use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use super::masonry::{Breakpoints, MasonryLayout, MasonryPlan};
use crate::models::ConfirmedMedia;

/// Width bucket size for cache keys.
/// Tile widths follow the viewport, but small resizes reuse the cached plan.
const WIDTH_BUCKET_SIZE: u32 = 50;

/// Maximum number of cached plans kept in memory.
const MAX_CACHE_ENTRIES: usize = 8;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    column_count: usize,
    width_bucket: u32,
    list_hash: u64,
}

#[derive(Debug, Clone)]
struct CachedPlan {
    plan: MasonryPlan,
    last_used: Instant,
}

/// Cache of masonry plans keyed by (column count, width bucket, list hash).
///
/// The list hash covers URL and dimensions of every photo in order, so a new
/// confirmation or a reorder invalidates the entry.
pub struct LayoutCache {
    cache: RwLock<HashMap<CacheKey, CachedPlan>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::with_capacity(MAX_CACHE_ENTRIES)),
        }
    }

    pub fn width_bucket(viewport_width: f32) -> u32 {
        (viewport_width.max(0.0) as u32) / WIDTH_BUCKET_SIZE
    }

    pub fn compute_list_hash(photos: &[ConfirmedMedia]) -> u64 {
        let mut hasher_input = Vec::with_capacity(photos.len() * 64);
        for photo in photos {
            hasher_input.extend_from_slice(photo.url.as_bytes());
            hasher_input.push(0);
            let (w, h) = photo.dimensions.unwrap_or((0, 0));
            hasher_input.extend_from_slice(&w.to_le_bytes());
            hasher_input.extend_from_slice(&h.to_le_bytes());
        }
        xxh3_64(&hasher_input)
    }

    fn get(&self, key: &CacheKey) -> Option<MasonryPlan> {
        let mut cache = self.cache.write();
        let entry = cache.get_mut(key)?;
        entry.last_used = Instant::now();
        Some(entry.plan.clone())
    }

    fn set(&self, key: CacheKey, plan: MasonryPlan) {
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHE_ENTRIES && !cache.contains_key(&key) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, v)| v.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                cache.remove(&oldest);
            }
        }
        cache.insert(
            key,
            CachedPlan {
                plan,
                last_used: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Masonry layout with breakpoints and plan caching.
///
/// Recomputes only when the photo list changes or the viewport crosses into
/// another breakpoint or width bucket; otherwise returns the cached plan.
pub struct MasonryEngine {
    pub layout: MasonryLayout,
    pub breakpoints: Breakpoints,
    cache: LayoutCache,
    computed: usize,
}

impl MasonryEngine {
    pub fn new(layout: MasonryLayout, breakpoints: Breakpoints) -> Self {
        Self {
            layout,
            breakpoints,
            cache: LayoutCache::new(),
            computed: 0,
        }
    }

    pub fn arrange(&mut self, photos: &[ConfirmedMedia], viewport_width: f32) -> MasonryPlan {
        let column_count = self.breakpoints.columns_for(viewport_width);
        let key = CacheKey {
            column_count,
            width_bucket: LayoutCache::width_bucket(viewport_width),
            list_hash: LayoutCache::compute_list_hash(photos),
        };
        if let Some(plan) = self.cache.get(&key) {
            trace!(column_count, "masonry cache hit");
            return plan;
        }

        let plan = self.layout.compute(photos, viewport_width, column_count);
        self.computed += 1;
        trace!(column_count, photos = photos.len(), "masonry recomputed");
        self.cache.set(key, plan.clone());
        plan
    }

    /// Number of plans actually computed (cache misses).
    pub fn computed_count(&self) -> usize {
        self.computed
    }

    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

impl Default for MasonryEngine {
    fn default() -> Self {
        Self::new(MasonryLayout::default(), Breakpoints::default())
    }
}
