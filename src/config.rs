//! Runtime configuration for the gallery pipeline.
//!
//! Defaults can be overridden through `PROBE_GALLERY_*` environment variables.
//! Unparseable or zero values fall back to the default.

use std::time::Duration;

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_IN_FLIGHT: usize = 6;
const DEFAULT_VIEWPORT_MARGIN_PX: f32 = 200.0;
/// Enough to cover the container header of every supported video format.
const DEFAULT_SNIFF_BYTES: usize = 64 * 1024;
const DEFAULT_CACHE_ENTRIES: usize = 512;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.25;
pub const SWIPE_THRESHOLD_PX: f32 = 75.0;

fn env_positive<T: std::str::FromStr + PartialOrd + Default>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Upper bound on a single probe, including body download.
    pub probe_timeout: Duration,
    /// Maximum number of probes running at once.
    pub max_in_flight: usize,
    /// Distance from the viewport at which a placeholder activates.
    pub viewport_margin_px: f32,
    /// Bytes fetched from a video candidate to recognise its container.
    pub sniff_bytes: usize,
    /// Capacity of the shared probe outcome cache.
    pub cache_entries: usize,
    pub swipe_threshold_px: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            viewport_margin_px: DEFAULT_VIEWPORT_MARGIN_PX,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            cache_entries: DEFAULT_CACHE_ENTRIES,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
        }
    }
}

impl GalleryConfig {
    /// Default configuration overlaid with environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_positive::<u64>("PROBE_GALLERY_PROBE_TIMEOUT_MS") {
            config.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_positive::<usize>("PROBE_GALLERY_MAX_IN_FLIGHT") {
            config.max_in_flight = n;
        }
        if let Some(px) = env_positive::<f32>("PROBE_GALLERY_VIEWPORT_MARGIN_PX") {
            config.viewport_margin_px = px;
        }
        if let Some(n) = env_positive::<usize>("PROBE_GALLERY_SNIFF_BYTES") {
            config.sniff_bytes = n;
        }
        if let Some(n) = env_positive::<usize>("PROBE_GALLERY_CACHE_ENTRIES") {
            config.cache_entries = n;
        }
        config
    }
}
