//! One mounted gallery: candidates in, ordered confirmed media out.
//!
//! The session owns the assembler and the visibility scheduler outright and
//! is driven from a single task, so every mutation of the confirmed set is
//! serialised. Probes run concurrently on the runtime and report back over
//! the queue's channel; `poll`/`next_change` fold them in.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, trace, warn};

use super::assembler::GalleryAssembler;
use crate::config::GalleryConfig;
use crate::manifest::Manifest;
use crate::models::{CandidateAsset, ConfirmedMedia, GalleryView, LoadState};
use crate::probe::{MediaSource, OutcomeCache, ProbeMessage, ProbeQueue, ProbeSettings};
use crate::viewer::LightboxItem;
use crate::visibility::{Bounds, Viewport, VisibilityScheduler};

type ActivatedCallback = Box<dyn FnMut(usize, &str)>;

pub struct GallerySession<S: MediaSource> {
    candidates: Vec<CandidateAsset>,
    assembler: GalleryAssembler,
    scheduler: VisibilityScheduler<usize>,
    queue: ProbeQueue<S>,
    manifest: Option<Manifest>,
    /// Confirmed items whose later render failed; kept confirmed, not shown.
    hidden: HashSet<String>,
    margin_px: f32,
    generation: u64,
    mounted: bool,
    on_item_activated: Option<ActivatedCallback>,
}

impl<S: MediaSource> GallerySession<S> {
    /// Mounts a gallery over `candidates`. Must be called inside a tokio
    /// runtime.
    pub fn new(candidates: Vec<CandidateAsset>, source: Arc<S>, config: &GalleryConfig) -> Result<Self> {
        let queue = ProbeQueue::new(source, ProbeSettings::from(config), config.max_in_flight)?;
        let generation = queue.generation();
        info!(candidates = candidates.len(), "gallery mounted");
        Ok(Self {
            assembler: GalleryAssembler::new(&candidates),
            candidates,
            scheduler: VisibilityScheduler::new(),
            queue,
            manifest: None,
            hidden: HashSet::new(),
            margin_px: config.viewport_margin_px,
            generation,
            mounted: true,
            on_item_activated: None,
        })
    }

    /// Shares an outcome cache with other sessions.
    pub fn with_cache(mut self, cache: OutcomeCache) -> Self {
        self.queue.set_cache(cache);
        self
    }

    /// Resolves existence from `manifest` instead of probing.
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Called with `(photo_index, url)` when a photo is clicked.
    pub fn connect_item_activated<F: FnMut(usize, &str) + 'static>(&mut self, callback: F) {
        self.on_item_activated = Some(Box::new(callback));
    }

    pub fn candidates(&self) -> &[CandidateAsset] {
        &self.candidates
    }

    /// Registers the placeholder for candidate `position` at `bounds`.
    /// Returns `true` if it was already in range and started resolving.
    pub fn place(&mut self, position: usize, bounds: Bounds) -> bool {
        if !self.mounted || position >= self.candidates.len() {
            return false;
        }
        let activated = self.scheduler.observe(position, bounds, self.margin_px);
        if activated {
            self.activate(position);
        }
        activated
    }

    /// Feeds a scroll/resize and starts resolving whatever came into range.
    /// Returns the number of candidates activated.
    pub fn on_scroll(&mut self, viewport: Viewport) -> usize {
        if !self.mounted {
            return 0;
        }
        let activated = self.scheduler.on_scroll(viewport);
        for &position in &activated {
            self.activate(position);
        }
        activated.len()
    }

    /// Starts resolving every candidate immediately, bypassing the viewport.
    pub fn activate_all(&mut self) {
        if !self.mounted {
            return;
        }
        for position in 0..self.candidates.len() {
            if self.scheduler.mark_fired(position) {
                self.activate(position);
            }
        }
    }

    fn activate(&mut self, position: usize) {
        let Some(candidate) = self.candidates.get(position) else {
            return;
        };
        match &self.manifest {
            Some(manifest) => {
                let outcome = manifest.resolve(candidate);
                self.assembler.on_outcome(outcome);
            }
            None => {
                self.queue.submit(candidate);
            }
        }
    }

    fn apply(&mut self, message: ProbeMessage) -> bool {
        if !self.mounted || message.generation != self.generation {
            trace!(url = %message.outcome.url, "stale outcome dropped");
            return false;
        }
        let before = self.assembler.view().len();
        let url = message.outcome.url.clone();
        self.assembler.on_outcome(message.outcome);
        let changed = self.assembler.view().len() != before;
        if changed {
            trace!(url = %url, "gallery updated");
        }
        changed
    }

    /// Folds every outcome that has arrived so far. Returns true if the
    /// confirmed set grew.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for message in self.queue.poll_results() {
            changed |= self.apply(message);
        }
        changed
    }

    /// Waits for the next outcome and folds it in. Returns `None` once
    /// nothing is left in flight or the session is unmounted.
    pub async fn next_change(&mut self) -> Option<bool> {
        if !self.mounted {
            return None;
        }
        if !self.queue.is_busy() {
            return None;
        }
        let message = self.queue.next_result().await?;
        Some(self.apply(message))
    }

    /// Drives probing until every activated candidate has resolved.
    pub async fn settle(&mut self) {
        while self.next_change().await.is_some() {}
    }

    pub fn view(&self) -> &GalleryView {
        self.assembler.view()
    }

    pub fn load_state(&self) -> LoadState {
        self.assembler.load_state()
    }

    /// Marks a confirmed item as failing to render after confirmation.
    ///
    /// The item stays in the confirmed set and is not retried; it is only
    /// left out of `visible_photos`/`visible_videos`.
    pub fn report_render_failure(&mut self, url: &str) {
        if !self.assembler.is_confirmed(url) {
            debug!(url, "render failure for unconfirmed url ignored");
            return;
        }
        if self.hidden.insert(url.to_string()) {
            warn!(url, "confirmed media failed to render, hiding");
        }
    }

    pub fn is_hidden(&self, url: &str) -> bool {
        self.hidden.contains(url)
    }

    pub fn visible_photos(&self) -> Vec<ConfirmedMedia> {
        self.visible(&self.view().photos)
    }

    pub fn visible_videos(&self) -> Vec<ConfirmedMedia> {
        self.visible(&self.view().videos)
    }

    fn visible(&self, items: &[ConfirmedMedia]) -> Vec<ConfirmedMedia> {
        items
            .iter()
            .filter(|m| !self.hidden.contains(&m.url))
            .cloned()
            .collect()
    }

    /// Reports a click on the visible photo at `index`.
    pub fn click_photo(&mut self, index: usize) -> bool {
        let Some(photo) = self.visible_photos().into_iter().nth(index) else {
            return false;
        };
        if let Some(cb) = self.on_item_activated.as_mut() {
            cb(index, &photo.url);
        }
        true
    }

    /// Items for the lightbox: visible photos, then visible videos, each in
    /// display order. Photo indices from `click_photo` line up with it.
    pub fn lightbox_items(&self) -> Vec<LightboxItem> {
        self.visible_photos()
            .iter()
            .chain(self.visible_videos().iter())
            .map(LightboxItem::from)
            .collect()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Cancels in-flight probes and detaches observers. Outcomes arriving
    /// afterwards are ignored. Safe to call more than once.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.queue.cancel();
        self.scheduler.disconnect();
        info!(confirmed = self.view().len(), "gallery unmounted");
    }
}

impl<S: MediaSource> Drop for GallerySession<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::probe::test_source::StaticSource;
    use crate::probe::verify::fixtures::{mp4_head, png_bytes};

    fn session(source: StaticSource, urls: &[&str]) -> GallerySession<StaticSource> {
        let candidates = CandidateAsset::from_urls(urls.iter().copied());
        GallerySession::new(candidates, Arc::new(source), &GalleryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_position_order() {
        let source = StaticSource::new()
            .with("1.jpg", png_bytes(4, 3), 80)
            .with("2.jpg", png_bytes(4, 3), 40)
            .with("3.jpg", png_bytes(4, 3), 0);
        let mut s = session(source, &["1.jpg", "2.jpg", "3.jpg"]);
        s.activate_all();
        s.settle().await;
        assert_eq!(s.view().photo_urls(), vec!["1.jpg", "2.jpg", "3.jpg"]);
        assert_eq!(s.load_state(), LoadState::Ready { pending: 0 });
    }

    #[tokio::test]
    async fn test_lazy_activation_only_probes_nearby() {
        let source = StaticSource::new()
            .with("1.jpg", png_bytes(4, 3), 0)
            .with("2.jpg", png_bytes(4, 3), 0);
        let fetches = source.clone();
        let mut s = session(source, &["1.jpg", "2.jpg"]);
        s.place(0, Bounds::new(0.0, 0.0, 300.0, 200.0));
        s.place(1, Bounds::new(0.0, 5000.0, 300.0, 200.0));

        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0)), 1);
        s.settle().await;
        assert_eq!(s.view().photo_urls(), vec!["1.jpg"]);
        assert_eq!(fetches.fetch_count(), 1);
        assert_eq!(s.load_state(), LoadState::Ready { pending: 1 });

        assert_eq!(s.on_scroll(Viewport::new(0.0, 4500.0, 1000.0, 800.0)), 1);
        s.settle().await;
        assert_eq!(s.view().photo_urls(), vec!["1.jpg", "2.jpg"]);
    }

    #[tokio::test]
    async fn test_place_inside_known_viewport_activates_immediately() {
        let source = StaticSource::new()
            .with("1.jpg", png_bytes(4, 3), 0)
            .with("2.jpg", png_bytes(4, 3), 0);
        let fetches = source.clone();
        let mut s = session(source, &["1.jpg", "2.jpg"]);
        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0)), 0);

        assert!(s.place(0, Bounds::new(0.0, 0.0, 300.0, 200.0)));
        assert!(!s.place(1, Bounds::new(0.0, 5000.0, 300.0, 200.0)));
        s.settle().await;
        assert_eq!(s.view().photo_urls(), vec!["1.jpg"]);
        assert_eq!(fetches.fetch_count(), 1);
        assert_eq!(s.load_state(), LoadState::Ready { pending: 1 });
    }

    #[tokio::test]
    async fn test_replacing_activated_item_does_not_activate_again() {
        let source = StaticSource::new().with("1.jpg", png_bytes(4, 3), 0);
        let fetches = source.clone();
        let mut s = session(source, &["1.jpg"])
            .with_manifest(Manifest::from_entries(["1.jpg"]));
        s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 800.0));
        assert!(s.place(0, Bounds::new(0.0, 0.0, 300.0, 200.0)));
        assert!(!s.place(0, Bounds::new(0.0, 100.0, 300.0, 200.0)));
        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 1000.0, 900.0)), 0);
        s.activate_all();
        assert_eq!(s.view().photo_urls(), vec!["1.jpg"]);
        assert_eq!(fetches.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_manifest_resolves_without_probing() {
        let source = StaticSource::new();
        let fetches = source.clone();
        let mut s = session(source, &["1.jpg", "2.jpg", "3.mp4"])
            .with_manifest(Manifest::from_entries(["1.jpg", "3.mp4"]));
        s.activate_all();
        assert_eq!(s.view().photo_urls(), vec!["1.jpg"]);
        assert_eq!(s.view().video_urls(), vec!["3.mp4"]);
        assert_eq!(fetches.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_hides_but_keeps_confirmed() {
        let source = StaticSource::new()
            .with("1.jpg", png_bytes(2, 2), 0)
            .with("2.jpg", png_bytes(2, 2), 0);
        let mut s = session(source, &["1.jpg", "2.jpg"]);
        s.activate_all();
        s.settle().await;

        s.report_render_failure("1.jpg");
        assert!(s.is_hidden("1.jpg"));
        assert_eq!(s.view().photos.len(), 2);
        let visible: Vec<_> = s.visible_photos().into_iter().map(|m| m.url).collect();
        assert_eq!(visible, vec!["2.jpg"]);

        s.report_render_failure("nope.jpg");
        assert!(!s.is_hidden("nope.jpg"));
    }

    #[tokio::test]
    async fn test_click_reports_index_and_url() {
        let source = StaticSource::new()
            .with("1.jpg", png_bytes(2, 2), 0)
            .with("2.mp4", mp4_head(), 0)
            .with("3.jpg", png_bytes(2, 2), 0);
        let mut s = session(source, &["1.jpg", "2.mp4", "3.jpg"]);
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let c = Rc::clone(&clicks);
        s.connect_item_activated(move |i, url| c.borrow_mut().push((i, url.to_string())));
        s.activate_all();
        s.settle().await;

        assert!(s.click_photo(1));
        assert!(!s.click_photo(5));
        assert_eq!(*clicks.borrow(), vec![(1, "3.jpg".to_string())]);
        let items = s.lightbox_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].url, "3.jpg");
        assert_eq!(items[2].kind, crate::models::MediaKind::Video);
    }

    #[tokio::test]
    async fn test_unmount_ignores_late_outcomes() {
        let source = StaticSource::new().with("1.jpg", png_bytes(2, 2), 50);
        let mut s = session(source, &["1.jpg"]);
        s.activate_all();
        s.unmount();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!s.poll());
        assert!(s.view().is_empty());
        assert!(s.next_change().await.is_none());
        assert_eq!(s.on_scroll(Viewport::new(0.0, 0.0, 100.0, 100.0)), 0);
    }
}
