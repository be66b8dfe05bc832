//! Folds probe outcomes into an ordered, deduplicated gallery.
//!
//! Outcomes arrive in network completion order. The view is always ordered
//! by position hint, so the final gallery does not depend on which probe
//! finished first.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::models::{
    CandidateAsset, ConfirmedMedia, GalleryView, LoadState, MediaKind, ProbeOutcome,
};

#[derive(Debug, Clone, Default)]
pub struct GalleryAssembler {
    /// Candidate URL to position hint.
    positions: HashMap<String, usize>,
    resolved: HashSet<String>,
    view: GalleryView,
}

impl GalleryAssembler {
    pub fn new(candidates: &[CandidateAsset]) -> Self {
        let mut positions = HashMap::with_capacity(candidates.len());
        for c in candidates {
            positions.entry(c.url.clone()).or_insert(c.position_hint);
        }
        Self {
            positions,
            resolved: HashSet::new(),
            view: GalleryView::default(),
        }
    }

    /// Applies one outcome and returns the updated view.
    ///
    /// Outcomes for URLs outside the candidate set are ignored, and a URL
    /// that is already confirmed is never inserted twice.
    pub fn on_outcome(&mut self, outcome: ProbeOutcome) -> &GalleryView {
        let Some(&position_hint) = self.positions.get(&outcome.url) else {
            debug!(url = %outcome.url, "outcome for unknown candidate ignored");
            return &self.view;
        };
        self.resolved.insert(outcome.url.clone());

        if !outcome.succeeded {
            return &self.view;
        }
        if self.is_confirmed(&outcome.url) {
            trace!(url = %outcome.url, "already confirmed");
            return &self.view;
        }

        let media = ConfirmedMedia {
            url: outcome.url,
            media_kind: match outcome.media_kind {
                MediaKind::Video => MediaKind::Video,
                MediaKind::Image | MediaKind::Unknown => MediaKind::Image,
            },
            position_hint,
            dimensions: outcome.dimensions,
        };
        let partition = if media.is_video() {
            &mut self.view.videos
        } else {
            &mut self.view.photos
        };
        let at = partition.partition_point(|m| m.position_hint <= media.position_hint);
        partition.insert(at, media);
        &self.view
    }

    pub fn is_confirmed(&self, url: &str) -> bool {
        self.view
            .photos
            .iter()
            .chain(&self.view.videos)
            .any(|m| m.url == url)
    }

    pub fn view(&self) -> &GalleryView {
        &self.view
    }

    pub fn total(&self) -> usize {
        self.positions.len()
    }

    pub fn resolved(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_complete(&self) -> bool {
        self.resolved() >= self.total()
    }

    pub fn load_state(&self) -> LoadState {
        LoadState::from_counts(self.total(), self.resolved(), self.view.len())
    }
}
