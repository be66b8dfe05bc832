use serde::Serialize;

use super::ConfirmedMedia;

/// Confirmed media split by kind, each partition ordered by position hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GalleryView {
    pub photos: Vec<ConfirmedMedia>,
    pub videos: Vec<ConfirmedMedia>,
}

impl GalleryView {
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.videos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.photos.len() + self.videos.len()
    }

    pub fn photo_urls(&self) -> Vec<&str> {
        self.photos.iter().map(|m| m.url.as_str()).collect()
    }

    pub fn video_urls(&self) -> Vec<&str> {
        self.videos.iter().map(|m| m.url.as_str()).collect()
    }
}

/// What the page should render for the gallery right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Outcomes are still pending and nothing is confirmed yet.
    Loading,
    /// Every candidate resolved and none was confirmed.
    Empty,
    /// At least one item is confirmed; more may still arrive.
    Ready { pending: usize },
}

impl LoadState {
    pub fn from_counts(total: usize, resolved: usize, confirmed: usize) -> Self {
        let pending = total.saturating_sub(resolved);
        if confirmed > 0 {
            Self::Ready { pending }
        } else if pending == 0 {
            Self::Empty
        } else {
            Self::Loading
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Loading gallery…"),
            Self::Empty => Some("No media available"),
            Self::Ready { .. } => None,
        }
    }
}
