use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

/// File extensions that are probed as video instead of image.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];

/// File extensions that are recognised as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif", "avif",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else {
            Self::Unknown
        }
    }

    /// Guesses the kind from the URL's file-extension suffix.
    ///
    /// Query strings and fragments are ignored, so `clip.mp4?v=2` is a video.
    pub fn guess_from_url(url: &str) -> Self {
        url_extension(url)
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// Extracts the extension of the last path segment of a URL or path.
pub fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// A URL that may or may not resolve to a real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAsset {
    pub url: String,
    /// Original submission order, used as the final ordering key.
    pub position_hint: usize,
}

impl CandidateAsset {
    pub fn new(url: impl Into<String>, position_hint: usize) -> Self {
        Self {
            url: url.into(),
            position_hint,
        }
    }

    /// Builds a candidate list from raw URLs.
    ///
    /// Entries are trimmed, blank entries are dropped and only the first
    /// occurrence of a repeated URL is kept. Position hints follow the
    /// surviving order.
    pub fn from_urls<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in urls {
            let url = raw.as_ref().trim();
            if url.is_empty() || !seen.insert(url.to_string()) {
                continue;
            }
            out.push(Self::new(url, out.len()));
        }
        out
    }

    /// Generates the speculative `{base}/{i}.{ext}` candidates for a numbered
    /// media folder, `i` running from 1 to `count`.
    pub fn numbered(base: &str, count: usize, extensions: &[&str]) -> Vec<Self> {
        let base = base.trim_end_matches('/');
        let urls = (1..=count).flat_map(|i| {
            extensions.iter().map(move |ext| {
                let ext = ext.trim_start_matches('.');
                if base.is_empty() {
                    format!("{i}.{ext}")
                } else {
                    format!("{base}/{i}.{ext}")
                }
            })
        });
        Self::from_urls(urls)
    }

    pub fn guessed_kind(&self) -> MediaKind {
        MediaKind::guess_from_url(&self.url)
    }
}

/// Builds candidates from loosely typed input.
///
/// Anything other than an array of strings is treated as malformed and
/// yields an empty working set, so the gallery falls through to its
/// empty state instead of failing.
pub fn candidates_from_json(value: &serde_json::Value) -> Vec<CandidateAsset> {
    let Some(entries) = value.as_array() else {
        warn!("candidate input is not an array, using empty set");
        return Vec::new();
    };
    let mut urls = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.as_str() {
            Some(url) => urls.push(url),
            None => {
                warn!(?entry, "non-string candidate, using empty set");
                return Vec::new();
            }
        }
    }
    CandidateAsset::from_urls(urls)
}

/// Result of probing one candidate. Produced exactly once per candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub url: String,
    pub succeeded: bool,
    pub media_kind: MediaKind,
    /// Decoded pixel dimensions, when the probe learned them.
    pub dimensions: Option<(u32, u32)>,
}

impl ProbeOutcome {
    pub fn success(url: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            succeeded: true,
            media_kind,
            dimensions: None,
        }
    }

    pub fn failure(url: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            succeeded: false,
            media_kind,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        if width > 0 && height > 0 {
            self.dimensions = Some((width, height));
        }
        self
    }
}

/// A candidate whose probe succeeded and is eligible for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmedMedia {
    pub url: String,
    pub media_kind: MediaKind,
    pub position_hint: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

impl ConfirmedMedia {
    pub fn aspect_ratio(&self) -> Option<f32> {
        match self.dimensions {
            Some((w, h)) if w > 0 && h > 0 => Some(w as f32 / h as f32),
            _ => None,
        }
    }

    pub fn is_video(&self) -> bool {
        self.media_kind == MediaKind::Video
    }
}
