//! Existence probing for candidate media.
//!
//! - `probe` - resolves one candidate into exactly one `ProbeOutcome`
//! - `ProbeQueue` - runs probes concurrently on tokio with a concurrency cap
//! - `OutcomeCache` - remembers outcomes so remounts do not re-probe
//! - `MediaSource` - HTTP, filesystem, or scheme-dispatching byte sources

pub mod cache;
pub mod queue;
pub mod source;
pub mod verify;

pub use cache::OutcomeCache;
pub use queue::{ProbeMessage, ProbeQueue};
pub use source::{AnySource, FileSource, HttpSource, MediaSource};

use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ProbeError;
use crate::models::{CandidateAsset, MediaKind, ProbeOutcome};

/// Settings a single probe needs.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub sniff_bytes: usize,
}

impl From<&crate::config::GalleryConfig> for ProbeSettings {
    fn from(config: &crate::config::GalleryConfig) -> Self {
        Self {
            timeout: config.probe_timeout,
            sniff_bytes: config.sniff_bytes,
        }
    }
}

/// Probes one candidate. Never fails: any error becomes `succeeded = false`.
///
/// Video extensions are checked for a container header; everything else is
/// decoded as an image, and an unknown extension that decodes is confirmed as
/// an image.
pub async fn probe<S: MediaSource>(
    source: &S,
    candidate: &CandidateAsset,
    settings: ProbeSettings,
) -> ProbeOutcome {
    let guessed = candidate.guessed_kind();
    trace!(url = %candidate.url, ?guessed, "probing");

    let attempt = tokio::time::timeout(settings.timeout, resolve(source, candidate, guessed, settings));
    let result = match attempt.await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(settings.timeout)),
    };

    match result {
        Ok(outcome) => {
            debug!(url = %candidate.url, kind = ?outcome.media_kind, "probe confirmed");
            outcome
        }
        Err(e) => {
            debug!(url = %candidate.url, error = %e, "probe failed, omitting");
            ProbeOutcome::failure(candidate.url.clone(), guessed)
        }
    }
}

async fn resolve<S: MediaSource>(
    source: &S,
    candidate: &CandidateAsset,
    guessed: MediaKind,
    settings: ProbeSettings,
) -> Result<ProbeOutcome, ProbeError> {
    let url = candidate.url.as_str();
    match guessed {
        MediaKind::Video => {
            let head = source.fetch(url, Some(settings.sniff_bytes)).await?;
            verify::verify_video(&head)?;
            Ok(ProbeOutcome::success(url, MediaKind::Video))
        }
        MediaKind::Image | MediaKind::Unknown => {
            let bytes = source.fetch(url, None).await?;
            let (width, height) = verify::verify_image(&bytes)?;
            Ok(ProbeOutcome::success(url, MediaKind::Image).with_dimensions(width, height))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_source {
    //! In-memory source with per-URL latency, for ordering tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::MediaSource;
    use crate::error::ProbeError;

    #[derive(Default, Clone)]
    pub struct StaticSource {
        files: HashMap<String, (Vec<u8>, Duration)>,
        pub fetches: Arc<AtomicUsize>,
    }

    impl StaticSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, bytes: Vec<u8>, delay_ms: u64) -> Self {
            self.files
                .insert(url.to_string(), (bytes, Duration::from_millis(delay_ms)));
            self
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl MediaSource for StaticSource {
        async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<Vec<u8>, ProbeError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let Some((bytes, delay)) = self.files.get(url) else {
                return Err(ProbeError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            };
            tokio::time::sleep(*delay).await;
            let end = limit.map_or(bytes.len(), |l| l.min(bytes.len()));
            Ok(bytes[..end].to_vec())
        }
    }
}
