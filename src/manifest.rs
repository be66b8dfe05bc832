//! Explicit existence oracle.
//!
//! A manifest lists which assets exist, so a gallery can resolve its
//! candidates in one step instead of probing each URL. Relative entries
//! match candidates by path suffix (`2024/1.jpg` matches
//! `https://cdn.test/gallery/2024/1.jpg`).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{url_extension, CandidateAsset, MediaKind, ProbeOutcome};

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    List(Vec<String>),
    Object { assets: Vec<String> },
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: HashSet<String>,
}

impl Manifest {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches("./").to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// Parses `["a.jpg", ...]` or `{ "assets": ["a.jpg", ...] }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ManifestFile = serde_json::from_str(json).context("Invalid manifest JSON")?;
        let entries = match file {
            ManifestFile::List(entries) | ManifestFile::Object { assets: entries } => entries,
        };
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let manifest = Self::from_json(&json)?;
        info!(?path, entries = manifest.len(), "loaded manifest");
        Ok(manifest)
    }

    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        let body = client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch manifest: {url}"))?
            .text()
            .await
            .context("Failed to read manifest body")?;
        let manifest = Self::from_json(&body)?;
        info!(url, entries = manifest.len(), "fetched manifest");
        Ok(manifest)
    }

    /// Builds a manifest from the media files under `dir`, with entries
    /// relative to `dir` using `/` separators.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let known = url_extension(&relative)
                .map(|ext| MediaKind::from_extension(ext) != MediaKind::Unknown)
                .unwrap_or(false);
            if known {
                entries.push(relative);
            }
        }
        debug!(?dir, entries = entries.len(), "built manifest from directory");
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `url` is listed, exactly or by path suffix.
    pub fn contains(&self, url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if self.entries.contains(url) || self.entries.contains(path) {
            return true;
        }
        path.match_indices('/')
            .any(|(i, _)| self.entries.contains(&path[i + 1..]))
    }

    /// Resolves a candidate without any network access.
    pub fn resolve(&self, candidate: &CandidateAsset) -> ProbeOutcome {
        let kind = match candidate.guessed_kind() {
            MediaKind::Unknown => MediaKind::Image,
            kind => kind,
        };
        if self.contains(&candidate.url) {
            ProbeOutcome::success(candidate.url.clone(), kind)
        } else {
            ProbeOutcome::failure(candidate.url.clone(), candidate.guessed_kind())
        }
    }
}
