//! Where probe bytes come from.
//!
//! A `MediaSource` fetches a resource (or its first `limit` bytes) so the
//! verifier can decide whether it is real, renderable media.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::RANGE;
use tokio::io::AsyncReadExt;
use tracing::trace;

use crate::error::ProbeError;

pub trait MediaSource: Send + Sync + 'static {
    /// Fetches the resource at `url`. With `limit`, only the leading bytes
    /// are needed and the source may stop early.
    fn fetch(
        &self,
        url: &str,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<u8>, ProbeError>> + Send;
}

/// HTTP(S) source backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl MediaSource for HttpSource {
    async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<Vec<u8>, ProbeError> {
        let mut request = self.client.get(url);
        if let Some(limit) = limit {
            request = request.header(RANGE, format!("bytes=0-{}", limit.saturating_sub(1)));
        }
        let mut response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Servers that ignore Range send the whole file; stop reading once we
        // have the header window.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if limit.is_some_and(|limit| body.len() >= limit) {
                break;
            }
        }
        if let Some(limit) = limit {
            body.truncate(limit);
        }
        trace!(url, bytes = body.len(), "fetched over http");
        Ok(body)
    }
}

/// Local filesystem source for plain paths and `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative paths against `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl MediaSource for FileSource {
    async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<Vec<u8>, ProbeError> {
        let path = self.resolve(url);
        let body = match limit {
            Some(limit) => {
                let file = tokio::fs::File::open(&path).await?;
                let mut buf = Vec::with_capacity(limit.min(1 << 20));
                file.take(limit as u64).read_to_end(&mut buf).await?;
                buf
            }
            None => tokio::fs::read(&path).await?,
        };
        trace!(?path, bytes = body.len(), "read from disk");
        Ok(body)
    }
}

/// Dispatches on the URL scheme: `http`/`https` go to the network, everything
/// without a scheme or with `file://` goes to disk.
#[derive(Debug, Clone)]
pub struct AnySource {
    http: HttpSource,
    file: FileSource,
}

impl AnySource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpSource::new(timeout)?,
            file: FileSource::new(),
        })
    }

    pub fn with_file_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.file = FileSource::rooted(root);
        self
    }
}

fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

impl MediaSource for AnySource {
    async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<Vec<u8>, ProbeError> {
        match scheme_of(url).map(|s| s.to_ascii_lowercase()) {
            Some(s) if s == "http" || s == "https" => self.http.fetch(url, limit).await,
            Some(s) if s == "file" => self.file.fetch(url, limit).await,
            None => self.file.fetch(url, limit).await,
            Some(other) => Err(ProbeError::UnsupportedScheme(other)),
        }
    }
}
