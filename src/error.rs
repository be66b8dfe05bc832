use std::time::Duration;

use thiserror::Error;

/// Why a probe did not confirm a candidate.
///
/// These never reach the page: the probe pipeline turns them into a failed
/// `ProbeOutcome`, which is the ordinary "file does not exist" signal.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("no recognised video container header")]
    UnrecognizedContainer,
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("resource is empty")]
    Empty,
}
