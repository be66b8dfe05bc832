//! Media existence probing and adaptive gallery rendering.
//!
//! Candidate URLs go in, an ordered gallery of media that really exists comes
//! out:
//!
//! ```text
//! candidates → VisibilityScheduler → ProbeQueue (concurrent) → GalleryAssembler
//!                                                                 ↓
//!                                          MasonryEngine ← GalleryView → Lightbox
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`models`] | Candidate, outcome, and confirmed-media types; `GalleryView` |
//! | [`probe`] | Speculative loads that decide whether a URL is real media |
//! | [`manifest`] | Explicit existence list that replaces probing when present |
//! | [`visibility`] | Single-shot viewport-proximity activation |
//! | [`gallery`] | Order-restoring assembler and the mounted session |
//! | [`layout`] | Greedy masonry with breakpoints and plan caching |
//! | [`viewer`] | Lightbox navigation, zoom, keys, and touch gestures |
//!
//! Probe completion order is arbitrary. The assembler re-imposes position
//! order on every insert, so the gallery a user sees is the same no matter
//! which request the network answered first.

pub mod config;
pub mod error;
pub mod gallery;
pub mod layout;
pub mod manifest;
pub mod models;
pub mod probe;
pub mod viewer;
pub mod visibility;

pub use config::GalleryConfig;
pub use error::ProbeError;
pub use gallery::{GalleryAssembler, GallerySession};
pub use manifest::Manifest;
pub use models::{
    CandidateAsset, ConfirmedMedia, GalleryView, LoadState, MediaKind, ProbeOutcome,
};
