//! Decides whether fetched bytes are renderable media.
//!
//! Images must decode. Videos only need a recognisable container header,
//! the equivalent of a player reaching "metadata loaded".

use std::io::Cursor;

use image::{GenericImageView, ImageReader};
use tracing::trace;

use crate::error::ProbeError;

/// Decodes `bytes` as an image and returns its dimensions.
pub fn verify_image(bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    if bytes.is_empty() {
        return Err(ProbeError::Empty);
    }
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    let (width, height) = image.dimensions();
    trace!(width, height, "image decoded");
    Ok((width, height))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// MP4 / MOV / M4V (ISO base media file format).
    IsoBmff,
    /// WebM / MKV.
    Matroska,
    Avi,
}

/// ISO-BMFF top-level box types that can legitimately open a file.
const ISO_LEADING_BOXES: &[&[u8; 4]] = &[b"ftyp", b"moov", b"mdat", b"free", b"wide", b"skip"];

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Recognises the container from the leading bytes of a video file.
pub fn sniff_container(head: &[u8]) -> Option<Container> {
    if head.len() >= 8 && ISO_LEADING_BOXES.iter().any(|b| &head[4..8] == *b) {
        return Some(Container::IsoBmff);
    }
    if head.starts_with(&EBML_MAGIC) {
        return Some(Container::Matroska);
    }
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        return Some(Container::Avi);
    }
    None
}

pub fn verify_video(head: &[u8]) -> Result<Container, ProbeError> {
    if head.is_empty() {
        return Err(ProbeError::Empty);
    }
    sniff_container(head).ok_or(ProbeError::UnrecognizedContainer)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_verify_image_reports_dimensions() {
        let bytes = png_bytes(6, 4);
        assert_eq!(verify_image(&bytes).unwrap(), (6, 4));
    }

    #[test]
    fn test_verify_image_rejects_html_error_page() {
        let err = verify_image(b"<html><body>404</body></html>").unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[test]
    fn test_verify_image_rejects_truncated_png() {
        let bytes = png_bytes(32, 32);
        assert!(verify_image(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_sniff_containers() {
        assert_eq!(sniff_container(&mp4_head()), Some(Container::IsoBmff));
        assert_eq!(
            sniff_container(&[0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x00]),
            Some(Container::Matroska)
        );
        let mut avi = b"RIFF".to_vec();
        avi.extend_from_slice(&[0, 0, 0, 0]);
        avi.extend_from_slice(b"AVI LIST");
        assert_eq!(sniff_container(&avi), Some(Container::Avi));
        assert_eq!(sniff_container(b"<!doctype html>"), None);
    }

    #[test]
    fn test_verify_video_empty() {
        assert!(matches!(verify_video(&[]), Err(ProbeError::Empty)));
    }
}
