use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use probe_gallery::probe::FileSource;
use probe_gallery::viewer::{Key, Lightbox, LightboxItem, TouchPoint};
use probe_gallery::{CandidateAsset, GalleryConfig, GallerySession, LoadState};
use tempfile::tempdir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn mp4() -> Vec<u8> {
    let mut head = vec![0x00, 0x00, 0x00, 0x18];
    head.extend_from_slice(b"ftypmp42");
    head.extend_from_slice(&[0u8; 64]);
    head
}

#[tokio::test]
async fn scenario_a_partial_existence() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("1.jpg"), png(4, 3)).unwrap();
    std::fs::write(dir.path().join("3.mp4"), mp4()).unwrap();

    let candidates = CandidateAsset::from_urls(["1.jpg", "2.jpg", "3.mp4"]);
    let source = Arc::new(FileSource::rooted(dir.path()));
    let mut session = GallerySession::new(candidates, source, &GalleryConfig::default()).unwrap();
    session.activate_all();
    session.settle().await;

    assert_eq!(session.view().photo_urls(), vec!["1.jpg"]);
    assert_eq!(session.view().video_urls(), vec!["3.mp4"]);
    assert_eq!(session.view().photos[0].dimensions, Some((4, 3)));
}

#[tokio::test]
async fn scenario_b_empty_only_after_all_resolve() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("2.jpg"), b"<html>not found</html>").unwrap();

    let candidates = CandidateAsset::from_urls(["1.jpg", "2.jpg", "3.mp4"]);
    let source = Arc::new(FileSource::rooted(dir.path()));
    let mut session = GallerySession::new(candidates, source, &GalleryConfig::default()).unwrap();
    assert_eq!(session.load_state(), LoadState::Loading);

    session.activate_all();
    let mut seen_states = Vec::new();
    while session.next_change().await.is_some() {
        seen_states.push(session.load_state());
    }

    assert_eq!(seen_states.len(), 3);
    assert!(seen_states[..2].iter().all(|s| *s == LoadState::Loading));
    assert_eq!(seen_states[2], LoadState::Empty);
    assert_eq!(LoadState::Empty.message(), Some("No media available"));
}

#[test]
fn scenario_c_arrow_right_wraps() {
    let items: Vec<_> = (0..5).map(|i| LightboxItem::image(format!("{i}.jpg"))).collect();
    let mut lightbox = Lightbox::new();
    lightbox.open(items, 2);
    for _ in 0..3 {
        assert!(lightbox.handle_key(Key::from_name("ArrowRight")));
    }
    assert_eq!(lightbox.viewer().unwrap().active_index, 0);
}

#[test]
fn scenario_d_swipe_triggers_one_transition() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let navigations = Rc::new(RefCell::new(Vec::new()));
    let items: Vec<_> = (0..5).map(|i| LightboxItem::image(format!("{i}.jpg"))).collect();
    let mut lightbox = Lightbox::new();
    let n = Rc::clone(&navigations);
    lightbox.connect_navigate(move |i| n.borrow_mut().push(i));
    lightbox.open(items, 2);

    lightbox.touch_start(&[TouchPoint::new(400.0, 300.0)]);
    for x in [390.0, 370.0, 350.0, 330.0, 320.0] {
        lightbox.touch_move(&[TouchPoint::new(x, 300.0)]);
    }
    lightbox.touch_end(&[]);

    assert_eq!(lightbox.viewer().unwrap().active_index, 3);
    assert_eq!(*navigations.borrow(), vec![2, 3]);
}
