use tracing::{debug, trace, warn};

use super::gestures::{GestureEvent, GestureState, TouchPoint, TouchTracker};
use super::keybindings::{action_for_key, Key, LightboxAction};
use crate::config::{GalleryConfig, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use crate::models::{ConfirmedMedia, MediaKind};

type NavigateCallback = Box<dyn FnMut(usize)>;
type CloseCallback = Box<dyn FnMut()>;

#[derive(Debug, Clone, PartialEq)]
pub struct LightboxItem {
    pub url: String,
    pub kind: MediaKind,
}

impl LightboxItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Video,
        }
    }
}

impl From<&ConfirmedMedia> for LightboxItem {
    fn from(media: &ConfirmedMedia) -> Self {
        Self {
            url: media.url.clone(),
            kind: media.media_kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub active_index: usize,
    pub zoom_factor: f32,
    pub gesture: GestureState,
}

impl ViewerState {
    fn at(index: usize) -> Self {
        Self {
            active_index: index,
            zoom_factor: 1.0,
            gesture: GestureState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightboxState {
    Closed,
    Open(ViewerState),
}

/// Full-screen viewer over an ordered set of confirmed media.
///
/// Navigation wraps circularly and every index change resets zoom to 1.0.
/// Zoom applies to images only; videos play at their natural size.
pub struct Lightbox {
    items: Vec<LightboxItem>,
    state: LightboxState,
    touch: TouchTracker,
    on_navigate: Option<NavigateCallback>,
    on_close: Option<CloseCallback>,
}

impl std::fmt::Debug for Lightbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lightbox")
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("on_navigate", &self.on_navigate.as_ref().map(|_| "<closure>"))
            .field("on_close", &self.on_close.as_ref().map(|_| "<closure>"))
            .finish()
    }
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lightbox {
    pub fn new() -> Self {
        Self::with_config(&GalleryConfig::default())
    }

    pub fn with_config(config: &GalleryConfig) -> Self {
        Self {
            items: Vec::new(),
            state: LightboxState::Closed,
            touch: TouchTracker::new(config.swipe_threshold_px),
            on_navigate: None,
            on_close: None,
        }
    }

    /// Called with the new index whenever the active item changes.
    pub fn connect_navigate<F: FnMut(usize) + 'static>(&mut self, callback: F) {
        self.on_navigate = Some(Box::new(callback));
    }

    pub fn connect_close<F: FnMut() + 'static>(&mut self, callback: F) {
        self.on_close = Some(Box::new(callback));
    }

    /// Opens the viewer at `start_index`, clamped into range.
    ///
    /// An empty item list leaves the lightbox closed.
    pub fn open(&mut self, items: Vec<LightboxItem>, start_index: usize) {
        if items.is_empty() {
            warn!("lightbox opened with no items, staying closed");
            return;
        }
        let index = start_index.min(items.len() - 1);
        self.items = items;
        self.touch.reset();
        self.state = LightboxState::Open(ViewerState::at(index));
        debug!(index, count = self.items.len(), "lightbox opened");
        self.emit_navigate(index);
    }

    pub fn close(&mut self) {
        if matches!(self.state, LightboxState::Closed) {
            return;
        }
        self.state = LightboxState::Closed;
        self.items.clear();
        self.touch.reset();
        debug!("lightbox closed");
        if let Some(cb) = self.on_close.as_mut() {
            cb();
        }
    }

    pub fn state(&self) -> LightboxState {
        self.state
    }

    pub fn viewer(&self) -> Option<&ViewerState> {
        match &self.state {
            LightboxState::Open(viewer) => Some(viewer),
            LightboxState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.viewer().is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&LightboxItem> {
        self.viewer().and_then(|v| self.items.get(v.active_index))
    }

    pub fn zoom_factor(&self) -> Option<f32> {
        self.viewer().map(|v| v.zoom_factor)
    }

    pub fn zoom_label(&self) -> Option<String> {
        self.zoom_factor()
            .map(|z| format!("{}%", (z * 100.0).round() as i32))
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    pub fn previous(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        let count = self.items.len();
        let LightboxState::Open(viewer) = &mut self.state else {
            return;
        };
        if count <= 1 {
            return;
        }
        let index = (viewer.active_index as isize + delta).rem_euclid(count as isize) as usize;
        *viewer = ViewerState::at(index);
        self.touch.reset();
        trace!(index, "lightbox navigated");
        self.emit_navigate(index);
    }

    fn emit_navigate(&mut self, index: usize) {
        if let Some(cb) = self.on_navigate.as_mut() {
            cb(index);
        }
    }

    fn current_is_video(&self) -> bool {
        self.current().is_some_and(|item| item.kind == MediaKind::Video)
    }

    fn set_zoom(&mut self, zoom: impl FnOnce(f32) -> f32) {
        if self.current_is_video() {
            return;
        }
        if let LightboxState::Open(viewer) = &mut self.state {
            viewer.zoom_factor = zoom(viewer.zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(|z| z + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(|z| z - ZOOM_STEP);
    }

    pub fn zoom_reset(&mut self) {
        self.set_zoom(|_| 1.0);
    }

    pub fn apply(&mut self, action: LightboxAction) {
        match action {
            LightboxAction::Previous => self.previous(),
            LightboxAction::Next => self.next(),
            LightboxAction::Close => self.close(),
            LightboxAction::ZoomIn => self.zoom_in(),
            LightboxAction::ZoomOut => self.zoom_out(),
            LightboxAction::ZoomReset => self.zoom_reset(),
        }
    }

    /// Handles a key press. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.is_open() {
            return false;
        }
        match action_for_key(key) {
            Some(action) => {
                self.apply(action);
                true
            }
            None => false,
        }
    }

    fn sync_gesture(&mut self) {
        let gesture = self.touch.state();
        if let LightboxState::Open(viewer) = &mut self.state {
            viewer.gesture = gesture;
        }
    }

    fn apply_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Scale(ratio) => self.set_zoom(|z| z * ratio),
            GestureEvent::SwipeNext => self.next(),
            GestureEvent::SwipePrevious => self.previous(),
            GestureEvent::None => {}
        }
        self.sync_gesture();
    }

    pub fn touch_start(&mut self, touches: &[TouchPoint]) {
        if !self.is_open() {
            return;
        }
        let event = self.touch.start(touches);
        self.apply_gesture(event);
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint]) {
        if !self.is_open() {
            return;
        }
        let event = self.touch.moved(touches);
        self.apply_gesture(event);
    }

    pub fn touch_end(&mut self, remaining: &[TouchPoint]) {
        if !self.is_open() {
            return;
        }
        let event = self.touch.end(remaining);
        self.apply_gesture(event);
    }
}
