//! Touch gesture tracking for the lightbox.
//!
//! One finger is a horizontal drag that becomes a swipe on release, two
//! fingers are a pinch that rescales continuously.

use crate::config::SWIPE_THRESHOLD_PX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Panning,
    Pinching,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

fn distance(a: TouchPoint, b: TouchPoint) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Result of feeding a touch event to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    None,
    /// Multiply the zoom factor by this ratio.
    Scale(f32),
    /// Swipe left, show the next item.
    SwipeNext,
    /// Swipe right, show the previous item.
    SwipePrevious,
}

#[derive(Debug, Clone)]
pub struct TouchTracker {
    state: GestureState,
    start_x: f32,
    last_x: f32,
    last_distance: f32,
    threshold: f32,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD_PX)
    }
}

impl TouchTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: GestureState::Idle,
            start_x: 0.0,
            last_x: 0.0,
            last_distance: 0.0,
            threshold: threshold.max(0.0),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// `touches` is the full set of touches currently on the surface.
    pub fn start(&mut self, touches: &[TouchPoint]) -> GestureEvent {
        match touches {
            [a, b, ..] => {
                self.state = GestureState::Pinching;
                self.last_distance = distance(*a, *b);
            }
            [a] => {
                self.state = GestureState::Panning;
                self.start_x = a.x;
                self.last_x = a.x;
            }
            [] => self.state = GestureState::Idle,
        }
        GestureEvent::None
    }

    pub fn moved(&mut self, touches: &[TouchPoint]) -> GestureEvent {
        match (self.state, touches) {
            (GestureState::Pinching, [a, b, ..]) => {
                let current = distance(*a, *b);
                let previous = self.last_distance;
                self.last_distance = current;
                if previous > f32::EPSILON && current > f32::EPSILON {
                    GestureEvent::Scale(current / previous)
                } else {
                    GestureEvent::None
                }
            }
            (GestureState::Panning, [a]) => {
                self.last_x = a.x;
                GestureEvent::None
            }
            _ => GestureEvent::None,
        }
    }

    /// `remaining` is the set of touches still down after the release.
    pub fn end(&mut self, remaining: &[TouchPoint]) -> GestureEvent {
        match self.state {
            GestureState::Panning => {
                self.state = GestureState::Idle;
                let dx = self.last_x - self.start_x;
                if dx.abs() > self.threshold {
                    if dx < 0.0 {
                        GestureEvent::SwipeNext
                    } else {
                        GestureEvent::SwipePrevious
                    }
                } else {
                    GestureEvent::None
                }
            }
            GestureState::Pinching => {
                // Lifting one finger of a pinch never turns into a swipe.
                if remaining.len() < 2 {
                    self.state = GestureState::Idle;
                }
                GestureEvent::None
            }
            GestureState::Idle => GestureEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32) -> TouchPoint {
        TouchPoint::new(x, 0.0)
    }

    #[test]
    fn test_swipe_left_past_threshold() {
        let mut t = TouchTracker::default();
        t.start(&[p(300.0)]);
        assert_eq!(t.moved(&[p(260.0)]), GestureEvent::None);
        assert_eq!(t.moved(&[p(220.0)]), GestureEvent::None);
        assert_eq!(t.end(&[]), GestureEvent::SwipeNext);
        assert_eq!(t.state(), GestureState::Idle);
    }

    #[test]
    fn test_short_drag_is_not_a_swipe() {
        let mut t = TouchTracker::default();
        t.start(&[p(100.0)]);
        t.moved(&[p(170.0)]);
        assert_eq!(t.end(&[]), GestureEvent::None);
    }

    #[test]
    fn test_exact_threshold_is_not_a_swipe() {
        let mut t = TouchTracker::default();
        t.start(&[p(100.0)]);
        t.moved(&[p(175.0)]);
        assert_eq!(t.end(&[]), GestureEvent::None);
    }

    #[test]
    fn test_pinch_reports_ratio_of_successive_distances() {
        let mut t = TouchTracker::default();
        t.start(&[p(0.0), p(100.0)]);
        assert_eq!(t.state(), GestureState::Pinching);
        assert_eq!(t.moved(&[p(0.0), p(150.0)]), GestureEvent::Scale(1.5));
        assert_eq!(t.moved(&[p(0.0), p(75.0)]), GestureEvent::Scale(0.5));
        assert_eq!(t.end(&[p(0.0)]), GestureEvent::None);
        assert_eq!(t.state(), GestureState::Idle);
    }
}
