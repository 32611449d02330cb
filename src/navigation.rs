//! Full-screen viewer navigation
//!
//! A pointer press either becomes a tap (closes the viewer) or, once it moves
//! past [`DRAG_THRESHOLD`], a drag that pulls the image sideways. Releasing a
//! drag past the commit threshold animates a page turn; anything shorter
//! animates back. Arrow keys trigger the same page turn, `Escape` closes at
//! once.
//!
//! Time is passed in by the host on every call that can start or advance an
//! animation, so the machine stays free of any clock or redraw concern.

use std::f32::consts::PI;
use std::time::Instant;

use crate::modal::{ModalGuard, ScrollLock};
use crate::types::{COMMIT_FRACTION, DRAG_THRESHOLD, TRANSITION_DURATION};

/// Ease-in-out curve mapping linear progress in `[0, 1]` onto `[0, 1]`
#[must_use]
pub fn ease_in_out(progress: f32) -> f32 {
    let progress = progress.clamp(0.0, 1.0);
    0.5 - (PI * progress).cos() / 2.0
}

/// Page turn direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher indices, content moves left
    Next,
    /// Towards lower indices, content moves right
    Prev,
}

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Show the previous image
    ArrowLeft,
    /// Show the next image
    ArrowRight,
    /// Close the viewer
    Escape,
}

/// Coarse viewer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    /// Viewer closed
    Idle,
    /// Showing the current image at rest
    Open,
    /// Pointer down, not yet moved past the drag threshold
    Pressed,
    /// Pointer down and dragging the image
    Dragging,
    /// Animated page turn or cancel in flight
    Transitioning,
}

/// Notifications emitted by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The viewer closed
    Closed,
    /// An animation started, `None` for a cancel back to rest
    TransitionStarted(Option<Direction>),
    /// A page turn finished and `index` is now shown
    Navigated {
        /// New current index
        index: usize,
    },
    /// A cancel animation finished, the index is unchanged
    Cancelled,
}

/// Snapshot of the navigation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationState {
    /// Index of the image on screen
    pub current_index:     usize,
    /// Horizontal displacement of the image
    pub drag_offset:       f32,
    /// Whether an animation is in flight
    pub transitioning:     bool,
    /// Direction of the page turn in flight, if any
    pub pending_direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from:      f32,
    to:        f32,
    started:   Instant,
    direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Open,
    Pressed { x: f32, y: f32 },
    Dragging { x: f32 },
    Transitioning(Transition),
}

/// Navigation state machine of one full-screen viewer
#[derive(Debug)]
pub struct Viewer {
    image_count:    usize,
    /// Index the viewer returns to when closed
    initial_index:  usize,
    current_index:  usize,
    viewport_width: f32,
    offset:         f32,
    phase:          Phase,
    scroll_lock:    ScrollLock,
    /// Held while open
    modal:          Option<ModalGuard>,
}

impl Viewer {
    /// Create a closed viewer over `image_count` images entered at
    /// `initial_index`.
    ///
    /// Returns `None` if the index is out of range or the width is not a
    /// positive finite number.
    #[must_use]
    pub fn new(
        image_count: usize,
        initial_index: usize,
        viewport_width: f32,
        scroll_lock: ScrollLock,
    ) -> Option<Self> {
        if initial_index >= image_count || !viewport_width.is_finite() || viewport_width <= 0.0 {
            return None;
        }
        Some(Self {
            image_count,
            initial_index,
            current_index: initial_index,
            viewport_width,
            offset: 0.0,
            phase: Phase::Idle,
            scroll_lock,
            modal: None,
        })
    }

    /// Open the viewer at its initial index
    pub fn open(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            return;
        }
        self.current_index = self.initial_index;
        self.offset = 0.0;
        self.phase = Phase::Open;
        self.modal = Some(self.scroll_lock.acquire());
    }

    /// Close immediately, interrupting any animation, and rewind to the
    /// initial index
    pub fn close(&mut self) -> Option<ViewerEvent> {
        if matches!(self.phase, Phase::Idle) {
            return None;
        }
        self.phase = Phase::Idle;
        self.offset = 0.0;
        self.current_index = self.initial_index;
        self.modal = None;
        Some(ViewerEvent::Closed)
    }

    /// Pointer or touch down at `(x, y)`; ignored unless at rest
    pub fn press(&mut self, x: f32, y: f32) {
        if matches!(self.phase, Phase::Open) {
            self.phase = Phase::Pressed { x, y };
        }
    }

    /// Pointer moved to `(x, y)`
    pub fn move_to(&mut self, x: f32, y: f32) {
        match self.phase {
            Phase::Pressed { x: x0, y: y0 } => {
                if (x - x0).abs() > DRAG_THRESHOLD || (y - y0).abs() > DRAG_THRESHOLD {
                    self.phase = Phase::Dragging { x: x0 };
                    self.offset = self.clamp_offset(x - x0);
                }
            },
            Phase::Dragging { x: x0 } => {
                self.offset = self.clamp_offset(x - x0);
            },
            Phase::Idle | Phase::Open | Phase::Transitioning(_) => {},
        }
    }

    /// Pointer released at time `now`.
    ///
    /// A press that never became a drag is a tap and closes the viewer. A drag
    /// past the commit threshold towards an existing neighbor starts a page
    /// turn, any other drag animates back to rest.
    pub fn release(&mut self, now: Instant) -> Option<ViewerEvent> {
        match self.phase {
            Phase::Pressed { .. } => self.close(),
            Phase::Dragging { .. } => {
                let direction = if self.offset < 0.0 { Direction::Next } else { Direction::Prev };
                let committed = self.offset.abs() > COMMIT_FRACTION * self.viewport_width
                    && self.has_neighbor(direction);
                if committed {
                    Some(self.begin_transition(Some(direction), now))
                } else if self.offset.abs() < f32::EPSILON {
                    self.offset = 0.0;
                    self.phase = Phase::Open;
                    Some(ViewerEvent::Cancelled)
                } else {
                    Some(self.begin_transition(None, now))
                }
            },
            Phase::Idle | Phase::Open | Phase::Transitioning(_) => None,
        }
    }

    /// Keyboard input at time `now`
    pub fn key(&mut self, key: Key, now: Instant) -> Option<ViewerEvent> {
        match key {
            Key::Escape => self.close(),
            Key::ArrowRight => self.navigate(Direction::Next, now),
            Key::ArrowLeft => self.navigate(Direction::Prev, now),
        }
    }

    /// Start an animated page turn, as the arrow keys and buttons do.
    ///
    /// Inert unless the viewer is at rest with a neighbor in `direction`.
    pub fn navigate(&mut self, direction: Direction, now: Instant) -> Option<ViewerEvent> {
        if !matches!(self.phase, Phase::Open) || !self.has_neighbor(direction) {
            return None;
        }
        Some(self.begin_transition(Some(direction), now))
    }

    /// Advance the animation in flight to time `now`
    pub fn frame(&mut self, now: Instant) -> Option<ViewerEvent> {
        let Phase::Transitioning(transition) = self.phase else {
            return None;
        };

        let elapsed = now.saturating_duration_since(transition.started);
        let progress = (elapsed.as_secs_f32() / TRANSITION_DURATION.as_secs_f32()).min(1.0);
        if progress < 1.0 {
            self.offset = transition.from + (transition.to - transition.from) * ease_in_out(progress);
            return None;
        }

        self.offset = 0.0;
        self.phase = Phase::Open;
        match transition.direction {
            Some(Direction::Next) => self.current_index += 1,
            Some(Direction::Prev) => self.current_index -= 1,
            None => return Some(ViewerEvent::Cancelled),
        }
        assert!(self.current_index < self.image_count, "Index must stay within the catalog");
        tracing::debug!(index = self.current_index, "viewer navigated");
        Some(ViewerEvent::Navigated { index: self.current_index })
    }

    /// Update the viewport width, ignoring non-positive values
    pub fn set_viewport_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
            self.offset = self.clamp_offset(self.offset);
        }
    }

    /// Returns true if an image follows the current one
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_index + 1 < self.image_count
    }

    /// Returns true if an image precedes the current one
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.current_index > 0
    }

    /// Index of the image on screen
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current horizontal displacement
    #[must_use]
    pub const fn offset(&self) -> f32 {
        self.offset
    }

    /// Returns true unless the viewer is closed
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Coarse state of the machine
    #[must_use]
    pub const fn phase(&self) -> ViewerPhase {
        match self.phase {
            Phase::Idle => ViewerPhase::Idle,
            Phase::Open => ViewerPhase::Open,
            Phase::Pressed { .. } => ViewerPhase::Pressed,
            Phase::Dragging { .. } => ViewerPhase::Dragging,
            Phase::Transitioning(_) => ViewerPhase::Transitioning,
        }
    }

    /// Snapshot of the navigation state
    #[must_use]
    pub const fn state(&self) -> NavigationState {
        let (transitioning, pending_direction) = match self.phase {
            Phase::Transitioning(transition) => (true, transition.direction),
            _ => (false, None),
        };
        NavigationState {
            current_index: self.current_index,
            drag_offset: self.offset,
            transitioning,
            pending_direction,
        }
    }

    const fn has_neighbor(&self, direction: Direction) -> bool {
        match direction {
            Direction::Next => self.has_next(),
            Direction::Prev => self.has_prev(),
        }
    }

    fn clamp_offset(&self, offset: f32) -> f32 {
        offset.clamp(-self.viewport_width, self.viewport_width)
    }

    fn begin_transition(&mut self, direction: Option<Direction>, now: Instant) -> ViewerEvent {
        let to = match direction {
            Some(Direction::Next) => -self.viewport_width,
            Some(Direction::Prev) => self.viewport_width,
            None => 0.0,
        };
        self.phase =
            Phase::Transitioning(Transition { from: self.offset, to, started: now, direction });
        ViewerEvent::TransitionStarted(direction)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::time::Duration;

    use super::*;

    const WIDTH: f32 = 1000.0;

    fn open_viewer(count: usize, index: usize) -> Viewer {
        let mut viewer = Viewer::new(count, index, WIDTH, ScrollLock::new()).unwrap();
        viewer.open();
        viewer
    }

    fn drag(viewer: &mut Viewer, dx: f32) {
        viewer.press(500.0, 300.0);
        viewer.move_to(500.0 + dx / 2.0, 300.0);
        viewer.move_to(500.0 + dx, 300.0);
    }

    fn finish(viewer: &mut Viewer, start: Instant) -> Option<ViewerEvent> {
        viewer.frame(start + TRANSITION_DURATION)
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Viewer::new(0, 0, WIDTH, ScrollLock::new()).is_none());
        assert!(Viewer::new(3, 3, WIDTH, ScrollLock::new()).is_none());
        assert!(Viewer::new(3, 0, 0.0, ScrollLock::new()).is_none());
        assert!(Viewer::new(3, 0, f32::NAN, ScrollLock::new()).is_none());
    }

    #[test]
    fn test_drag_past_threshold_commits() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        drag(&mut viewer, -400.0);
        assert_eq!(viewer.phase(), ViewerPhase::Dragging);
        assert_eq!(
            viewer.release(now),
            Some(ViewerEvent::TransitionStarted(Some(Direction::Next)))
        );
        assert_eq!(viewer.state().pending_direction, Some(Direction::Next));

        assert_eq!(finish(&mut viewer, now), Some(ViewerEvent::Navigated { index: 3 }));
        assert_eq!(viewer.phase(), ViewerPhase::Open);
        assert_eq!(viewer.current_index(), 3);
        assert!(viewer.offset() == 0.0);
    }

    #[test]
    fn test_drag_right_goes_back() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        drag(&mut viewer, 200.0);
        viewer.release(now);
        assert_eq!(finish(&mut viewer, now), Some(ViewerEvent::Navigated { index: 1 }));
    }

    #[test]
    fn test_short_drag_cancels() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        drag(&mut viewer, -100.0);
        assert_eq!(viewer.release(now), Some(ViewerEvent::TransitionStarted(None)));
        assert_eq!(finish(&mut viewer, now), Some(ViewerEvent::Cancelled));
        assert_eq!(viewer.current_index(), 2);
        assert!(viewer.offset() == 0.0);
    }

    #[test]
    fn test_drag_without_neighbor_cancels() {
        let mut viewer = open_viewer(3, 2);
        let now = Instant::now();

        drag(&mut viewer, -600.0);
        assert_eq!(viewer.release(now), Some(ViewerEvent::TransitionStarted(None)));
        assert_eq!(finish(&mut viewer, now), Some(ViewerEvent::Cancelled));
        assert_eq!(viewer.current_index(), 2);
    }

    #[test]
    fn test_tap_closes_and_rewinds() {
        let mut viewer = open_viewer(5, 1);
        let now = Instant::now();

        viewer.key(Key::ArrowRight, now);
        finish(&mut viewer, now);
        assert_eq!(viewer.current_index(), 2);

        viewer.press(10.0, 10.0);
        viewer.move_to(13.0, 14.0);
        assert_eq!(viewer.phase(), ViewerPhase::Pressed);
        assert_eq!(viewer.release(now), Some(ViewerEvent::Closed));
        assert_eq!(viewer.phase(), ViewerPhase::Idle);
        assert_eq!(viewer.current_index(), 1);

        viewer.open();
        assert_eq!(viewer.current_index(), 1);
    }

    #[test]
    fn test_vertical_movement_latches_drag() {
        let mut viewer = open_viewer(5, 1);
        viewer.press(10.0, 10.0);
        viewer.move_to(11.0, 30.0);
        assert_eq!(viewer.phase(), ViewerPhase::Dragging);
        assert!((viewer.offset() - 1.0).abs() < f32::EPSILON);

        viewer.move_to(10.0, 10.0);
        assert_eq!(viewer.phase(), ViewerPhase::Dragging);
    }

    #[test]
    fn test_offset_clamped_to_viewport() {
        let mut viewer = open_viewer(5, 2);
        drag(&mut viewer, -5000.0);
        assert!((viewer.offset() + WIDTH).abs() < f32::EPSILON);
        drag(&mut viewer, 5000.0);
        assert!(viewer.offset() <= WIDTH);
    }

    #[test]
    fn test_animation_follows_easing() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        viewer.key(Key::ArrowRight, now);
        assert_eq!(viewer.frame(now + TRANSITION_DURATION / 2), None);
        assert!((viewer.offset() + WIDTH / 2.0).abs() < 1.0);
        assert!(viewer.state().transitioning);

        assert_eq!(viewer.frame(now + TRANSITION_DURATION * 2), Some(ViewerEvent::Navigated {
            index: 3
        }));
        assert!(!viewer.state().transitioning);
    }

    #[test]
    fn test_input_ignored_while_transitioning() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        viewer.key(Key::ArrowLeft, now);
        viewer.frame(now + Duration::from_millis(100));
        let offset = viewer.offset();

        viewer.press(0.0, 0.0);
        viewer.move_to(400.0, 0.0);
        assert_eq!(viewer.release(now), None);
        assert_eq!(viewer.key(Key::ArrowRight, now), None);
        assert!((viewer.offset() - offset).abs() < f32::EPSILON);
        assert_eq!(viewer.phase(), ViewerPhase::Transitioning);

        assert_eq!(finish(&mut viewer, now), Some(ViewerEvent::Navigated { index: 1 }));
    }

    #[test]
    fn test_keys_inert_at_boundaries() {
        let now = Instant::now();

        let mut viewer = open_viewer(3, 0);
        assert_eq!(viewer.key(Key::ArrowLeft, now), None);
        assert_eq!(viewer.phase(), ViewerPhase::Open);

        let mut viewer = open_viewer(1, 0);
        assert!(!viewer.has_next());
        assert!(!viewer.has_prev());
        assert_eq!(viewer.key(Key::ArrowRight, now), None);
    }

    #[test]
    fn test_escape_interrupts_animation() {
        let mut viewer = open_viewer(5, 2);
        let now = Instant::now();

        viewer.key(Key::ArrowRight, now);
        viewer.frame(now + Duration::from_millis(50));
        assert_eq!(viewer.key(Key::Escape, now), Some(ViewerEvent::Closed));
        assert_eq!(viewer.current_index(), 2);
        assert_eq!(viewer.frame(now + TRANSITION_DURATION), None);
        assert_eq!(viewer.key(Key::Escape, now), None);
    }

    #[test]
    fn test_scroll_lock_follows_viewer() {
        let lock = ScrollLock::new();
        let mut viewer = Viewer::new(3, 0, WIDTH, lock.clone()).unwrap();
        assert!(!lock.is_locked());

        viewer.open();
        assert!(lock.is_locked());
        viewer.close();
        assert!(!lock.is_locked());

        viewer.open();
        drop(viewer);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_closed_viewer_ignores_input() {
        let mut viewer = Viewer::new(3, 1, WIDTH, ScrollLock::new()).unwrap();
        let now = Instant::now();
        viewer.press(0.0, 0.0);
        viewer.move_to(300.0, 0.0);
        assert_eq!(viewer.release(now), None);
        assert_eq!(viewer.key(Key::ArrowRight, now), None);
        assert_eq!(viewer.phase(), ViewerPhase::Idle);
    }

    #[test]
    fn test_ease_in_out() {
        assert!(ease_in_out(0.0).abs() < f32::EPSILON);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);

        let mut last = 0.0;
        for step in 0..=100 {
            #[allow(clippy::cast_precision_loss)]
            let value = ease_in_out(step as f32 / 100.0);
            assert!(value >= last);
            last = value;
        }
    }
}
