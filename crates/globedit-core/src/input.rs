//! Pointer and modifier state handed to sessions by the input dispatcher.

use crate::camera::Camera;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only Shift held.
    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    /// Only Alt held.
    pub fn alt() -> Self {
        Self { alt: true, ..Self::NONE }
    }

    /// Only Meta held.
    pub fn meta() -> Self {
        Self { meta: true, ..Self::NONE }
    }
}

/// One pointer sample, with everything needed to map it into the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Pointer position in screen pixels.
    pub screen: Point,
    pub modifiers: Modifiers,
    pub camera: Camera,
    /// Viewport size in screen pixels.
    pub viewport: Size,
    /// Pointer speed in screen pixels per frame.
    pub speed: f64,
}

impl PointerInput {
    pub fn new(screen: Point, modifiers: Modifiers, camera: Camera, viewport: Size) -> Self {
        Self {
            screen,
            modifiers,
            camera,
            viewport,
            speed: 0.0,
        }
    }

    /// Pointer position in world units.
    pub fn world(&self) -> Point {
        self.camera.screen_to_world(self.screen)
    }

    /// The world-space rectangle currently on screen.
    pub fn visible_world_rect(&self) -> Rect {
        self.camera.visible_world_rect(self.viewport)
    }

    /// Same sample at a different screen position.
    pub fn moved_to(&self, screen: Point) -> Self {
        Self { screen, ..*self }
    }

    /// Same pointer with different modifiers.
    pub fn with_modifiers(&self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..*self }
    }
}

/// Tracks pointer motion between frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    last: Option<Point>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous sample, e.g. at gesture start.
    pub fn reset(&mut self, screen: Point) {
        self.last = Some(screen);
    }

    /// Record a sample and return the distance moved since the previous one.
    pub fn track(&mut self, screen: Point) -> f64 {
        let delta = self.last.map_or(Vec2::ZERO, |last| screen - last);
        self.last = Some(screen);
        delta.hypot()
    }
}
