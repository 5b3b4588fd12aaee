//! Logical ring/dot values written by the joystick and read by a renderer

use glam::Vec2;

/// Ring opacity while shown
pub const OPACITY_VISIBLE: u8 = 255;
/// Ring opacity while hidden
pub const OPACITY_HIDDEN: u8 = 0;

/// Ring and dot anchors of an on-screen joystick
///
/// Positions are in UI space. `dot_offset` is relative to the ring center and
/// never exceeds the configured radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickVisual {
    /// Where the ring sits in fixed mode
    pub home: Vec2,
    /// Current ring center
    pub ring_position: Vec2,
    /// Ring content size (width, height), set from the radius
    pub ring_size: Vec2,
    pub dot_offset: Vec2,
    pub opacity: u8,
}

impl JoystickVisual {
    pub fn new(home: Vec2) -> Self {
        Self {
            home,
            ring_position: home,
            ring_size: Vec2::ZERO,
            dot_offset: Vec2::ZERO,
            opacity: OPACITY_VISIBLE,
        }
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.ring_size = Vec2::splat(radius * 2.0);
    }

    pub fn is_visible(&self) -> bool {
        self.opacity != OPACITY_HIDDEN
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.opacity = if visible { OPACITY_VISIBLE } else { OPACITY_HIDDEN };
    }

    pub fn relocate_ring(&mut self, position: Vec2) {
        self.ring_position = position;
    }

    pub fn return_home(&mut self) {
        self.ring_position = self.home;
    }

    pub fn place_dot(&mut self, offset: Vec2) {
        self.dot_offset = offset;
    }

    pub fn reset_dot(&mut self) {
        self.dot_offset = Vec2::ZERO;
    }
}
