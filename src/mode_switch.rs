//! Mode switch - control surface for UI buttons that change the joystick mode

use tracing::debug;

use crate::bus::{BusEvent, EventBus};
use crate::joystick::Mode;

/// Publishes mode-change requests; holds no state of its own
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    bus: EventBus,
}

impl ModeSwitch {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn use_fixed(&self) -> usize {
        self.set(Mode::Fixed)
    }

    pub fn use_follow(&self) -> usize {
        self.set(Mode::Follow)
    }

    /// Returns the number of listeners that received the request
    pub fn set(&self, mode: Mode) -> usize {
        let delivered = self.bus.publish(BusEvent::SetJoystickMode(mode));
        debug!("Requested joystick mode {:?} ({} listener(s))", mode, delivered);
        delivered
    }
}
