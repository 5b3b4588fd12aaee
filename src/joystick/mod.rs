//! Virtual joystick controller
//!
//! Turns touch-start / touch-move / touch-end input into a ring/dot layout and
//! a stream of [`MovementEvent`]s published on the [`EventBus`].
//!
//! # States
//!
//! ```text
//!          touch-start                 touch-end / touch-cancel
//!   Idle ─────────────► Active ─────────────────────────────► Idle
//!                        │  ▲
//!                        └──┘ touch-move (emits TouchMove)
//! ```
//!
//! In [`Mode::Fixed`] the ring stays at its home anchor. In [`Mode::Follow`]
//! the ring jumps to wherever the touch begins and hides on release.

pub mod direction;
pub mod session;
pub mod visual;


use glam::Vec2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bus::{BusEvent, EventBus, SubscriptionId, Topic};
use crate::config::JoystickSettings;
use crate::error::ConfigError;

pub use direction::DirectionPolicy;
pub use session::TouchSession;
pub use visual::{JoystickVisual, OPACITY_HIDDEN, OPACITY_VISIBLE};

/// Joystick interaction mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ring stays at its home anchor
    #[default]
    Fixed,
    /// Ring relocates to the touch-start point and hides on release
    Follow,
}

/// Discrete speed classification derived from touch distance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    #[default]
    Stop,
    /// Touch inside the ring
    Normal,
    /// Touch on or beyond the ring edge
    Fast,
}

/// Unit of information published to joystick consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovementEvent {
    pub speed_tier: SpeedTier,
    /// Normalized direction; `None` on end events
    pub move_vec: Option<Vec2>,
}

impl MovementEvent {
    pub fn moving(speed_tier: SpeedTier, move_vec: Vec2) -> Self {
        Self {
            speed_tier,
            move_vec: Some(move_vec),
        }
    }

    pub fn stop() -> Self {
        Self {
            speed_tier: SpeedTier::Stop,
            move_vec: None,
        }
    }
}

/// Validated joystick configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickConfig {
    mode: Mode,
    direction: DirectionPolicy,
    radius: f32,
}

impl JoystickConfig {
    pub fn new(mode: Mode, direction: DirectionPolicy, radius: f32) -> Result<Self, ConfigError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidRadius(radius));
        }
        Ok(Self {
            mode,
            direction,
            radius,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn direction(&self) -> DirectionPolicy {
        self.direction
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Fixed,
            direction: DirectionPolicy::All,
            radius: 50.0,
        }
    }
}

impl TryFrom<&JoystickSettings> for JoystickConfig {
    type Error = ConfigError;

    fn try_from(settings: &JoystickSettings) -> Result<Self, Self::Error> {
        Self::new(settings.mode, settings.direction, settings.radius)
    }
}

/// Raw touch input delivered by the platform, in UI space
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TouchInput {
    Start { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    End { x: f32, y: f32 },
    Cancel { x: f32, y: f32 },
}

/// Point-in-time copy of the joystick state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickSnapshot {
    pub config: JoystickConfig,
    pub session: TouchSession,
    pub visual: JoystickVisual,
}

impl JoystickSnapshot {
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }
}

struct JoystickState {
    config: JoystickConfig,
    session: TouchSession,
    visual: JoystickVisual,
}

impl JoystickState {
    fn apply_mode(&mut self, mode: Mode) {
        self.config.mode = mode;
        let visible = match mode {
            Mode::Fixed => {
                // An idle ring left behind by a follow session goes home now
                if !self.session.active {
                    self.visual.return_home();
                }
                true
            }
            Mode::Follow => self.session.active,
        };
        self.visual.set_visible(visible);
        debug!("Joystick mode set to {:?} (ring visible: {})", mode, visible);
    }

    fn start(&mut self, location: Vec2) {
        let radius = self.config.radius;
        match self.config.mode {
            Mode::Fixed => {
                self.visual.return_home();
                let origin = self.visual.ring_position;
                let offset = location - origin;
                self.visual.reset_dot();
                // Dot only snaps under the finger when the touch lands inside the ring
                if offset.length() < radius {
                    self.visual.place_dot(offset);
                }
                self.session.begin(origin, location);
            }
            Mode::Follow => {
                self.visual.relocate_ring(location);
                self.visual.set_visible(true);
                self.visual.reset_dot();
                self.session.begin(location, location);
            }
        }
    }

    fn movement(&mut self, location: Vec2) -> Option<MovementEvent> {
        if !self.session.active {
            debug!("Ignoring touch-move at {} without an active touch", location);
            return None;
        }

        if self.config.mode == Mode::Follow && !self.session.has_moved(location) {
            return None;
        }
        self.session.record(location);

        let radius = self.config.radius;
        let vector = location - self.session.origin;
        let distance = vector.length();
        let dir = vector.normalize_or_zero();

        let speed_tier = if distance < radius {
            self.visual.place_dot(vector);
            SpeedTier::Normal
        } else {
            self.visual.place_dot(dir * radius);
            SpeedTier::Fast
        };

        Some(MovementEvent::moving(
            speed_tier,
            self.config.direction.snap(dir),
        ))
    }

    fn end(&mut self) {
        self.visual.reset_dot();
        if self.config.mode == Mode::Follow {
            self.visual.set_visible(false);
        }
        self.session.end();
    }
}

/// On-screen joystick
///
/// A controller built without a [`JoystickVisual`] is inert: every touch call
/// returns immediately and no mode-change listener is installed.
pub struct JoystickController {
    state: Option<Arc<Mutex<JoystickState>>>,
    bus: EventBus,
    mode_subscription: Option<SubscriptionId>,
}

impl JoystickController {
    pub fn new(config: JoystickConfig, visual: Option<JoystickVisual>, bus: EventBus) -> Self {
        let Some(mut visual) = visual else {
            warn!("Joystick ring/dot anchors are not configured; touch handling disabled");
            return Self {
                state: None,
                bus,
                mode_subscription: None,
            };
        };

        visual.set_radius(config.radius);
        visual.reset_dot();
        visual.set_visible(config.mode == Mode::Fixed);

        let mut controller = Self {
            state: Some(Arc::new(Mutex::new(JoystickState {
                config,
                session: TouchSession::default(),
                visual,
            }))),
            bus,
            mode_subscription: None,
        };
        controller.enable();
        controller
    }

    pub fn is_inert(&self) -> bool {
        self.state.is_none()
    }

    /// Start listening for mode-change requests
    pub fn enable(&mut self) {
        if self.mode_subscription.is_some() {
            return;
        }
        let Some(state) = &self.state else { return };

        let state = state.clone();
        let id = self.bus.subscribe(Topic::SetJoystickMode, move |event| {
            if let BusEvent::SetJoystickMode(mode) = event {
                state.lock().apply_mode(*mode);
            }
        });
        self.mode_subscription = Some(id);
    }

    /// Stop listening for mode-change requests
    pub fn disable(&mut self) {
        if let Some(id) = self.mode_subscription.take() {
            self.bus.unsubscribe(Topic::SetJoystickMode, id);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode_subscription.is_some()
    }

    pub fn handle(&self, input: TouchInput) -> Option<MovementEvent> {
        match input {
            TouchInput::Start { x, y } => {
                self.touch_start(Vec2::new(x, y));
                None
            }
            TouchInput::Move { x, y } => self.touch_move(Vec2::new(x, y)),
            TouchInput::End { x, y } => self.touch_end(Vec2::new(x, y)),
            TouchInput::Cancel { x, y } => self.touch_cancel(Vec2::new(x, y)),
        }
    }

    pub fn touch_start(&self, location: Vec2) {
        let Some(state) = &self.state else { return };

        self.bus.publish(BusEvent::TouchStart(location));

        let mut state = state.lock();
        state.start(location);
        debug!(
            "Touch start at {} ({:?}, ring at {}, dot {})",
            location, state.config.mode, state.visual.ring_position, state.visual.dot_offset
        );
    }

    /// Returns the published event, or `None` when the move was suppressed
    pub fn touch_move(&self, location: Vec2) -> Option<MovementEvent> {
        let state = self.state.as_ref()?;

        // Lock is released before publishing so listeners may call back in
        let event = state.lock().movement(location)?;
        self.bus.publish(BusEvent::TouchMove(event));
        Some(event)
    }

    pub fn touch_end(&self, location: Vec2) -> Option<MovementEvent> {
        let state = self.state.as_ref()?;

        state.lock().end();
        debug!("Touch released at {}", location);

        let event = MovementEvent::stop();
        self.bus.publish(BusEvent::TouchEnd(event));
        Some(event)
    }

    pub fn touch_cancel(&self, location: Vec2) -> Option<MovementEvent> {
        self.touch_end(location)
    }

    /// Current mode; `None` when inert
    pub fn mode(&self) -> Option<Mode> {
        Some(self.state.as_ref()?.lock().config.mode)
    }

    pub fn is_active(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.lock().session.active)
    }

    pub fn session(&self) -> Option<TouchSession> {
        Some(self.state.as_ref()?.lock().session)
    }

    pub fn dot_offset(&self) -> Option<Vec2> {
        Some(self.state.as_ref()?.lock().visual.dot_offset)
    }

    pub fn ring_position(&self) -> Option<Vec2> {
        Some(self.state.as_ref()?.lock().visual.ring_position)
    }

    pub fn ring_opacity(&self) -> Option<u8> {
        Some(self.state.as_ref()?.lock().visual.opacity)
    }

    pub fn ring_visible(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.lock().visual.is_visible())
    }

    pub fn snapshot(&self) -> Option<JoystickSnapshot> {
        let state = self.state.as_ref()?.lock();
        Some(JoystickSnapshot {
            config: state.config,
            session: state.session,
            visual: state.visual,
        })
    }
}

impl Drop for JoystickController {
    fn drop(&mut self) {
        self.disable();
    }
}
