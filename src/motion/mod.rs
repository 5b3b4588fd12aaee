//! Motion controller - consumes joystick movement events and advances a body
//!
//! Event handling and integration are decoupled: bus listeners only overwrite
//! the [`MotionState`], and [`MotionController::tick`] reads it once per fixed
//! simulation step.

pub mod integrator;

use glam::Vec2;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::bus::{BusEvent, EventBus, SubscriptionId, Topic};
use crate::config::{IntegrationMode, MotionSettings};
use crate::error::ConfigError;
use crate::joystick::{MovementEvent, SpeedTier};

pub use integrator::{ForceIntegrator, KinematicIntegrator, MotionIntegrator, PhysicsSink};

/// Logical transform of the controlled entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Body {
    pub position: Vec2,
    /// Facing angle in degrees
    pub angle_deg: f32,
}

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TickOutcome {
    /// Tier is `Stop`, nothing happened
    Idle,
    Moved { displacement: Vec2 },
    Forced { force: Vec2 },
}

/// Latest direction and speed received from the joystick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionState {
    pub move_dir: Vec2,
    pub speed_tier: SpeedTier,
    /// Always the configured speed of `speed_tier`
    pub resolved_speed: f32,
}

impl MotionState {
    fn new(settings: &MotionSettings) -> Self {
        Self {
            move_dir: settings.initial_dir.normalize_or_zero(),
            speed_tier: SpeedTier::Stop,
            resolved_speed: settings.speed_for(SpeedTier::Stop),
        }
    }

    /// Overwrite state from an event. End events carry no vector, so the
    /// direction from the last move is kept; a zero vector is ignored too.
    pub fn apply(&mut self, event: &MovementEvent, settings: &MotionSettings) {
        self.speed_tier = event.speed_tier;
        if let Some(dir) = event.move_vec.filter(|v| *v != Vec2::ZERO) {
            self.move_dir = dir;
        }
        self.resolved_speed = settings.speed_for(event.speed_tier);
    }
}

/// Drives a [`Body`] from movement events on an [`EventBus`]
pub struct MotionController {
    bus: EventBus,
    settings: Arc<MotionSettings>,
    state: Arc<Mutex<MotionState>>,
    body: Body,
    integrator: Box<dyn MotionIntegrator>,
    subscriptions: Vec<(Topic, SubscriptionId)>,
}

impl MotionController {
    /// Build a controller with an explicit integrator and attach it to `bus`.
    /// `settings.integration` is overwritten with the integrator's mode.
    pub fn new(
        mut settings: MotionSettings,
        integrator: Box<dyn MotionIntegrator>,
        bus: EventBus,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        if settings.integration != integrator.mode() {
            debug!(
                "Integration {:?} requested, using {:?} integrator",
                settings.integration,
                integrator.mode()
            );
            settings.integration = integrator.mode();
        }

        let state = MotionState::new(&settings);
        let mut controller = Self {
            bus,
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(state)),
            body: Body::default(),
            integrator,
            subscriptions: Vec::new(),
        };
        controller.attach();
        Ok(controller)
    }

    /// Direct displacement of the body every tick
    pub fn kinematic(settings: MotionSettings, bus: EventBus) -> Result<Self, ConfigError> {
        Self::new(settings, Box::new(KinematicIntegrator), bus)
    }

    /// Continuous force into `sink` every tick, scaled by `force_scale`
    pub fn with_force(
        settings: MotionSettings,
        sink: Box<dyn PhysicsSink>,
        bus: EventBus,
    ) -> Result<Self, ConfigError> {
        let scale = settings.force_scale;
        Self::new(settings, Box::new(ForceIntegrator::new(sink, scale)), bus)
    }

    pub fn integration(&self) -> IntegrationMode {
        self.integrator.mode()
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    /// Subscribe to touch-move and touch-end. Idempotent.
    pub fn attach(&mut self) {
        if !self.subscriptions.is_empty() {
            return;
        }

        for topic in [Topic::TouchMove, Topic::TouchEnd] {
            let state = self.state.clone();
            let settings = self.settings.clone();
            let id = self.bus.subscribe(topic, move |event| match event {
                BusEvent::TouchMove(movement) | BusEvent::TouchEnd(movement) => {
                    state.lock().apply(movement, &settings);
                    trace!("Motion state updated from {:?}", movement);
                }
                _ => {}
            });
            self.subscriptions.push((topic, id));
        }
        debug!("Motion controller attached");
    }

    /// Remove all bus subscriptions. Idempotent.
    pub fn detach(&mut self) {
        for (topic, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(topic, id);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Apply an event without going through the bus
    pub fn handle_event(&self, event: &MovementEvent) {
        self.state.lock().apply(event, &self.settings);
    }

    /// Advance one fixed simulation step of `dt` seconds
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("Skipping tick with invalid dt {}", dt);
            return TickOutcome::Idle;
        }

        let state = *self.state.lock();
        if state.speed_tier == SpeedTier::Stop {
            return TickOutcome::Idle;
        }

        let dir = state.move_dir;
        self.body.angle_deg = dir.y.atan2(dir.x).to_degrees() + self.settings.facing_offset_deg;
        self.integrator
            .integrate(&mut self.body, dir, state.resolved_speed, dt)
    }

    pub fn state(&self) -> MotionState {
        *self.state.lock()
    }

    pub fn body(&self) -> Body {
        self.body
    }

    /// Place the body, e.g. when spawning or respawning the entity
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }
}

impl Drop for MotionController {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn controller(bus: &EventBus) -> MotionController {
        MotionController::kinematic(MotionSettings::default(), bus.clone()).unwrap()
    }

    fn publish_move(bus: &EventBus, tier: SpeedTier, dir: Vec2) {
        bus.publish(BusEvent::TouchMove(MovementEvent::moving(tier, dir)));
    }

    #[test]
    fn test_starts_stopped_facing_initial_dir() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);

        let state = motion.state();
        assert_eq!(state.speed_tier, SpeedTier::Stop);
        assert_eq!(state.move_dir, Vec2::Y);
        assert_eq!(state.resolved_speed, 0.0);
        assert_eq!(motion.tick(DT), TickOutcome::Idle);
        assert_eq!(motion.body(), Body::default());
    }

    #[test]
    fn test_normal_speed_displacement_per_tick() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        publish_move(&bus, SpeedTier::Normal, Vec2::X);

        let TickOutcome::Moved { displacement } = motion.tick(DT) else {
            panic!("expected displacement");
        };
        assert!((displacement.x - 100.0 / 60.0).abs() < 1e-4);
        assert_eq!(displacement.y, 0.0);
        assert!((motion.body().position.x - 1.6667).abs() < 1e-3);
    }

    #[test]
    fn test_fast_tier_uses_fast_speed() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        publish_move(&bus, SpeedTier::Fast, Vec2::NEG_Y);

        assert_eq!(motion.state().resolved_speed, 200.0);
        motion.tick(0.5);
        assert_eq!(motion.body().position, Vec2::new(0.0, -100.0));
    }

    #[test]
    fn test_end_keeps_direction_and_stops() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        publish_move(&bus, SpeedTier::Normal, Vec2::NEG_X);
        motion.tick(DT);
        let before = motion.body();

        bus.publish(BusEvent::TouchEnd(MovementEvent::stop()));
        let state = motion.state();
        assert_eq!(state.speed_tier, SpeedTier::Stop);
        assert_eq!(state.move_dir, Vec2::NEG_X);
        assert_eq!(state.resolved_speed, 0.0);

        assert_eq!(motion.tick(DT), TickOutcome::Idle);
        assert_eq!(motion.body(), before);
    }

    #[test]
    fn test_zero_vector_keeps_previous_direction() {
        let bus = EventBus::new();
        let motion = controller(&bus);
        publish_move(&bus, SpeedTier::Normal, Vec2::X);
        publish_move(&bus, SpeedTier::Normal, Vec2::ZERO);
        assert_eq!(motion.state().move_dir, Vec2::X);
    }

    #[test]
    fn test_same_event_twice_is_idempotent() {
        let bus = EventBus::new();
        let motion = controller(&bus);
        let dir = Vec2::new(0.6, 0.8);

        publish_move(&bus, SpeedTier::Fast, dir);
        let once = motion.state();
        publish_move(&bus, SpeedTier::Fast, dir);
        assert_eq!(motion.state(), once);
        assert_eq!(once.move_dir, dir);
        assert_eq!(once.resolved_speed, 200.0);
    }

    #[test]
    fn test_orientation_uses_facing_offset() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);

        publish_move(&bus, SpeedTier::Normal, Vec2::Y);
        motion.tick(DT);
        assert!(motion.body().angle_deg.abs() < 1e-4);

        publish_move(&bus, SpeedTier::Normal, Vec2::X);
        motion.tick(DT);
        assert!((motion.body().angle_deg + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_force_mode_feeds_sink() {
        let bus = EventBus::new();
        let forces = Arc::new(Mutex::new(Vec::new()));
        let f = forces.clone();
        let settings = MotionSettings {
            integration: IntegrationMode::Force,
            ..MotionSettings::default()
        };
        let mut motion =
            MotionController::with_force(settings, Box::new(move |v: Vec2| f.lock().push(v)), bus.clone())
                .unwrap();
        assert_eq!(motion.integration(), IntegrationMode::Force);

        assert_eq!(motion.tick(DT), TickOutcome::Idle);
        publish_move(&bus, SpeedTier::Normal, Vec2::X);
        motion.tick(DT);
        motion.tick(DT);

        assert_eq!(*forces.lock(), vec![Vec2::new(5.0, 0.0), Vec2::new(5.0, 0.0)]);
        assert_eq!(motion.body().position, Vec2::ZERO);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let bus = EventBus::new();
        let settings = MotionSettings {
            normal_speed: -3.0,
            ..MotionSettings::default()
        };
        let err = MotionController::kinematic(settings, bus.clone()).err();
        assert_eq!(
            err,
            Some(ConfigError::InvalidSpeed { tier: "normal", value: -3.0 })
        );
        assert_eq!(bus.listener_count(Topic::TouchMove), 0);
    }

    #[test]
    fn test_detach_and_drop_leave_no_listeners() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        assert_eq!(bus.listener_count(Topic::TouchMove), 1);
        assert_eq!(bus.listener_count(Topic::TouchEnd), 1);

        motion.detach();
        assert!(!motion.is_attached());
        publish_move(&bus, SpeedTier::Fast, Vec2::X);
        assert_eq!(motion.state().speed_tier, SpeedTier::Stop);

        motion.attach();
        motion.attach();
        assert_eq!(bus.listener_count(Topic::TouchMove), 1);

        drop(motion);
        assert_eq!(bus.listener_count(Topic::TouchMove), 0);
        assert_eq!(bus.listener_count(Topic::TouchEnd), 0);
    }

    #[test]
    fn test_multiple_consumers_receive_same_event() {
        let bus = EventBus::new();
        let a = controller(&bus);
        let b = controller(&bus);
        publish_move(&bus, SpeedTier::Fast, Vec2::NEG_X);
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state().speed_tier, SpeedTier::Fast);
    }

    #[test]
    fn test_handle_event_without_bus() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        motion.detach();
        motion.handle_event(&MovementEvent::moving(SpeedTier::Normal, Vec2::X));
        assert_eq!(motion.state().resolved_speed, 100.0);
    }

    #[test]
    fn test_integration_reports_constructed_integrator() {
        let bus = EventBus::new();
        let settings = MotionSettings {
            integration: IntegrationMode::Force,
            ..MotionSettings::default()
        };
        let mut motion = MotionController::kinematic(settings, bus.clone()).unwrap();
        assert_eq!(motion.integration(), IntegrationMode::Kinematic);
        assert_eq!(motion.settings().integration, IntegrationMode::Kinematic);

        publish_move(&bus, SpeedTier::Normal, Vec2::X);
        assert!(matches!(motion.tick(DT), TickOutcome::Moved { .. }));

        let forced =
            MotionController::with_force(MotionSettings::default(), Box::new(|_: Vec2| {}), bus)
                .unwrap();
        assert_eq!(forced.integration(), IntegrationMode::Force);
        assert_eq!(forced.settings().integration, IntegrationMode::Force);
    }

    #[test]
    fn test_invalid_dt_is_skipped() {
        let bus = EventBus::new();
        let mut motion = controller(&bus);
        publish_move(&bus, SpeedTier::Fast, Vec2::X);

        for dt in [-DT, f32::NAN, f32::INFINITY] {
            assert_eq!(motion.tick(dt), TickOutcome::Idle);
        }
        assert_eq!(motion.body(), Body::default());

        assert!(matches!(motion.tick(DT), TickOutcome::Moved { .. }));
    }
}
