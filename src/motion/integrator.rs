//! Motion integrators: how a resolved speed turns into movement each tick

use glam::Vec2;

use super::{Body, TickOutcome};
use crate::config::IntegrationMode;

/// Opaque receiver of continuous forces (a rigid body in a physics engine)
pub trait PhysicsSink: Send {
    fn apply_force(&mut self, force: Vec2);
}

impl<F> PhysicsSink for F
where
    F: FnMut(Vec2) + Send,
{
    fn apply_force(&mut self, force: Vec2) {
        self(force)
    }
}

/// Advances a body along `dir` at `speed` for one fixed step
pub trait MotionIntegrator: Send {
    fn mode(&self) -> IntegrationMode;

    fn integrate(&mut self, body: &mut Body, dir: Vec2, speed: f32, dt: f32) -> TickOutcome;
}

/// Moves the body directly; speed is a per-second rate
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicIntegrator;

impl MotionIntegrator for KinematicIntegrator {
    fn mode(&self) -> IntegrationMode {
        IntegrationMode::Kinematic
    }

    fn integrate(&mut self, body: &mut Body, dir: Vec2, speed: f32, dt: f32) -> TickOutcome {
        let displacement = dir * speed * dt;
        body.position += displacement;
        TickOutcome::Moved { displacement }
    }
}

/// Hands `dir * speed * scale` to a physics sink every tick.
/// The body position is owned by the sink and left untouched.
pub struct ForceIntegrator {
    sink: Box<dyn PhysicsSink>,
    scale: f32,
}

impl ForceIntegrator {
    pub fn new(sink: Box<dyn PhysicsSink>, scale: f32) -> Self {
        Self { sink, scale }
    }
}

impl MotionIntegrator for ForceIntegrator {
    fn mode(&self) -> IntegrationMode {
        IntegrationMode::Force
    }

    fn integrate(&mut self, _body: &mut Body, dir: Vec2, speed: f32, _dt: f32) -> TickOutcome {
        let force = dir * speed * self.scale;
        self.sink.apply_force(force);
        TickOutcome::Forced { force }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_kinematic_scales_by_dt() {
        let mut body = Body::default();
        let outcome = KinematicIntegrator.integrate(&mut body, Vec2::X, 120.0, 0.5);
        assert_eq!(outcome, TickOutcome::Moved { displacement: Vec2::new(60.0, 0.0) });
        assert_eq!(body.position, Vec2::new(60.0, 0.0));
    }

    #[test]
    fn test_force_reaches_sink_and_leaves_position() {
        let forces = Arc::new(Mutex::new(Vec::new()));
        let f = forces.clone();
        let mut integrator = ForceIntegrator::new(Box::new(move |v: Vec2| f.lock().push(v)), 0.05);

        let mut body = Body::default();
        let outcome = integrator.integrate(&mut body, Vec2::Y, 200.0, 1.0 / 60.0);

        assert_eq!(outcome, TickOutcome::Forced { force: Vec2::new(0.0, 10.0) });
        assert_eq!(*forces.lock(), vec![Vec2::new(0.0, 10.0)]);
        assert_eq!(body.position, Vec2::ZERO);
    }
}
