//! Scripted touch replay
//!
//! Wires one bus, a joystick, a mode switch and a motion controller together
//! and drives them from a [`TouchScript`] at a fixed tick rate.

use anyhow::{Context, Result};
use glam::Vec2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::bus::{EventBus, SubscriptionId, Topic};
use crate::config::{AppConfig, IntegrationMode};
use crate::joystick::{JoystickConfig, JoystickController, JoystickVisual, Mode, TouchInput};
use crate::mode_switch::ModeSwitch;
use crate::motion::{Body, MotionController, MotionState, TickOutcome};

/// One script step: wait, then optionally switch mode and/or deliver a touch
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub wait_ticks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch: Option<TouchInput>,
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TouchScript {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl TouchScript {
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read script file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid script file: {}", path))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse YAML script")
    }

    pub fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|s| s.wait_ticks as u64).sum()
    }
}

/// Counts bus traffic per topic for the report
struct EventCounter {
    bus: EventBus,
    counts: Arc<Mutex<HashMap<Topic, usize>>>,
    subscriptions: Vec<(Topic, SubscriptionId)>,
}

impl EventCounter {
    fn attach(bus: EventBus) -> Self {
        let counts = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions = Topic::all()
            .iter()
            .map(|&topic| {
                let c = counts.clone();
                let id = bus.subscribe(topic, move |event| {
                    *c.lock().entry(event.topic()).or_insert(0) += 1;
                });
                (topic, id)
            })
            .collect();

        Self {
            bus,
            counts,
            subscriptions,
        }
    }

    fn snapshot(&self) -> BTreeMap<String, usize> {
        self.counts
            .lock()
            .iter()
            .map(|(topic, n)| (topic.to_string(), *n))
            .collect()
    }
}

impl Drop for EventCounter {
    fn drop(&mut self) {
        for (topic, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(topic, id);
        }
    }
}

/// Forces received in force mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ForceLog {
    pub applied: u64,
    pub total: Vec2,
}

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimReport {
    pub ticks: u64,
    pub duration_secs: f32,
    /// Bus events seen, keyed by topic name
    pub events: BTreeMap<String, usize>,
    pub body: Body,
    pub motion: MotionState,
    /// `None` when the joystick had no anchors
    pub joystick_mode: Option<Mode>,
    pub forces: ForceLog,
}

pub struct Simulation {
    joystick: JoystickController,
    mode_switch: ModeSwitch,
    motion: MotionController,
    counter: EventCounter,
    forces: Arc<Mutex<ForceLog>>,
    dt: f32,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let bus = EventBus::new();

        let joystick_config =
            JoystickConfig::try_from(&config.joystick).context("Invalid joystick section")?;
        let visual = config.joystick.ring_anchor.map(JoystickVisual::new);
        let joystick = JoystickController::new(joystick_config, visual, bus.clone());

        let forces = Arc::new(Mutex::new(ForceLog::default()));
        let motion = match config.motion.integration {
            IntegrationMode::Kinematic => {
                MotionController::kinematic(config.motion.clone(), bus.clone())
            }
            IntegrationMode::Force => {
                let log = forces.clone();
                let sink = move |force: Vec2| {
                    let mut log = log.lock();
                    log.applied += 1;
                    log.total += force;
                };
                MotionController::with_force(config.motion.clone(), Box::new(sink), bus.clone())
            }
        }
        .context("Invalid motion section")?;

        info!(
            "Simulation ready: {:?} joystick, {:?} integration, {} Hz",
            joystick_config.mode(),
            config.motion.integration,
            config.simulation.tick_hz
        );

        Ok(Self {
            joystick,
            mode_switch: ModeSwitch::new(bus.clone()),
            motion,
            counter: EventCounter::attach(bus),
            forces,
            dt: config.simulation.tick_duration(),
            ticks: 0,
        })
    }

    pub fn tick_duration(&self) -> f32 {
        self.dt
    }

    pub fn joystick(&self) -> &JoystickController {
        &self.joystick
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    /// Advance the motion controller one fixed step
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        self.motion.tick(self.dt)
    }

    /// Apply the mode change and touch of a step (its wait is the caller's job)
    pub fn perform(&mut self, step: &ScriptStep) {
        if let Some(mode) = step.mode {
            self.mode_switch.set(mode);
        }
        if let Some(touch) = step.touch {
            let emitted = self.joystick.handle(touch);
            debug!("Tick {}: {:?} -> {:?}", self.ticks, touch, emitted);
        }
    }

    /// Replay a whole script without pacing
    pub fn run(&mut self, script: &TouchScript) -> SimReport {
        for step in &script.steps {
            for _ in 0..step.wait_ticks {
                self.tick();
            }
            self.perform(step);
        }
        self.report()
    }

    pub fn report(&self) -> SimReport {
        SimReport {
            ticks: self.ticks,
            duration_secs: self.ticks as f32 * self.dt,
            events: self.counter.snapshot(),
            body: self.motion.body(),
            motion: self.motion.state(),
            joystick_mode: self.joystick.mode(),
            forces: *self.forces.lock(),
        }
    }
}
