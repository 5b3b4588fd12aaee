//! VJoy Motion - on-screen virtual joystick and the motion controller it drives
//!
//! Touch input goes into a [`JoystickController`], which publishes
//! [`MovementEvent`]s on an [`EventBus`]. Any number of consumers, such as a
//! [`MotionController`], subscribe to the bus and integrate motion once per
//! fixed simulation tick. A [`ModeSwitch`] lets UI code flip the joystick
//! between fixed and follow mode at runtime.
//!
//! ```
//! use glam::Vec2;
//! use vjoy_motion::{
//!     EventBus, JoystickConfig, JoystickController, JoystickVisual, MotionController,
//!     config::MotionSettings,
//! };
//!
//! let bus = EventBus::new();
//! let joystick = JoystickController::new(
//!     JoystickConfig::default(),
//!     Some(JoystickVisual::new(Vec2::ZERO)),
//!     bus.clone(),
//! );
//! let mut motion = MotionController::kinematic(MotionSettings::default(), bus).unwrap();
//!
//! joystick.touch_start(Vec2::new(10.0, 0.0));
//! joystick.touch_move(Vec2::new(20.0, 0.0));
//! motion.tick(1.0 / 60.0);
//! assert!(motion.body().position.x > 0.0);
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod joystick;
pub mod mode_switch;
pub mod motion;
pub mod sim;

pub use bus::{BusEvent, EventBus, SubscriptionId, Topic};
pub use config::AppConfig;
pub use error::ConfigError;
pub use joystick::{
    DirectionPolicy, JoystickConfig, JoystickController, JoystickVisual, Mode, MovementEvent,
    SpeedTier, TouchInput,
};
pub use mode_switch::ModeSwitch;
pub use motion::{Body, MotionController, MotionState, PhysicsSink, TickOutcome};
pub use sim::{SimReport, Simulation, TouchScript};
