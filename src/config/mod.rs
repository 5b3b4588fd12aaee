//! Configuration management for the joystick simulator
//!
//! Handles loading, saving, and validation of YAML configuration files.
//! Every field has a default, so an empty document is a valid configuration.

use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConfigError;
use crate::joystick::{DirectionPolicy, JoystickConfig, Mode, SpeedTier};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub joystick: JoystickSettings,
    #[serde(default)]
    pub motion: MotionSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
}

/// Joystick configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JoystickSettings {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub direction: DirectionPolicy,
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Home position of the ring; `null` leaves the joystick without anchors
    #[serde(default = "default_ring_anchor")]
    pub ring_anchor: Option<Vec2>,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            direction: DirectionPolicy::default(),
            radius: default_radius(),
            ring_anchor: default_ring_anchor(),
        }
    }
}

/// How the motion controller turns speed into movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMode {
    /// Displace the body directly, speed in units per second
    #[default]
    Kinematic,
    /// Push a force into an external physics sink
    Force,
}

/// Motion controller configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MotionSettings {
    #[serde(default)]
    pub stop_speed: f32,
    #[serde(default = "default_normal_speed")]
    pub normal_speed: f32,
    #[serde(default = "default_fast_speed")]
    pub fast_speed: f32,
    #[serde(default)]
    pub integration: IntegrationMode,
    /// Force applied per unit of speed in force mode
    #[serde(default = "default_force_scale")]
    pub force_scale: f32,
    /// Added to the raw direction angle to get the body's facing angle
    #[serde(default = "default_facing_offset")]
    pub facing_offset_deg: f32,
    /// Direction used before the first move event
    #[serde(default = "default_initial_dir")]
    pub initial_dir: Vec2,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            stop_speed: 0.0,
            normal_speed: default_normal_speed(),
            fast_speed: default_fast_speed(),
            integration: IntegrationMode::default(),
            force_scale: default_force_scale(),
            facing_offset_deg: default_facing_offset(),
            initial_dir: default_initial_dir(),
        }
    }
}

impl MotionSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tiers = [
            ("stop", self.stop_speed),
            ("normal", self.normal_speed),
            ("fast", self.fast_speed),
        ];
        for (tier, value) in tiers {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidSpeed { tier, value });
            }
        }

        if !(self.force_scale.is_finite() && self.force_scale >= 0.0) {
            return Err(ConfigError::InvalidForceScale(self.force_scale));
        }

        if self.initial_dir.try_normalize().is_none() {
            return Err(ConfigError::ZeroInitialDirection);
        }

        Ok(())
    }

    /// Speed magnitude for a tier
    pub fn speed_for(&self, tier: SpeedTier) -> f32 {
        match tier {
            SpeedTier::Stop => self.stop_speed,
            SpeedTier::Normal => self.normal_speed,
            SpeedTier::Fast => self.fast_speed,
        }
    }
}

/// Simulation loop configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationSettings {
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
        }
    }
}

impl SimulationSettings {
    /// Duration of one fixed step in seconds
    pub fn tick_duration(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        JoystickConfig::try_from(&self.joystick).context("Invalid joystick section")?;
        self.motion.validate().context("Invalid motion section")?;

        if self.simulation.tick_hz == 0 {
            return Err(anyhow::Error::new(ConfigError::InvalidTickRate(0))
                .context("Invalid simulation section"));
        }

        Ok(())
    }
}

// Default value functions
fn default_radius() -> f32 { 50.0 }
fn default_ring_anchor() -> Option<Vec2> { Some(Vec2::new(120.0, 120.0)) }
fn default_normal_speed() -> f32 { 100.0 }
fn default_fast_speed() -> f32 { 200.0 }
fn default_force_scale() -> f32 { 1.0 / 20.0 }
fn default_facing_offset() -> f32 { -90.0 }
fn default_initial_dir() -> Vec2 { Vec2::Y }
fn default_tick_hz() -> u32 { 60 }
