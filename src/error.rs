//! Error definitions for joystick and motion configuration

use thiserror::Error;

/// Configuration rejected at setup time
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Ring radius must be strictly positive and finite
    #[error("joystick radius must be > 0 (got {0})")]
    InvalidRadius(f32),

    /// A speed tier mapped to a negative or non-finite magnitude
    #[error("{tier} speed must be a finite, non-negative number (got {value})")]
    InvalidSpeed { tier: &'static str, value: f32 },

    /// Force conversion factor must be finite and non-negative
    #[error("force_scale must be a finite, non-negative number (got {0})")]
    InvalidForceScale(f32),

    /// Initial facing direction cannot be the zero vector
    #[error("initial_dir must be a non-zero vector")]
    ZeroInitialDirection,

    /// Simulation tick rate must be > 0
    #[error("tick_hz must be > 0 (got {0})")]
    InvalidTickRate(u32),
}
