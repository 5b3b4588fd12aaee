//! Direction policy: optional snapping of the emitted move vector to compass directions

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_SQRT_2, TAU};

/// How many directions the joystick reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionPolicy {
    /// Up, down, left, right
    Four,
    /// The four axes plus the four diagonals
    Eight,
    /// Any angle, no snapping
    #[default]
    All,
}

const FOUR: [Vec2; 4] = [Vec2::X, Vec2::Y, Vec2::NEG_X, Vec2::NEG_Y];

const EIGHT: [Vec2; 8] = [
    Vec2::X,
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::Y,
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::NEG_X,
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::NEG_Y,
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

impl DirectionPolicy {
    /// Snap a unit vector to the nearest allowed direction.
    ///
    /// The zero vector is returned unchanged. Snapped results are exact unit
    /// vectors taken from a fixed table, so magnitude stays 1.
    pub fn snap(self, dir: Vec2) -> Vec2 {
        let table: &[Vec2] = match self {
            DirectionPolicy::All => return dir,
            DirectionPolicy::Four => &FOUR,
            DirectionPolicy::Eight => &EIGHT,
        };

        if dir == Vec2::ZERO {
            return dir;
        }

        let step = TAU / table.len() as f32;
        let angle = dir.y.atan2(dir.x);
        let index = ((angle / step).round() as i32).rem_euclid(table.len() as i32);
        table[index as usize]
    }
}
