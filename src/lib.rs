//! Toroid Snake - A wrap-around snake simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (body, food, hazards, effects, tick)
//! - `engine`: Fixed-timestep clock and control surface for a frame driver
//! - `settings`: Data-driven game balance

pub mod engine;
pub mod settings;
pub mod sim;

pub use engine::{Engine, SimError, Snapshot};
pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest real-time delta accepted from a single frame
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;

    /// Grid movement cadence
    pub const MOVE_INTERVAL_MS: f64 = 150.0;
    /// Grid movement cadence while SpeedBoost is active
    pub const FAST_MOVE_INTERVAL_MS: f64 = 80.0;

    /// Snake defaults
    pub const INITIAL_LENGTH: usize = 12;
    pub const GROWTH_PER_FOOD: usize = 4;
    /// Largest accepted starting length
    pub const MAX_INITIAL_LENGTH: usize = 1 << 16;

    /// Food defaults
    pub const FOOD_COUNT: usize = 8;
    pub const SPECIAL_FOOD_THRESHOLD: u32 = 5;
    pub const SUPER_FOOD_THRESHOLD: u32 = 10;
    pub const PLACEMENT_ATTEMPTS: u32 = 50;

    /// Points per food tier
    pub const NORMAL_POINTS: u64 = 10;
    pub const SPECIAL_POINTS: u64 = 50;
    pub const SUPER_POINTS: u64 = 100;

    /// Super food buff duration (Invincible + SpeedBoost)
    pub const SUPER_EFFECT_MS: f64 = 8000.0;

    /// Knives thrown when a special food is eaten
    pub const KNIVES_PER_SPECIAL: usize = 3;
    /// Knife kinematics, in cells and seconds
    pub const KNIFE_SPEED_MIN: f32 = 25.0 / 6.0;
    pub const KNIFE_SPEED_MAX: f32 = 50.0 / 6.0;
    pub const KNIFE_SPIN_MIN: f32 = 10.0 / 3.0;
    pub const KNIFE_SPIN_MAX: f32 = 20.0 / 3.0;
    pub const KNIFE_LIFETIME_MS: f64 = 15_000.0;
    /// Collision radius in cells
    pub const KNIFE_RADIUS: f32 = 1.2;
    /// Broad-phase search ring around a knife's cell
    pub const BROAD_PHASE_RANGE: i32 = 2;
}

/// Wrap a float coordinate into `[0, extent)`
#[inline]
pub fn wrap_f32(v: f32, extent: f32) -> f32 {
    let w = v.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if w >= extent { 0.0 } else { w }
}

/// Shortest signed offset from `from` to `to` on a torus of the given size
#[inline]
pub fn torus_delta(from: Vec2, to: Vec2, width: f32, height: f32) -> Vec2 {
    let mut d = to - from;
    if d.x > width / 2.0 {
        d.x -= width;
    } else if d.x < -width / 2.0 {
        d.x += width;
    }
    if d.y > height / 2.0 {
        d.y -= height;
    } else if d.y < -height / 2.0 {
        d.y += height;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_f32() {
        assert_eq!(wrap_f32(-0.5, 20.0), 19.5);
        assert_eq!(wrap_f32(20.0, 20.0), 0.0);
        assert_eq!(wrap_f32(3.25, 20.0), 3.25);
    }

    #[test]
    fn test_torus_delta_takes_short_way() {
        let d = torus_delta(Vec2::new(19.5, 0.5), Vec2::new(0.5, 0.5), 20.0, 20.0);
        assert!((d.x - 1.0).abs() < 1e-5);
        assert_eq!(d.y, 0.0);
    }
}
