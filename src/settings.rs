//! Game balance and clock settings
//!
//! Defaults live in [`crate::consts`]; a JSON file can override any subset.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunable parameters of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Clock ===
    /// Fixed logic step (ms)
    pub fixed_step_ms: f64,
    /// Logic steps drained per frame at most
    pub max_substeps: u32,
    /// Frame deltas are clamped to this (ms)
    pub max_frame_delta_ms: f64,

    // === Movement ===
    /// Grid move cadence (ms)
    pub move_interval_ms: f64,
    /// Grid move cadence under SpeedBoost (ms)
    pub fast_move_interval_ms: f64,
    pub initial_length: usize,
    /// Segments added per food eaten
    pub growth: usize,
    /// Maintain the cell → segment index (disable to use linear scans)
    pub spatial_index: bool,

    // === Food ===
    /// Normal foods kept on the board
    pub food_count: usize,
    pub special_threshold: u32,
    pub super_threshold: u32,
    /// Rejection-sampling tries per placement
    pub placement_attempts: u32,
    /// Invincible + SpeedBoost duration from a super food (ms)
    pub super_effect_ms: f64,

    // === Knives ===
    pub knives_per_special: usize,
    /// Speed range (cells/s)
    pub knife_speed_min: f32,
    pub knife_speed_max: f32,
    /// Spin range (rad/s)
    pub knife_spin_min: f32,
    pub knife_spin_max: f32,
    pub knife_lifetime_ms: f64,
    /// Collision radius (cells)
    pub knife_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fixed_step_ms: SIM_DT_MS,
            max_substeps: MAX_SUBSTEPS,
            max_frame_delta_ms: MAX_FRAME_DELTA_MS,

            move_interval_ms: MOVE_INTERVAL_MS,
            fast_move_interval_ms: FAST_MOVE_INTERVAL_MS,
            initial_length: INITIAL_LENGTH,
            growth: GROWTH_PER_FOOD,
            spatial_index: true,

            food_count: FOOD_COUNT,
            special_threshold: SPECIAL_FOOD_THRESHOLD,
            super_threshold: SUPER_FOOD_THRESHOLD,
            placement_attempts: PLACEMENT_ATTEMPTS,
            super_effect_ms: SUPER_EFFECT_MS,

            knives_per_special: KNIVES_PER_SPECIAL,
            knife_speed_min: KNIFE_SPEED_MIN,
            knife_speed_max: KNIFE_SPEED_MAX,
            knife_spin_min: KNIFE_SPIN_MIN,
            knife_spin_max: KNIFE_SPIN_MAX,
            knife_lifetime_ms: KNIFE_LIFETIME_MS,
            knife_radius: KNIFE_RADIUS,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), SettingsError> {
            Err(SettingsError::Invalid { field, reason })
        }

        // Written as `!(ok)` so NaN fails every check
        if !(self.fixed_step_ms.is_finite() && self.fixed_step_ms > 0.0) {
            return invalid("fixed_step_ms", "must be positive and finite");
        }
        if self.max_substeps == 0 {
            return invalid("max_substeps", "must be at least 1");
        }
        if !(self.max_frame_delta_ms.is_finite() && self.max_frame_delta_ms >= self.fixed_step_ms) {
            return invalid("max_frame_delta_ms", "must be finite and at least one fixed step");
        }
        if !(self.move_interval_ms.is_finite() && self.move_interval_ms > 0.0) {
            return invalid("move_interval_ms", "must be positive and finite");
        }
        if !(self.fast_move_interval_ms.is_finite() && self.fast_move_interval_ms > 0.0) {
            return invalid("fast_move_interval_ms", "must be positive and finite");
        }
        if !(1..=MAX_INITIAL_LENGTH).contains(&self.initial_length) {
            return invalid("initial_length", "must be within 1..=65536");
        }
        if self.special_threshold == 0 {
            return invalid("special_threshold", "must be at least 1");
        }
        if self.super_threshold == 0 {
            return invalid("super_threshold", "must be at least 1");
        }
        if self.placement_attempts == 0 {
            return invalid("placement_attempts", "must be at least 1");
        }
        if !(self.super_effect_ms.is_finite() && self.super_effect_ms >= 0.0) {
            return invalid("super_effect_ms", "must be finite and not negative");
        }
        if !(self.knife_speed_max.is_finite()
            && self.knife_speed_min >= 0.0
            && self.knife_speed_min <= self.knife_speed_max)
        {
            return invalid("knife_speed_min", "must be within 0..=knife_speed_max");
        }
        if !(self.knife_spin_min.is_finite()
            && self.knife_spin_max.is_finite()
            && self.knife_spin_min <= self.knife_spin_max)
        {
            return invalid("knife_spin_min", "must not exceed knife_spin_max");
        }
        if !(self.knife_lifetime_ms.is_finite() && self.knife_lifetime_ms > 0.0) {
            return invalid("knife_lifetime_ms", "must be positive and finite");
        }
        if !(self.knife_radius.is_finite() && self.knife_radius > 0.0) {
            return invalid("knife_radius", "must be positive and finite");
        }
        Ok(())
    }
}
