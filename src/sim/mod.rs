//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (knives in spawn order, food in placement order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod effects;
pub mod food;
pub mod grid;
pub mod projectile;
pub mod state;
pub mod tick;

pub use body::{Body, MoveOutcome, OccupancyGrid, Segment};
pub use collision::{HitResult, find_hit};
pub use effects::{EffectFlags, EffectKind, EffectTimer};
pub use food::{Food, FoodKind, FoodSpawner, HitWindow};
pub use grid::{CellRect, Direction, GridPos};
pub use projectile::{HazardReport, Projectile, ProjectileSystem, Side};
pub use state::{GameEvent, GameOverCause, GamePhase, GameState};
pub use tick::tick;
