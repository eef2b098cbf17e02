//! Real-time driver for the simulation
//!
//! A host calls [`Engine::frame`] once per rendered frame with a monotonic
//! timestamp. The engine turns wall time into fixed simulation steps with a
//! capped accumulator, and exposes a read-only [`Snapshot`] plus a queue of
//! [`GameEvent`]s for renderers, audio and UI.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

use crate::settings::{Settings, SettingsError};
use crate::sim::{
    Direction, EffectFlags, Food, GameEvent, GamePhase, GameState, Projectile, Segment, tick,
};

/// Largest accepted board side
pub const MAX_GRID_SIDE: i32 = 4096;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid grid size {width}x{height} (each side must be 1..={MAX_GRID_SIDE})")]
    InvalidGrid { width: i32, height: i32 },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Borrowed view of everything a renderer needs for one frame
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub width: i32,
    pub height: i32,
    /// Head first
    pub body: &'a VecDeque<Segment>,
    pub foods: &'a [Food],
    /// Live knives in spawn order
    pub projectiles: Vec<Projectile>,
    pub score: u64,
    pub max_length: usize,
    /// Fraction of the current move interval elapsed, for interpolation
    pub move_progress: f64,
    pub phase: GamePhase,
    pub flags: EffectFlags,
}

pub struct Engine {
    settings: Settings,
    seed: u64,
    state: Option<GameState>,
    accumulator_ms: f64,
    /// Timestamp of the previous frame; `None` re-anchors on the next frame
    last_frame_ms: Option<f64>,
}

impl Engine {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            settings,
            seed,
            state: None,
            accumulator_ms: 0.0,
            last_frame_ms: None,
        }
    }

    /// Build the board. Calling it again starts over with a fresh world.
    pub fn init(&mut self, width: i32, height: i32) -> Result<(), SimError> {
        check_grid(width, height)?;
        self.settings.validate()?;

        let mut state = GameState::new(self.settings.clone(), self.seed, width, height);
        state.events.push(GameEvent::Initialized { width, height });
        log::info!(
            "Initialized {}x{} board (seed {}, {} food)",
            width,
            height,
            self.seed,
            state.food.foods().len()
        );
        self.state = Some(state);
        self.accumulator_ms = 0.0;
        self.last_frame_ms = None;
        Ok(())
    }

    pub fn phase(&self) -> GamePhase {
        self.state.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Direct access for scripted setups
    pub fn state_mut(&mut self) -> Option<&mut GameState> {
        self.state.as_mut()
    }

    pub fn start(&mut self) -> bool {
        self.transition(GamePhase::Idle, GamePhase::Running, GameEvent::Started)
    }

    pub fn pause(&mut self) -> bool {
        self.transition(GamePhase::Running, GamePhase::Paused, GameEvent::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(GamePhase::Paused, GamePhase::Running, GameEvent::Resumed)
    }

    /// Halt the clock and return to Idle, keeping the world as it is
    pub fn stop(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if !matches!(state.phase, GamePhase::Running | GamePhase::Paused) {
            return false;
        }
        state.phase = GamePhase::Idle;
        state.events.push(GameEvent::Stopped);
        self.last_frame_ms = None;
        log::debug!("Stopped at tick {}", state.time_ticks);
        true
    }

    /// Rebuild the world and go back to Idle. Works from any phase.
    pub fn reset(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        state.reset();
        self.accumulator_ms = 0.0;
        self.last_frame_ms = None;
        log::info!("Reset (best length {})", state.max_length);
        true
    }

    /// Queue a turn. Reversals, diagonals and requests while paused or after
    /// game over are ignored.
    pub fn set_direction(&mut self, dx: i32, dy: i32) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
            return false;
        }
        match Direction::from_delta(dx, dy) {
            Some(dir) => state.body.set_direction(dir),
            None => false,
        }
    }

    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), SimError> {
        check_grid(width, height)?;
        if let Some(state) = self.state.as_mut() {
            state.resize(width, height);
            log::info!("Resized to {}x{}", width, height);
        }
        Ok(())
    }

    /// Feed one frame timestamp. Returns the number of fixed steps taken.
    ///
    /// The first frame after init, start, resume, stop or reset only sets
    /// the reference time.
    pub fn frame(&mut self, timestamp_ms: f64) -> u32 {
        if self.phase() != GamePhase::Running {
            return 0;
        }
        let Some(last) = self.last_frame_ms.replace(timestamp_ms) else {
            return 0;
        };
        self.advance(timestamp_ms - last)
    }

    /// Add real elapsed time and drain it in fixed steps
    pub fn advance(&mut self, delta_ms: f64) -> u32 {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        if state.phase != GamePhase::Running {
            return 0;
        }

        let step = self.settings.fixed_step_ms;
        let delta = if delta_ms.is_finite() {
            delta_ms.clamp(0.0, self.settings.max_frame_delta_ms)
        } else {
            0.0
        };
        self.accumulator_ms += delta;

        // Fixed timestep simulation
        let mut substeps = 0;
        while self.accumulator_ms >= step && substeps < self.settings.max_substeps {
            tick(state, step);
            self.accumulator_ms -= step;
            substeps += 1;

            if state.phase != GamePhase::Running {
                self.accumulator_ms = 0.0;
                self.last_frame_ms = None;
                return substeps;
            }
        }

        // Spiral of death guard: drop whatever the cap left behind
        if self.accumulator_ms >= step {
            log::debug!(
                "Dropping {:.1}ms of simulation backlog",
                self.accumulator_ms - self.accumulator_ms % step
            );
            self.accumulator_ms %= step;
        }
        substeps
    }

    /// Take every notification produced since the last call, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state
            .as_mut()
            .map(|s| std::mem::take(&mut s.events))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<Snapshot<'_>> {
        let state = self.state.as_ref()?;
        Some(Snapshot {
            width: state.width,
            height: state.height,
            body: state.body.segments(),
            foods: state.food.foods(),
            projectiles: state.knives.iter().copied().collect(),
            score: state.score,
            max_length: state.max_length,
            move_progress: state.move_progress(),
            phase: state.phase,
            flags: state.flags(),
        })
    }

    fn transition(&mut self, from: GamePhase, to: GamePhase, event: GameEvent) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.phase != from {
            return false;
        }
        log::debug!("{:?} -> {:?}", from, to);
        state.phase = to;
        state.events.push(event);
        // Re-anchor so time spent outside Running is not replayed
        self.last_frame_ms = None;
        true
    }
}

fn check_grid(width: i32, height: i32) -> Result<(), SimError> {
    if (1..=MAX_GRID_SIDE).contains(&width) && (1..=MAX_GRID_SIDE).contains(&height) {
        Ok(())
    } else {
        Err(SimError::InvalidGrid { width, height })
    }
}
