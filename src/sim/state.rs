//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in [`GameState`]; the engine only
//! adds the real-time clock on top.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::effects::{EffectFlags, EffectKind, EffectTimer};
use super::food::{FoodKind, FoodSpawner};
use super::grid::GridPos;
use super::projectile::ProjectileSystem;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Board set up, clock not running
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Clock suspended, accumulator kept
    Paused,
    /// Run ended; only a reset leaves this phase
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    KnifeToHead,
    SelfCollision,
}

/// Outbound notifications for renderers, audio and UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Initialized { width: i32, height: i32 },
    Started,
    Paused,
    Resumed,
    Stopped,
    ScoreChanged {
        score: u64,
        max_length: usize,
        food: FoodKind,
    },
    FoodEaten { kind: FoodKind },
    /// A special food was eaten and knives are incoming
    SpecialTriggered,
    /// A super food was eaten and the buffs are on
    SuperTriggered,
    /// A bonus-tier food appeared on the board
    FoodPlaced { kind: FoodKind, pos: GridPos },
    BodyTruncated { at: usize, remaining: usize },
    EffectStarted { effect: EffectKind, duration_ms: f64 },
    EffectEnded { effect: EffectKind },
    FlagsChanged { flags: EffectFlags },
    GameOver {
        score: u64,
        max_length: usize,
        cause: GameOverCause,
    },
    Resized { width: i32, height: i32 },
    Reset { score: u64, max_length: usize },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    pub width: i32,
    pub height: i32,
    pub phase: GamePhase,
    pub score: u64,
    /// Longest the body has ever been (kept across resets)
    pub max_length: usize,
    /// Simulation time, advanced by fixed steps only
    pub clock_ms: f64,
    /// Fixed steps taken since the last reset
    pub time_ticks: u64,
    /// Time accumulated toward the next grid move
    pub move_timer_ms: f64,
    /// Current grid move cadence
    pub move_interval_ms: f64,
    pub body: Body,
    pub food: FoodSpawner,
    pub knives: ProjectileSystem,
    pub effects: EffectTimer,
    /// Notifications not yet handed to the engine
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle board with food already placed
    pub fn new(settings: Settings, seed: u64, width: i32, height: i32) -> Self {
        let body = Body::new(
            width,
            height,
            settings.initial_length,
            settings.growth,
            settings.spatial_index,
        );
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            width,
            height,
            phase: GamePhase::Idle,
            score: 0,
            max_length: body.len(),
            clock_ms: 0.0,
            time_ticks: 0,
            move_timer_ms: 0.0,
            move_interval_ms: settings.move_interval_ms,
            body,
            food: FoodSpawner::new(&settings),
            knives: ProjectileSystem::new(&settings),
            effects: EffectTimer::new(),
            events: Vec::new(),
            settings,
        };
        state.food.replenish(&state.body, &mut state.rng, &mut state.events);
        state
    }

    /// Fresh body, food and knives; score back to zero. The best length and
    /// the RNG stream carry over.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.score = 0;
        self.clock_ms = 0.0;
        self.time_ticks = 0;
        self.move_timer_ms = 0.0;
        self.move_interval_ms = self.settings.move_interval_ms;
        self.body = Body::new(
            self.width,
            self.height,
            self.settings.initial_length,
            self.settings.growth,
            self.settings.spatial_index,
        );
        self.max_length = self.max_length.max(self.body.len());
        self.food.reset();
        self.knives.reset();
        self.effects.clear();
        self.food.replenish(&self.body, &mut self.rng, &mut self.events);
        self.events.push(GameEvent::Reset {
            score: self.score,
            max_length: self.max_length,
        });
    }

    /// Move everything onto a board of a new size
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.body.resize(width, height);
        self.food.retain_fitting(&self.body);
        self.knives.rewrap(width, height);
        self.food.replenish(&self.body, &mut self.rng, &mut self.events);
        self.events.push(GameEvent::Resized { width, height });
    }

    /// Fraction of the current move interval already elapsed, in `[0, 1]`
    pub fn move_progress(&self) -> f64 {
        (self.move_timer_ms / self.move_interval_ms).clamp(0.0, 1.0)
    }

    pub fn flags(&self) -> EffectFlags {
        self.effects.flags()
    }
}
