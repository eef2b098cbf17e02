//! Fixed timestep simulation tick
//!
//! Two clocks run here: every tick advances effects and knives by the fixed
//! step, while the snake only moves a cell once the move timer reaches the
//! current move interval.

use super::effects::EffectKind;
use super::food::FoodKind;
use super::state::{GameEvent, GameOverCause, GamePhase, GameState};

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, dt_ms: f64) {
    // Don't tick unless running
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;
    state.clock_ms += dt_ms;

    // Effects first so this step's cadence and immunity are current
    state.effects.update(state.clock_ms, &mut state.events);
    let flags = state.effects.flags();
    state.move_interval_ms = if flags.speed_boost() {
        state.settings.fast_move_interval_ms
    } else {
        state.settings.move_interval_ms
    };

    let report = state
        .knives
        .update(dt_ms, &mut state.body, flags.invincible(), &mut state.events);
    if report.lethal {
        game_over(state, GameOverCause::KnifeToHead);
        return;
    }

    state.move_timer_ms += dt_ms;
    if state.move_timer_ms >= state.move_interval_ms {
        state.move_timer_ms -= state.move_interval_ms;
        if !move_snake(state) {
            return;
        }
    }

    // Retry anything the last placement had to defer
    state
        .food
        .replenish(&state.body, &mut state.rng, &mut state.events);
}

/// One grid move plus its side effects. Returns false if the run ended.
fn move_snake(state: &mut GameState) -> bool {
    let outcome = state.body.step(&mut state.food);

    if let Some(kind) = outcome.eaten {
        state.score += outcome.score_gain;
        state.max_length = state.max_length.max(state.body.len());
        state.events.push(GameEvent::FoodEaten { kind });
        state.events.push(GameEvent::ScoreChanged {
            score: state.score,
            max_length: state.max_length,
            food: kind,
        });

        match kind {
            FoodKind::Normal => {}
            FoodKind::Special => {
                state.events.push(GameEvent::SpecialTriggered);
                let count = state.settings.knives_per_special;
                state
                    .knives
                    .spawn(count, state.width, state.height, &mut state.rng);
            }
            FoodKind::Super => {
                state.events.push(GameEvent::SuperTriggered);
                let duration = state.settings.super_effect_ms;
                state
                    .effects
                    .add_effect(EffectKind::Invincible, duration, &mut state.events);
                state
                    .effects
                    .add_effect(EffectKind::SpeedBoost, duration, &mut state.events);
                log::info!("Super food: invincible + speed boost for {:.0}ms", duration);
            }
        }
    }

    if state.body.check_self_collision() && !state.effects.flags().invincible() {
        game_over(state, GameOverCause::SelfCollision);
        return false;
    }
    true
}

fn game_over(state: &mut GameState, cause: GameOverCause) {
    state.phase = GamePhase::GameOver;
    log::info!(
        "Game over ({:?}): score {}, best length {}",
        cause,
        state.score,
        state.max_length
    );
    state.events.push(GameEvent::GameOver {
        score: state.score,
        max_length: state.max_length,
        cause,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::sim::body::{Body, Segment};
    use crate::sim::food::Food;
    use crate::sim::grid::{Direction, GridPos};
    use glam::Vec2;

    /// A running 20x20 board with no random food and no knives
    fn quiet_state() -> GameState {
        let settings = Settings {
            food_count: 0,
            ..Settings::default()
        };
        let mut state = GameState::new(settings, 1234, 20, 20);
        state.phase = GamePhase::Running;
        state
    }

    /// Tick until exactly one more grid move has happened
    fn run_one_move(state: &mut GameState) {
        let head = state.body.head().map(|s| s.pos);
        while state.phase == GamePhase::Running && state.body.head().map(|s| s.pos) == head {
            tick(state, SIM_DT_MS);
        }
    }

    fn place_ahead(state: &mut GameState, kind: FoodKind) {
        let head = state.body.head().map(|s| s.pos).expect("head");
        let ahead = head.step(state.body.next_direction(), state.width, state.height);
        assert!(state.food.place(Food::new(ahead, kind), &state.body));
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut state = quiet_state();
        state.phase = GamePhase::Idle;
        tick(&mut state, SIM_DT_MS);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_move_cadence() {
        let mut state = quiet_state();
        // 150ms interval: 8 ticks of 16.67ms = 133ms, 9 ticks = 150ms
        for _ in 0..8 {
            tick(&mut state, SIM_DT_MS);
        }
        assert_eq!(state.body.head().map(|s| s.pos), Some(GridPos::new(10, 10)));
        tick(&mut state, SIM_DT_MS + 0.001);
        assert_eq!(state.body.head().map(|s| s.pos), Some(GridPos::new(11, 10)));
        assert!(state.move_progress() < 0.01);
    }

    #[test]
    fn test_end_to_end_normal_then_special() {
        let mut state = quiet_state();
        assert_eq!(state.body.len(), 12);

        place_ahead(&mut state, FoodKind::Normal);
        run_one_move(&mut state);
        assert_eq!(state.body.len(), 16);
        assert_eq!(state.score, NORMAL_POINTS);
        assert!(state.events.contains(&GameEvent::ScoreChanged {
            score: NORMAL_POINTS,
            max_length: 16,
            food: FoodKind::Normal,
        }));

        for _ in 0..4 {
            assert_eq!(state.food.count(FoodKind::Special), 0);
            place_ahead(&mut state, FoodKind::Normal);
            run_one_move(&mut state);
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 5 * NORMAL_POINTS);

        // The spawn cycle at the end of the fifth eating tick placed one special
        assert_eq!(state.food.count(FoodKind::Special), 1);
        assert_eq!(state.food.special_progress(), 0);
        let special = state.food.foods()[0];
        for seg in state.body.segments() {
            assert!(!special.footprint().contains(seg.pos, 20, 20));
        }
    }

    #[test]
    fn test_special_food_throws_knives() {
        let mut state = quiet_state();
        place_ahead(&mut state, FoodKind::Special);
        run_one_move(&mut state);
        assert_eq!(state.score, SPECIAL_POINTS);
        assert_eq!(state.knives.active_count(), KNIVES_PER_SPECIAL);
        assert!(state.events.contains(&GameEvent::SpecialTriggered));
    }

    #[test]
    fn test_super_food_buffs_and_speeds_up() {
        let mut state = quiet_state();
        // Turn up from (10,10); the next head (10,9) must land in the inner
        // 2x2 of the 3x3 footprint, which then sits clear of row 10
        assert!(state.body.set_direction(Direction::Up));
        assert!(state.food.place(Food::new(GridPos::new(9, 7), FoodKind::Super), &state.body));
        run_one_move(&mut state);

        assert_eq!(state.body.head().map(|s| s.pos), Some(GridPos::new(10, 9)));
        assert_eq!(state.score, SUPER_POINTS);
        assert!(state.flags().invincible());
        assert!(state.flags().speed_boost());
        assert!(state.events.contains(&GameEvent::SuperTriggered));

        tick(&mut state, SIM_DT_MS);
        assert_eq!(state.move_interval_ms, FAST_MOVE_INTERVAL_MS);

        // Straight up a 20-cell column with 16 segments never self-collides;
        // the buffs wear off after the effect duration
        let ticks = (SUPER_EFFECT_MS / SIM_DT_MS) as usize + 2;
        for _ in 0..ticks {
            tick(&mut state, SIM_DT_MS);
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.flags().is_empty());
        assert_eq!(state.move_interval_ms, MOVE_INTERVAL_MS);
        assert!(state.events.contains(&GameEvent::EffectEnded {
            effect: EffectKind::SpeedBoost
        }));
    }

    #[test]
    fn test_knife_to_head_ends_run() {
        let mut state = quiet_state();
        let head = state.body.head().map(|s| s.pos).expect("head");
        state
            .knives
            .spawn_at(Vec2::new(head.x as f32 + 0.5, head.y as f32 + 0.5), Vec2::ZERO);
        tick(&mut state, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(matches!(
            state.events.last(),
            Some(GameEvent::GameOver {
                cause: GameOverCause::KnifeToHead,
                ..
            })
        ));

        // Terminal: further ticks do nothing
        let ticks = state.time_ticks;
        tick(&mut state, SIM_DT_MS);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_invincible_head_hit_is_absorbed() {
        let mut state = quiet_state();
        state
            .effects
            .add_effect(EffectKind::Invincible, 1000.0, &mut state.events);
        let head = state.body.head().map(|s| s.pos).expect("head");
        state
            .knives
            .spawn_at(Vec2::new(head.x as f32 + 0.5, head.y as f32 + 0.5), Vec2::ZERO);
        tick(&mut state, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.knives.active_count(), 0);
        assert_eq!(state.body.len(), 12);
    }

    #[test]
    fn test_self_collision_ends_run() {
        let mut state = quiet_state();
        // A tight hook: moving up from (5,6) lands on segment 3 at (5,5)
        let segments = [(5, 6), (6, 6), (6, 5), (5, 5), (4, 5)]
            .into_iter()
            .map(|(x, y)| Segment {
                pos: GridPos::new(x, y),
                dir: Direction::Left,
            })
            .collect();
        state.body = Body::from_segments(20, 20, segments, 4, true);
        assert!(state.body.set_direction(Direction::Up));
        run_one_move(&mut state);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(matches!(
            state.events.last(),
            Some(GameEvent::GameOver {
                cause: GameOverCause::SelfCollision,
                ..
            })
        ));
    }
}
