//! Toroid Snake - headless runner
//!
//! Drives the engine with synthetic frame timestamps and a greedy autopilot,
//! logging every game event. Useful for soak runs and for checking that a
//! settings file plays sensibly.

use std::path::PathBuf;

use clap::Parser;

use toroid_snake::sim::{Direction, GameEvent, GamePhase, GameState};
use toroid_snake::{Engine, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RNG seed for the run
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Board width in cells
    #[arg(long, default_value_t = 40)]
    width: i32,

    /// Board height in cells
    #[arg(long, default_value_t = 30)]
    height: i32,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 3600)]
    frames: u32,

    /// Simulated time between frames
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f64,

    /// JSON settings file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Keep playing after a game over
    #[arg(long)]
    restart: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut engine = Engine::new(settings, args.seed);
    engine.init(args.width, args.height)?;
    engine.start();
    log::info!(
        "Toroid Snake running {} frames at {:.2}ms",
        args.frames,
        args.frame_ms
    );

    let mut runs = 1;
    for frame in 0..args.frames {
        if let Some((dx, dy)) = engine.state().and_then(autopilot) {
            engine.set_direction(dx, dy);
        }
        engine.frame(f64::from(frame) * args.frame_ms);

        for event in engine.drain_events() {
            report(&event);
        }

        if engine.phase() == GamePhase::GameOver {
            if !args.restart {
                break;
            }
            engine.reset();
            engine.start();
            runs += 1;
        }
    }

    let snapshot = engine
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("engine was never initialized"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!(
            "runs: {}  phase: {:?}  score: {}  length: {}  best: {}  knives: {}",
            runs,
            snapshot.phase,
            snapshot.score,
            snapshot.body.len(),
            snapshot.max_length,
            snapshot.projectiles.len()
        );
    }
    Ok(())
}

fn report(event: &GameEvent) {
    match event {
        GameEvent::GameOver { .. } | GameEvent::SuperTriggered | GameEvent::SpecialTriggered => {
            log::info!("{:?}", event)
        }
        GameEvent::BodyTruncated { at, remaining } => {
            log::warn!("Knife cut the body at {} ({} left)", at, remaining)
        }
        _ => log::debug!("{:?}", event),
    }
}

/// Greedy steering toward the closest food that avoids turning into the body
fn autopilot(state: &GameState) -> Option<(i32, i32)> {
    let head = state.body.head()?.pos;
    let (w, h) = (state.width, state.height);
    let target = state
        .food
        .foods()
        .iter()
        .map(|f| f.pos)
        .min_by_key(|&p| {
            let (dx, dy) = p.torus_distance(head, w, h);
            dx + dy
        })?;

    let (fx, fy) = target.forward_from(head, w, h);
    let dx = if fx <= w / 2 { fx } else { fx - w };
    let dy = if fy <= h / 2 { fy } else { fy - h };

    let current = state.body.next_direction();
    let mut wanted = Vec::with_capacity(4);
    if dx != 0 {
        wanted.push(if dx > 0 { Direction::Right } else { Direction::Left });
    }
    if dy != 0 {
        wanted.push(if dy > 0 { Direction::Down } else { Direction::Up });
    }
    // Fall back to any safe sideways turn
    if current.is_horizontal() {
        wanted.extend([Direction::Up, Direction::Down]);
    } else {
        wanted.extend([Direction::Left, Direction::Right]);
    }

    let clear = |dir: Direction| !state.body.occupied(head.step(dir, w, h));
    if wanted.first() == Some(&current) && clear(current) {
        return None;
    }
    wanted
        .into_iter()
        .filter(|&dir| dir.crosses(current))
        .find(|&dir| clear(dir))
        .map(Direction::delta)
}
