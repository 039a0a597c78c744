//! Slope Rider headless runner
//!
//! Drives the simulation with a simple autopilot and prints the final result.
//!
//! Usage: `slope-rider [seed] [tuning.json]`

use anyhow::{Context, Result};

use slope_rider::consts::*;
use slope_rider::sim::{Character, GameEvent, TickInput, World, tick};
use slope_rider::{Tuning, wrapped_delta};

/// Give up on runs that never crash
const MAX_RUN_SECONDS: f32 = 600.0;

/// Host frame times cycled through to exercise the accumulator (seconds)
const FRAME_TIMES: [f32; 4] = [1.0 / 60.0, 1.0 / 144.0, 1.0 / 30.0, 0.25];

/// Stop spinning when the feet are this close to the ground
const SETTLE_HEIGHT: f32 = 140.0;

/// Jump, spin forward while high, straighten up to the slope near the ground
fn autopilot(world: &World) -> TickInput {
    let player = &world.player;
    let s = &player.state;
    if s.grounded {
        // Let the landing settle before the next jump
        let ready = world.time_ticks % 90 == 0;
        return TickInput {
            jump: ready,
            ..Default::default()
        };
    }

    let x = s.pos.x;
    let height = world.terrain.height_at(x) - player.bottom();
    if height > SETTLE_HEIGHT || s.vel.y < 0.0 {
        return TickInput {
            rotate_forward: true,
            ..Default::default()
        };
    }

    let error = wrapped_delta(s.orientation, world.terrain.slope_angle_at(x));
    TickInput {
        rotate_forward: error > 5.0,
        rotate_backward: error < -5.0,
        ..Default::default()
    }
}

struct Runner {
    world: World,
    accumulator: f32,
}

impl Runner {
    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            // Fresh input every tick, so one-shot buttons never repeat
            let input = autopilot(&self.world);
            events.extend(tick(&mut self.world, &input, SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        events
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid seed {:?}", arg))?,
        None => 42,
    };
    let tuning = match args.next() {
        Some(path) => {
            Tuning::load(&path).with_context(|| format!("failed to load tuning from {}", path))?
        }
        None => Tuning::default(),
    };

    log::info!("Slope Rider (headless) starting, seed {}", seed);

    let mut runner = Runner {
        world: World::new(tuning, Character::default(), seed),
        accumulator: 0.0,
    };

    let mut frame = 0;
    while !runner.world.is_over() && runner.world.elapsed < MAX_RUN_SECONDS {
        let dt = FRAME_TIMES[frame % FRAME_TIMES.len()];
        frame += 1;
        for event in runner.update(dt) {
            match &event {
                GameEvent::ScoreUpdate { .. } => log::trace!("{:?}", event),
                GameEvent::GameOver { .. } => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                _ => log::info!("{:?}", event),
            }
        }
    }

    if !runner.world.is_over() {
        let score = &runner.world.score.state;
        log::info!(
            "Stopped after {:.0}s: score {}, {}m",
            runner.world.elapsed,
            score.score,
            score.distance_meters
        );
    }
    Ok(())
}
