//! World state and core simulation types
//!
//! `World` owns one instance of each component. Nothing outside `tick` mutates
//! it, and every random draw comes from the RNG handed to the constructor, so
//! a seed plus an input stream reproduces a run exactly.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::CrashCause;
use super::obstacles::ObstacleSpawner;
use super::player::PlayerKinematics;
use super::score::ScoreController;
use super::terrain::TerrainGenerator;
use super::trick::TrickEngine;
use crate::consts::*;
use crate::tuning::Tuning;

/// Random source used by every generator in the sim
pub type SimRng = Pcg32;

/// Rider attributes chosen on the character select screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Bigger hitbox, higher jumps, slower spins (~0.8 - 1.2)
    pub height_scale: f32,
    /// Faster and heavier (~0.8 - 1.2)
    pub weight_scale: f32,
    /// Cosmetic only
    pub color: String,
}

impl Character {
    pub fn new(name: &str, height_scale: f32, weight_scale: f32) -> Self {
        Self {
            id: name.to_lowercase(),
            name: name.to_string(),
            height_scale,
            weight_scale,
            color: "#FFFFFF".to_string(),
        }
        .sanitized()
    }

    /// Clamp attributes the physics cannot handle (zero, negative, NaN)
    pub fn sanitized(mut self) -> Self {
        fn clamp(value: f32, what: &str, name: &str) -> f32 {
            if value.is_finite() && value >= MIN_ATTRIBUTE_SCALE {
                value
            } else {
                log::warn!(
                    "{} {} scale {} out of range, clamped to {}",
                    name,
                    what,
                    value,
                    MIN_ATTRIBUTE_SCALE
                );
                MIN_ATTRIBUTE_SCALE
            }
        }
        self.height_scale = clamp(self.height_scale, "height", &self.name);
        self.weight_scale = clamp(self.weight_scale, "weight", &self.name);
        self
    }

    /// The stock riders
    pub fn roster() -> Vec<Character> {
        let rider = |id: &str, name: &str, height: f32, weight: f32, color: &str| Character {
            id: id.to_string(),
            name: name.to_string(),
            height_scale: height,
            weight_scale: weight,
            color: color.to_string(),
        };
        vec![
            // Tall and light: big air, slow spins
            rider("friend1", "Alex", 1.15, 0.9, "#FF6B6B"),
            // Short and heavy: quick spins, fast and low
            rider("friend2", "Jordan", 0.85, 1.2, "#4ECDC4"),
            rider("friend3", "Sam", 1.0, 1.0, "#95E1D3"),
            rider("friend4", "Taylor", 1.1, 1.15, "#F38181"),
            rider("friend5", "Casey", 0.9, 0.85, "#AA96DA"),
        ]
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new("Sam", 1.0, 1.0)
    }
}

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunPhase {
    Running,
    /// Terminal; the world no longer changes
    Crashed(CrashCause),
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct World {
    /// x the run started at (distance is measured from here)
    pub start_x: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds
    pub elapsed: f32,
    pub phase: RunPhase,
    pub terrain: TerrainGenerator,
    pub obstacles: ObstacleSpawner,
    pub player: PlayerKinematics,
    pub tricks: TrickEngine,
    pub score: ScoreController,
}

impl World {
    /// Start a run from a seed
    pub fn new(tuning: Tuning, character: Character, seed: u64) -> Self {
        Self::with_rng(tuning, character, SimRng::seed_from_u64(seed))
    }

    /// Start a run drawing all randomness from `rng`
    ///
    /// Terrain and obstacles each get their own stream split off `rng`, so
    /// spawning more obstacles never shifts the hills.
    pub fn with_rng(tuning: Tuning, character: Character, mut rng: SimRng) -> Self {
        let tuning = tuning.sanitized();
        let character = character.sanitized();
        let terrain_rng = SimRng::from_rng(&mut rng);
        let obstacle_rng = SimRng::from_rng(&mut rng);

        let terrain = TerrainGenerator::new(tuning.terrain, START_X, terrain_rng);
        let obstacles = ObstacleSpawner::new(tuning.obstacles, START_X, obstacle_rng);

        log::info!(
            "Run started: {} (height {:.2}, weight {:.2})",
            character.name,
            character.height_scale,
            character.weight_scale
        );

        // Riders start on the snow, aligned to the slope
        let mut player =
            PlayerKinematics::new(tuning.player, character, Vec2::new(START_X, START_Y));
        player.commit_landing(&terrain);

        Self {
            start_x: START_X,
            time_ticks: 0,
            elapsed: 0.0,
            phase: RunPhase::Running,
            terrain,
            obstacles,
            player,
            tricks: TrickEngine::new(tuning.tricks),
            score: ScoreController::new(tuning.score),
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, RunPhase::Crashed(_))
    }

    /// Whole meters travelled from the start
    pub fn distance_meters(&self) -> u32 {
        let travelled = (self.player.state.pos.x - self.start_x).max(0.0);
        (travelled / self.score.tuning.pixels_per_meter).floor() as u32
    }
}
