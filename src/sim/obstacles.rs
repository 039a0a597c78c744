//! Obstacle spawning along the slope
//!
//! Obstacles are planted on the ground ahead of the player at random spacing,
//! tilted to the local slope, and removed once they are far behind the camera.
//! Ramp zones are kept clear so a kicker never launches the player into a tree.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::SimRng;
use super::terrain::TerrainGenerator;
use crate::tuning::ObstacleTuning;

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    Tree,
    Stump,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Rock, ObstacleKind::Tree, ObstacleKind::Stump];

    /// Unscaled sprite size (width, height)
    pub fn sprite_size(&self) -> Vec2 {
        match self {
            ObstacleKind::Rock => Vec2::new(64.0, 48.0),
            ObstacleKind::Tree => Vec2::new(96.0, 160.0),
            ObstacleKind::Stump => Vec2::new(48.0, 40.0),
        }
    }

    /// Scale applied to the sprite when placed in the world
    pub fn base_scale(&self) -> f32 {
        match self {
            ObstacleKind::Rock => 0.6,
            ObstacleKind::Tree => 0.5,
            ObstacleKind::Stump => 0.7,
        }
    }

    /// Fraction of the visual bounds that actually collides (width, height)
    pub fn hitbox_ratio(&self) -> Vec2 {
        match self {
            // Rocks are mostly solid
            ObstacleKind::Rock => Vec2::new(0.8, 0.7),
            // Only the trunk and lower branches
            ObstacleKind::Tree => Vec2::new(0.35, 0.8),
            ObstacleKind::Stump => Vec2::new(0.75, 0.6),
        }
    }
}

/// An obstacle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub x: f32,
    /// Ground height the obstacle stands on
    pub ground_y: f32,
    /// Tilt matching the local slope (degrees)
    pub rotation: f32,
    /// Scaled visual size
    pub size: Vec2,
    pub hitbox: Aabb,
}

impl Obstacle {
    /// Plant an obstacle of `kind` on the terrain at `x`
    pub fn planted(id: u32, kind: ObstacleKind, x: f32, terrain: &TerrainGenerator) -> Self {
        let ground_y = terrain.height_at(x);
        let size = kind.sprite_size() * kind.base_scale();
        let hitbox = Aabb::from_bottom_center(Vec2::new(x, ground_y), size * kind.hitbox_ratio());
        Self {
            id,
            kind,
            x,
            ground_y,
            rotation: terrain.slope_angle_at(x),
            size,
            hitbox,
        }
    }
}

/// Places obstacles ahead of the player
#[derive(Debug, Clone)]
pub struct ObstacleSpawner {
    pub tuning: ObstacleTuning,
    /// Live obstacles, oldest (leftmost) first
    pub obstacles: Vec<Obstacle>,
    /// x of the most recent spawn attempt
    pub frontier: f32,
    /// Attempts dropped because they fell on a ramp
    pub skipped: u32,
    next_id: u32,
    rng: SimRng,
}

impl ObstacleSpawner {
    pub fn new(tuning: ObstacleTuning, start_x: f32, rng: SimRng) -> Self {
        let frontier = start_x + tuning.first_offset;
        Self {
            tuning,
            obstacles: Vec::new(),
            frontier,
            skipped: 0,
            next_id: 1,
            rng,
        }
    }

    /// Terrain must be generated up to here before `update` so every ramp the
    /// next spawn could touch already exists
    pub fn required_coverage(&self) -> f32 {
        self.frontier + self.tuning.max_distance + self.tuning.ramp_buffer
    }

    /// Despawn obstacles far behind `camera_x` and make one spawn attempt if
    /// the frontier is inside the forward window
    pub fn update(&mut self, camera_x: f32, terrain: &TerrainGenerator) {
        let cutoff = camera_x - self.tuning.despawn_margin;
        self.obstacles.retain(|o| o.x >= cutoff);

        if self.frontier < camera_x + self.tuning.spawn_lookahead {
            self.spawn_next(terrain);
        }
    }

    fn spawn_next(&mut self, terrain: &TerrainGenerator) {
        let spacing = if self.tuning.max_distance > self.tuning.min_distance {
            self.rng
                .random_range(self.tuning.min_distance..=self.tuning.max_distance)
        } else {
            self.tuning.min_distance
        };
        self.frontier += spacing;
        let kind = ObstacleKind::ALL[self.rng.random_range(0..ObstacleKind::ALL.len())];

        if terrain.in_ramp_zone(self.frontier, self.tuning.ramp_buffer) {
            self.skipped += 1;
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.obstacles
            .push(Obstacle::planted(id, kind, self.frontier, terrain));
    }

    /// First obstacle whose hitbox overlaps `hitbox`
    pub fn first_hit(&self, hitbox: &Aabb) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.hitbox.overlaps(hitbox))
    }
}
