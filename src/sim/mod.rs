//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (obstacles oldest first)
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod obstacles;
pub mod player;
pub mod score;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod trick;

pub use collision::Aabb;
pub use events::{CrashCause, GameEvent, Reward};
pub use obstacles::{Obstacle, ObstacleKind, ObstacleSpawner};
pub use player::{GroundTransition, PlayerKinematics, PlayerState};
pub use score::{ScoreController, ScoreState};
pub use state::{Character, RunPhase, SimRng, World};
pub use terrain::{RampZone, TerrainGenerator, TerrainPoint};
pub use tick::{TickInput, step, tick};
pub use trick::{GrabKind, LandingVerdict, SafeLanding, TrickEngine, TrickSession, flip_label};
