//! Events emitted by the simulation
//!
//! The host consumes these to drive the HUD, trick popups, the game-over
//! screen and leaderboard submission. None of them feed back into the sim.

use serde::{Deserialize, Serialize};

use super::obstacles::ObstacleKind;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashCause {
    /// Touched down too far off the slope angle
    BadLanding,
    /// Hit an obstacle
    Obstacle { kind: ObstacleKind },
    /// Touched down while still holding a grab
    GrabHeldOnLanding,
    /// Dropped below the world floor
    FellOffWorld,
}

/// What a landed trick paid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Flat points added on landing
    pub points: u64,
    /// Multiplier steps gained
    pub multiplier_gain: u32,
    /// Multiplier after the landing
    pub multiplier: u32,
}

/// A single simulation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Periodic HUD refresh
    ScoreUpdate {
        score: u64,
        distance_meters: u32,
        multiplier: u32,
    },
    /// A flip finished mid-air
    FlipCompleted {
        flips: u32,
        label: String,
        points: u64,
    },
    /// Clean landing after a trick
    TrickLanded { label: String, reward: Reward },
    /// Multiplier decayed (landings report their gain in `TrickLanded`)
    MultiplierDecayed { multiplier: u32 },
    /// Entered a harder trail
    TrailChanged {
        tier: usize,
        name: String,
        speed_multiplier: f32,
    },
    /// Enough flips landed; the bonus can now be triggered in the air
    BonusUnlocked,
    BonusAwarded { points: u64 },
    /// Terminal: the run is over
    GameOver {
        score: u64,
        distance_meters: u32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        landing_angle_degrees: Option<f32>,
        cause: CrashCause,
    },
}

impl GameEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::GameOver { .. })
    }
}
