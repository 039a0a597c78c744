//! Game balance tuning
//!
//! Every gameplay constant lives here so a run can be rebalanced from a JSON
//! file without recompiling. Missing fields fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// One sine octave of the hill profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Octave {
    pub frequency: f32,
    pub amplitude: f32,
}

/// Terrain generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Horizontal distance between consecutive terrain points
    pub segment_width: f32,
    /// Ground height the octaves oscillate around
    pub baseline_y: f32,
    /// Large slow swells first, small fast detail last
    pub octaves: [Octave; 4],
    /// Upper bound (exclusive) for the per-run phase offset
    pub max_phase: f32,
    /// Points are generated this far ahead of the camera
    pub lookahead_margin: f32,
    /// Points further than this behind the camera are dropped
    pub trailing_margin: f32,
    pub ramp_min_gap: f32,
    pub ramp_max_gap: f32,
    pub ramp_width: f32,
    pub ramp_height: f32,
    /// Half-width of the finite difference used for slope angles
    pub slope_sample_distance: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            segment_width: 20.0,
            baseline_y: 450.0,
            octaves: [
                Octave { frequency: 0.0008, amplitude: 250.0 },
                Octave { frequency: 0.002, amplitude: 150.0 },
                Octave { frequency: 0.005, amplitude: 80.0 },
                Octave { frequency: 0.012, amplitude: 30.0 },
            ],
            max_phase: 10_000.0,
            lookahead_margin: 1200.0,
            trailing_margin: 400.0,
            ramp_min_gap: 1500.0,
            ramp_max_gap: 3000.0,
            ramp_width: 200.0,
            ramp_height: 80.0,
            slope_sample_distance: 20.0,
        }
    }
}

/// Obstacle spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub min_distance: f32,
    pub max_distance: f32,
    /// First spawn frontier, relative to the run start
    pub first_offset: f32,
    /// Spawn while the frontier is closer than this ahead of the camera
    pub spawn_lookahead: f32,
    /// Despawn obstacles this far behind the camera
    pub despawn_margin: f32,
    /// Keep-out distance around ramp zones
    pub ramp_buffer: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            min_distance: 300.0,
            max_distance: 600.0,
            first_offset: 600.0,
            spawn_lookahead: 1500.0,
            despawn_margin: 800.0,
            ramp_buffer: 100.0,
        }
    }
}

/// Player physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Downward acceleration before weight scaling (units/s²)
    pub base_gravity: f32,
    pub gravity_boost_factor: f32,
    /// Forward speed before weight scaling (units/s)
    pub base_speed: f32,
    pub speed_boost_factor: f32,
    /// Upward launch velocity before height scaling (negative is up)
    pub jump_velocity: f32,
    pub jump_base_factor: f32,
    pub jump_height_factor: f32,
    /// Hitbox at height scale 1.0
    pub base_width: f32,
    pub base_height: f32,
    /// Hitbox height multiplier while crouching
    pub crouch_factor: f32,
    /// Grounded -> Airborne once the feet clear the ground by more than this
    pub exit_threshold: f32,
    /// Airborne -> Grounded once the feet come within this of the ground
    pub entry_threshold: f32,
    /// Small upward velocities still count as touching down
    pub landing_velocity_tolerance: f32,
    /// Flip rotation rate at height scale 1.0 (degrees/s)
    pub rotation_speed: f32,
    /// Rolls turn at this fraction of the flip rate
    pub roll_factor: f32,
    /// Falling below this y ends the run
    pub world_floor_y: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_gravity: 800.0,
            gravity_boost_factor: 2.5,
            base_speed: 200.0,
            speed_boost_factor: 1.8,
            jump_velocity: -600.0,
            jump_base_factor: 1.2,
            jump_height_factor: 0.1,
            base_width: 32.0,
            base_height: 48.0,
            crouch_factor: 0.5,
            exit_threshold: 15.0,
            entry_threshold: 10.0,
            landing_velocity_tolerance: 10.0,
            rotation_speed: 600.0,
            roll_factor: 0.5,
            world_floor_y: 1200.0,
        }
    }
}

/// Trick detection and landing judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrickTuning {
    /// Accumulated rotation per completed flip (degrees)
    pub flip_threshold: f32,
    /// Landings further than this from the slope angle crash (degrees, exclusive)
    pub crash_threshold: f32,
    pub grab_points_per_second: f32,
}

impl Default for TrickTuning {
    fn default() -> Self {
        Self {
            flip_threshold: 360.0,
            crash_threshold: 30.0,
            grab_points_per_second: 10.0,
        }
    }
}

/// A difficulty stage along the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailTier {
    pub name: String,
    /// Distance (meters) at which this tier starts
    pub start_meters: u32,
    pub speed_multiplier: f32,
}

/// Scoring, multiplier, trails and bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub base_points_per_second: f32,
    /// Passive score is applied on this fixed cadence
    pub score_cadence_ms: u32,
    /// Awarded the moment a flip completes
    pub flip_points: u64,
    pub max_multiplier: u32,
    pub multiplier_decay_seconds: f32,
    pub pixels_per_meter: f32,
    /// Ordered by `start_meters`, first tier starts at 0
    pub trails: Vec<TrailTier>,
    /// Cumulative landed flips needed to unlock the bonus
    pub bonus_unlock_flips: u32,
    pub bonus_points: u64,
}

impl ScoreTuning {
    /// Trails laid out every `step` meters, each faster than the last
    pub fn default_trails(step: u32) -> Vec<TrailTier> {
        vec![
            TrailTier { name: "Green".into(), start_meters: 0, speed_multiplier: 1.0 },
            TrailTier { name: "Blue".into(), start_meters: step, speed_multiplier: 1.15 },
            TrailTier { name: "Black".into(), start_meters: step * 2, speed_multiplier: 1.3 },
        ]
    }
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            base_points_per_second: 10.0,
            score_cadence_ms: 100,
            flip_points: 100,
            max_multiplier: 5,
            multiplier_decay_seconds: 3.0,
            pixels_per_meter: 10.0,
            trails: Self::default_trails(1000),
            bonus_unlock_flips: 10,
            bonus_points: 5000,
        }
    }
}

/// Complete tuning set for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub terrain: TerrainTuning,
    pub obstacles: ObstacleTuning,
    pub player: PlayerTuning,
    pub tricks: TrickTuning,
    pub score: ScoreTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let t = &self.terrain;
        if !(t.segment_width > 0.0) {
            return Err(invalid("terrain.segment_width", "must be positive"));
        }
        if t.ramp_min_gap > t.ramp_max_gap || t.ramp_min_gap < 0.0 {
            return Err(invalid("terrain.ramp_min_gap", "must be in [0, ramp_max_gap]"));
        }
        if !(t.ramp_width > 0.0) {
            return Err(invalid("terrain.ramp_width", "must be positive"));
        }
        if !(t.slope_sample_distance > 0.0) {
            return Err(invalid("terrain.slope_sample_distance", "must be positive"));
        }
        if t.lookahead_margin < 0.0 || t.trailing_margin < 0.0 {
            return Err(invalid("terrain.lookahead_margin", "margins must not be negative"));
        }

        let o = &self.obstacles;
        if !(o.min_distance > 0.0) || o.min_distance > o.max_distance {
            return Err(invalid("obstacles.min_distance", "must be in (0, max_distance]"));
        }

        let p = &self.player;
        if p.exit_threshold <= p.entry_threshold {
            return Err(invalid(
                "player.exit_threshold",
                format!("must exceed entry_threshold ({})", p.entry_threshold),
            ));
        }
        if !(p.base_width > 0.0) || !(p.base_height > 0.0) {
            return Err(invalid("player.base_width", "hitbox must be positive"));
        }

        let k = &self.tricks;
        if !(k.flip_threshold > 0.0) {
            return Err(invalid("tricks.flip_threshold", "must be positive"));
        }
        if !(0.0..=180.0).contains(&k.crash_threshold) {
            return Err(invalid("tricks.crash_threshold", "must be within [0, 180]"));
        }

        let s = &self.score;
        if s.max_multiplier < 1 {
            return Err(invalid("score.max_multiplier", "must be at least 1"));
        }
        if s.score_cadence_ms == 0 {
            return Err(invalid("score.score_cadence_ms", "must be positive"));
        }
        if !(s.pixels_per_meter > 0.0) {
            return Err(invalid("score.pixels_per_meter", "must be positive"));
        }
        match s.trails.first() {
            Some(first) if first.start_meters == 0 => {}
            _ => return Err(invalid("score.trails", "first tier must start at 0 meters")),
        }
        let ordered = s.trails.windows(2).all(|w| {
            w[0].start_meters < w[1].start_meters && w[0].speed_multiplier <= w[1].speed_multiplier
        });
        if !ordered {
            return Err(invalid(
                "score.trails",
                "tiers must be ordered by distance with non-decreasing speed",
            ));
        }

        Ok(())
    }

    /// Replace every group that fails validation with its defaults
    ///
    /// The sim runs on whatever it is handed, so unchecked values (zero
    /// segment width, zero slope sample distance, ...) are fixed here instead
    /// of hanging or poisoning a run.
    pub fn sanitized(mut self) -> Self {
        while let Err(err) = self.validate() {
            let group = match &err {
                TuningError::Invalid { field, .. } => field.split('.').next().unwrap_or_default(),
                _ => "",
            };
            log::warn!("{}; using default {} tuning", err, group);
            match group {
                "terrain" => self.terrain = TerrainTuning::default(),
                "obstacles" => self.obstacles = ObstacleTuning::default(),
                "player" => self.player = PlayerTuning::default(),
                "tricks" => self.tricks = TrickTuning::default(),
                "score" => self.score = ScoreTuning::default(),
                _ => return Tuning::default(),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "tricks": { "flip_threshold": 270.0 } }"#).unwrap();
        assert_eq!(tuning.tricks.flip_threshold, 270.0);
        assert_eq!(tuning.tricks.crash_threshold, 30.0);
        assert_eq!(tuning.terrain, TerrainTuning::default());
    }

    #[test]
    fn test_rejects_inverted_hysteresis() {
        let json = r#"{ "player": { "exit_threshold": 5.0, "entry_threshold": 10.0 } }"#;
        match Tuning::from_json(json) {
            Err(TuningError::Invalid { field, .. }) => assert_eq!(field, "player.exit_threshold"),
            other => panic!("expected invalid tuning, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unordered_trails() {
        let mut tuning = Tuning::default();
        tuning.score.trails.swap(1, 2);
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_sanitized_resets_only_broken_groups() {
        let mut tuning = Tuning::default();
        tuning.terrain.segment_width = 0.0;
        tuning.terrain.baseline_y = 900.0;
        tuning.score.score_cadence_ms = 0;
        tuning.tricks.flip_threshold = 270.0;

        let fixed = tuning.sanitized();
        assert!(fixed.validate().is_ok());
        assert_eq!(fixed.terrain, TerrainTuning::default());
        assert_eq!(fixed.score, ScoreTuning::default());
        // Valid groups are kept as given
        assert_eq!(fixed.tricks.flip_threshold, 270.0);
    }

    #[test]
    fn test_sanitized_keeps_valid_tuning() {
        let mut tuning = Tuning::default();
        tuning.player.base_speed = 321.0;
        assert_eq!(tuning.clone().sanitized(), tuning);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }
}
