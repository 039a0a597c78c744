//! Scoring, combo multiplier, trail tiers and the bonus unlock

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use crate::tuning::ScoreTuning;

/// Score bookkeeping for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: u64,
    pub distance_meters: u32,
    /// Always within [1, max_multiplier]
    pub multiplier: u32,
    /// Seconds until the multiplier drops a step (None while at 1)
    pub multiplier_timer: Option<f32>,
    /// Index into the trail list; only ever increases
    pub current_trail: usize,
    /// Flips landed over the whole run
    pub total_flips_landed: u32,
    pub bonus_unlocked: bool,
    pub bonus_consumed: bool,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            score: 0,
            distance_meters: 0,
            multiplier: 1,
            multiplier_timer: None,
            current_trail: 0,
            total_flips_landed: 0,
            bonus_unlocked: false,
            bonus_consumed: false,
        }
    }
}

/// Owns the score state and every rule that changes it
#[derive(Debug, Clone)]
pub struct ScoreController {
    pub tuning: ScoreTuning,
    pub state: ScoreState,
    /// Milliseconds not yet converted into passive score
    cadence_accum_ms: f64,
}

impl ScoreController {
    pub fn new(tuning: ScoreTuning) -> Self {
        Self {
            tuning,
            state: ScoreState::default(),
            cadence_accum_ms: 0.0,
        }
    }

    fn max_multiplier(&self) -> u32 {
        self.tuning.max_multiplier.max(1)
    }

    /// Speed multiplier of the current trail
    pub fn speed_multiplier(&self) -> f32 {
        self.tuning
            .trails
            .get(self.state.current_trail)
            .map(|t| t.speed_multiplier)
            .unwrap_or(1.0)
    }

    fn score_update(&self) -> GameEvent {
        GameEvent::ScoreUpdate {
            score: self.state.score,
            distance_meters: self.state.distance_meters,
            multiplier: self.state.multiplier,
        }
    }

    /// Advance passive scoring and multiplier decay by `dt` seconds
    ///
    /// Passive points are paid in whole cadence steps so the total does not
    /// depend on how the host slices time into ticks.
    pub fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.decay_multiplier(dt, events);

        let cadence = f64::from(self.tuning.score_cadence_ms.max(1));
        self.cadence_accum_ms += f64::from(dt) * 1000.0;
        let mut paid = false;
        while self.cadence_accum_ms >= cadence {
            self.cadence_accum_ms -= cadence;
            let points = (cadence / 1000.0
                * f64::from(self.tuning.base_points_per_second)
                * f64::from(self.state.multiplier))
            .floor() as u64;
            self.state.score += points;
            paid = true;
        }
        if paid {
            events.push(self.score_update());
        }
    }

    fn decay_multiplier(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let Some(remaining) = self.state.multiplier_timer else {
            return;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.state.multiplier_timer = Some(remaining);
            return;
        }

        self.state.multiplier = self.state.multiplier.saturating_sub(1).max(1);
        self.state.multiplier_timer = if self.state.multiplier > 1 {
            Some(self.tuning.multiplier_decay_seconds)
        } else {
            None
        };
        events.push(GameEvent::MultiplierDecayed {
            multiplier: self.state.multiplier,
        });
    }

    /// A flip finished mid-air; pays out immediately
    pub fn on_flip_completed(&mut self) -> u64 {
        self.state.score += self.tuning.flip_points;
        self.tuning.flip_points
    }

    /// Flips landed cleanly. Returns the multiplier steps actually gained.
    pub fn on_flips_landed(&mut self, count: u32, events: &mut Vec<GameEvent>) -> u32 {
        if count == 0 {
            return 0;
        }
        let before = self.state.multiplier;
        self.state.multiplier = before.saturating_add(count).min(self.max_multiplier());
        self.state.multiplier_timer = Some(self.tuning.multiplier_decay_seconds);
        self.state.total_flips_landed = self.state.total_flips_landed.saturating_add(count);

        if !self.state.bonus_unlocked && self.state.total_flips_landed >= self.tuning.bonus_unlock_flips {
            self.state.bonus_unlocked = true;
            log::info!("Bonus unlocked after {} flips", self.state.total_flips_landed);
            events.push(GameEvent::BonusUnlocked);
        }
        self.state.multiplier - before
    }

    /// Flat points (landed grabs)
    pub fn award_points(&mut self, points: u64) {
        self.state.score += points;
    }

    /// Record distance travelled and escalate the trail when a threshold is crossed
    pub fn on_distance_update(&mut self, meters: u32, events: &mut Vec<GameEvent>) {
        self.state.distance_meters = self.state.distance_meters.max(meters);

        let reached = self
            .tuning
            .trails
            .iter()
            .rposition(|t| t.start_meters <= self.state.distance_meters)
            .unwrap_or(0);
        if reached > self.state.current_trail {
            self.state.current_trail = reached;
            let tier = &self.tuning.trails[reached];
            log::info!(
                "Trail {} reached at {}m (speed x{:.2})",
                tier.name,
                self.state.distance_meters,
                tier.speed_multiplier
            );
            events.push(GameEvent::TrailChanged {
                tier: reached,
                name: tier.name.clone(),
                speed_multiplier: tier.speed_multiplier,
            });
        }
    }

    /// Bonus button pressed. Pays once per run, only in the air after unlock.
    pub fn on_bonus_trigger(&mut self, airborne: bool, events: &mut Vec<GameEvent>) -> bool {
        if !airborne || !self.state.bonus_unlocked || self.state.bonus_consumed {
            return false;
        }
        self.state.bonus_consumed = true;
        self.state.score += self.tuning.bonus_points;
        log::info!("Bonus awarded: +{}", self.tuning.bonus_points);
        events.push(GameEvent::BonusAwarded {
            points: self.tuning.bonus_points,
        });
        true
    }
}
