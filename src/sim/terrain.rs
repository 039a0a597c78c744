//! Procedural slope generation
//!
//! The slope is a sliding window of evenly spaced height samples. New points
//! are appended at the downhill end as the player advances and old points are
//! dropped behind the camera. Heights come from four stacked sine octaves, with
//! triangular ramp kickers injected at random intervals.

use std::cell::Cell;
use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::SimRng;
use crate::tuning::TerrainTuning;

/// A single terrain sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainPoint {
    pub x: f32,
    pub y: f32,
}

/// Horizontal span where the profile is raised into a jump ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampZone {
    pub start: f32,
    pub end: f32,
}

impl RampZone {
    /// True if `x` lies within the zone widened by `buffer` on both sides
    #[inline]
    pub fn contains(&self, x: f32, buffer: f32) -> bool {
        x >= self.start - buffer && x <= self.end + buffer
    }
}

/// Windowed heightfield generator
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    pub tuning: TerrainTuning,
    points: VecDeque<TerrainPoint>,
    ramps: Vec<RampZone>,
    /// Phase offset shared by every octave, fixed for the run
    phase: f32,
    /// x of the next point to append
    next_x: f32,
    /// Where the next ramp begins
    next_ramp_start: f32,
    /// Segment index resolved by the previous `height_at` query
    cursor: Cell<Option<usize>>,
    rng: SimRng,
}

impl TerrainGenerator {
    /// Create a generator whose first point sits `trailing_margin` behind `start_x`
    pub fn new(tuning: TerrainTuning, start_x: f32, mut rng: SimRng) -> Self {
        let phase = if tuning.max_phase > 0.0 {
            rng.random_range(0.0..tuning.max_phase)
        } else {
            0.0
        };
        let next_ramp_start = start_x + Self::draw_gap(&tuning, &mut rng);
        let first_x = start_x - tuning.trailing_margin;

        let mut terrain = Self {
            tuning,
            points: VecDeque::new(),
            ramps: Vec::new(),
            phase,
            next_x: first_x,
            next_ramp_start,
            cursor: Cell::new(None),
            rng,
        };
        terrain.extend_window(start_x);
        terrain
    }

    fn draw_gap(tuning: &TerrainTuning, rng: &mut SimRng) -> f32 {
        if tuning.ramp_max_gap > tuning.ramp_min_gap {
            rng.random_range(tuning.ramp_min_gap..=tuning.ramp_max_gap)
        } else {
            tuning.ramp_min_gap
        }
    }

    /// Smooth hill profile without ramps
    pub fn base_height(&self, x: f32) -> f32 {
        let shifted = x + self.phase;
        let swell: f32 = self
            .tuning
            .octaves
            .iter()
            .map(|o| (shifted * o.frequency).sin() * o.amplitude)
            .sum();
        self.tuning.baseline_y - swell
    }

    /// Upward ramp offset at `x` (0 outside any ramp)
    fn ramp_lift(&self, x: f32) -> f32 {
        self.ramps
            .iter()
            .find(|r| x >= r.start && x < r.end)
            .map(|r| (x - r.start) / (r.end - r.start) * self.tuning.ramp_height)
            .unwrap_or(0.0)
    }

    fn append_point(&mut self) {
        let x = self.next_x;

        if x >= self.next_ramp_start {
            let zone = RampZone {
                start: self.next_ramp_start,
                end: self.next_ramp_start + self.tuning.ramp_width,
            };
            log::debug!("Ramp injected at {:.0}..{:.0}", zone.start, zone.end);
            self.ramps.push(zone);
            self.next_ramp_start = zone.end + Self::draw_gap(&self.tuning, &mut self.rng);
        }

        let y = self.base_height(x) - self.ramp_lift(x);
        self.points.push_back(TerrainPoint { x, y });
        self.next_x = x + self.tuning.segment_width;
    }

    /// Append points until the frontier is past `target_x + lookahead_margin`
    pub fn extend_window(&mut self, target_x: f32) {
        self.ensure_generated(target_x + self.tuning.lookahead_margin);
    }

    /// Append points until the frontier is strictly past `x`
    ///
    /// Ramp zones are only known once generation reaches them, so anything
    /// that needs to avoid ramps at `x` must call this first.
    pub fn ensure_generated(&mut self, x: f32) {
        while self.points.len() < 2 || self.frontier() <= x {
            self.append_point();
        }
    }

    /// Drop points (and ramps) more than `trailing_margin` behind `camera_x`
    pub fn trim_window(&mut self, camera_x: f32) {
        let edge = camera_x - self.tuning.trailing_margin;
        let mut dropped = 0;
        while self.points.len() > 2 && self.points.front().is_some_and(|p| p.x < edge) {
            self.points.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            self.cursor.set(None);
        }
        self.ramps.retain(|r| r.end >= edge);
    }

    /// x of the newest point
    pub fn frontier(&self) -> f32 {
        self.points.back().map(|p| p.x).unwrap_or(f32::NEG_INFINITY)
    }

    pub fn points(&self) -> &VecDeque<TerrainPoint> {
        &self.points
    }

    /// Ramp zones still inside the window
    pub fn ramps(&self) -> &[RampZone] {
        &self.ramps
    }

    /// True if `x` is inside any active ramp zone widened by `buffer`
    pub fn in_ramp_zone(&self, x: f32, buffer: f32) -> bool {
        self.ramps.iter().any(|r| r.contains(x, buffer))
    }

    /// Find `i` with `points[i].x <= x <= points[i + 1].x`
    ///
    /// Queries mostly move forward, so walk on from the previous answer and
    /// only binary search when there is no usable cursor.
    fn segment_index(&self, x: f32) -> usize {
        let last = self.points.len() - 2;
        let start = match self.cursor.get() {
            Some(i) if i <= last && self.points[i].x <= x => i,
            _ => self.points.partition_point(|p| p.x <= x).saturating_sub(1).min(last),
        };

        let mut i = start;
        while i < last && self.points[i + 1].x < x {
            i += 1;
        }
        self.cursor.set(Some(i));
        i
    }

    /// Interpolated ground height at `x`; clamps to the edge values outside the window
    pub fn height_at(&self, x: f32) -> f32 {
        if self.points.len() < 2 {
            return self.tuning.baseline_y;
        }
        let (first, last) = match (self.points.front(), self.points.back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return self.tuning.baseline_y,
        };
        if x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }

        let i = self.segment_index(x);
        let a = self.points[i];
        let b = self.points[i + 1];
        let t = (x - a.x) / (b.x - a.x);
        a.y + (b.y - a.y) * t
    }

    /// Local slope in degrees from a centred finite difference
    ///
    /// Positive angles descend to the right (screen y grows downward).
    pub fn slope_angle_at(&self, x: f32) -> f32 {
        let d = self.tuning.slope_sample_distance;
        // Behind first: the segment cursor only walks forward
        let behind = self.height_at(x - d);
        let ahead = self.height_at(x + d);
        let dy = ahead - behind;
        dy.atan2(2.0 * d).to_degrees()
    }
}
