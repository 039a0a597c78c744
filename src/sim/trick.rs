//! Trick detection and landing judgment
//!
//! Orientation arrives already wrapped to (-180, 180], so the raw per-tick
//! difference jumps by ~360° whenever the player spins through the seam.
//! Each delta is unwrapped before accumulating, which makes the running total
//! a true count of degrees turned since takeoff.

use serde::{Deserialize, Serialize};

use super::events::CrashCause;
use crate::tuning::TrickTuning;
use crate::{relative_angle, wrapped_delta};

/// Grab tricks held with the grab buttons while airborne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrabKind {
    Indy,
    Melon,
    Stalefish,
    TailGrab,
}

impl GrabKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrabKind::Indy => "Indy",
            GrabKind::Melon => "Melon",
            GrabKind::Stalefish => "Stalefish",
            GrabKind::TailGrab => "Tail Grab",
        }
    }
}

/// Human-readable name for `flips` rotations in the given direction
pub fn flip_label(flips: u32, forward: bool) -> String {
    let base = if forward { "Frontflip" } else { "Backflip" };
    match flips {
        0 => String::new(),
        1 => base.to_string(),
        2 => format!("Double {}", base),
        3 => format!("Triple {}", base),
        n => format!("{}x {}", n, base),
    }
}

/// Rotation bookkeeping for a single airtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrickSession {
    /// Signed degrees turned since takeoff (positive = forward)
    pub cumulative_rotation: f32,
    pub flips_completed: u32,
    pub last_frame_orientation: f32,
    /// Grab currently held
    pub grab: Option<GrabKind>,
    pub grab_held_seconds: f32,
    /// Grab whose points are waiting for a clean landing
    pub pending_grab: Option<GrabKind>,
    pub pending_grab_points: u64,
}

/// A flip finished mid-air
#[derive(Debug, Clone, PartialEq)]
pub struct FlipCompleted {
    pub flips: u32,
    pub label: String,
}

/// Everything a clean landing pays out
#[derive(Debug, Clone, PartialEq)]
pub struct SafeLanding {
    pub flips: u32,
    pub flip_label: String,
    pub grab: Option<GrabKind>,
    pub grab_points: u64,
    pub relative_angle: f32,
}

impl SafeLanding {
    /// Combined trick name, empty if nothing was performed
    pub fn label(&self) -> String {
        match (self.flips > 0, self.pending_grab_name()) {
            (true, Some(grab)) => format!("{} + {}", self.flip_label, grab),
            (true, None) => self.flip_label.clone(),
            (false, Some(grab)) => grab.to_string(),
            (false, None) => String::new(),
        }
    }

    fn pending_grab_name(&self) -> Option<&'static str> {
        match self.grab {
            Some(grab) if self.grab_points > 0 => Some(grab.as_str()),
            _ => None,
        }
    }
}

/// Result of judging a touchdown
#[derive(Debug, Clone, PartialEq)]
pub enum LandingVerdict {
    Safe(SafeLanding),
    Crash {
        cause: CrashCause,
        /// Only reported for bad-angle landings
        relative_angle: Option<f32>,
    },
}

/// Tracks in-air rotation and grabs, and judges landings
#[derive(Debug, Clone)]
pub struct TrickEngine {
    pub tuning: TrickTuning,
    pub session: TrickSession,
}

impl TrickEngine {
    pub fn new(tuning: TrickTuning) -> Self {
        Self {
            tuning,
            session: TrickSession::default(),
        }
    }

    /// Start a fresh session; `orientation` is the new baseline
    pub fn begin_airtime(&mut self, orientation: f32) {
        self.session = TrickSession {
            last_frame_orientation: orientation,
            ..TrickSession::default()
        };
    }

    /// Accumulate this tick's rotation. Returns a flip event the moment the
    /// flip count goes up.
    pub fn on_airborne_tick(&mut self, orientation: f32) -> Option<FlipCompleted> {
        let s = &mut self.session;
        let delta = wrapped_delta(s.last_frame_orientation, orientation);
        s.cumulative_rotation += delta;
        s.last_frame_orientation = orientation;

        let flips = (s.cumulative_rotation.abs() / self.tuning.flip_threshold).floor() as u32;
        if flips > s.flips_completed {
            s.flips_completed = flips;
            let label = flip_label(flips, s.cumulative_rotation > 0.0);
            log::debug!("{} ({:.0}°)", label, s.cumulative_rotation);
            return Some(FlipCompleted { flips, label });
        }
        None
    }

    /// Track the held grab. Points accrue while a grab is held and stay
    /// pending after release; switching grabs starts over.
    pub fn hold_grab(&mut self, grab: Option<GrabKind>, dt: f32) {
        let s = &mut self.session;
        match grab {
            Some(kind) => {
                if s.grab != Some(kind) {
                    s.grab = Some(kind);
                    s.grab_held_seconds = 0.0;
                    s.pending_grab = Some(kind);
                    s.pending_grab_points = 0;
                }
                s.grab_held_seconds += dt;
                s.pending_grab_points =
                    (s.grab_held_seconds * self.tuning.grab_points_per_second).floor() as u64;
            }
            None => {
                s.grab = None;
                s.grab_held_seconds = 0.0;
            }
        }
    }

    /// Judge a touchdown at `orientation` on ground sloped at `slope_angle`
    ///
    /// Touching down with a grab still held always crashes. Otherwise the
    /// landing is safe while the relative angle is at most `crash_threshold`.
    pub fn on_landing_attempt(
        &mut self,
        orientation: f32,
        slope_angle: f32,
        grab_held: bool,
    ) -> LandingVerdict {
        if grab_held {
            return LandingVerdict::Crash {
                cause: CrashCause::GrabHeldOnLanding,
                relative_angle: None,
            };
        }

        let angle = relative_angle(orientation, slope_angle);
        if angle > self.tuning.crash_threshold {
            return LandingVerdict::Crash {
                cause: CrashCause::BadLanding,
                relative_angle: Some(angle),
            };
        }

        let s = &self.session;
        let landing = SafeLanding {
            flips: s.flips_completed,
            flip_label: flip_label(s.flips_completed, s.cumulative_rotation > 0.0),
            grab: s.pending_grab,
            grab_points: s.pending_grab_points,
            relative_angle: angle,
        };
        self.session = TrickSession {
            last_frame_orientation: orientation,
            ..TrickSession::default()
        };
        LandingVerdict::Safe(landing)
    }
}
