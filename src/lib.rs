//! Slope Rider - An endless downhill trick-skiing game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, obstacles, player physics, tricks, scoring)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame a single tick simulates; anything longer is dropped
    pub const MAX_FRAME_DT: f32 = SIM_DT * MAX_SUBSTEPS as f32;

    /// Where every run starts (world units)
    pub const START_X: f32 = 200.0;
    pub const START_Y: f32 = 300.0;

    /// Smallest height/weight scale a character may have
    pub const MIN_ATTRIBUTE_SCALE: f32 = 0.1;
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Shortest signed difference `to - from` in degrees, always within [-180, 180]
#[inline]
pub fn wrapped_delta(from: f32, to: f32) -> f32 {
    let mut delta = to - from;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    // Inputs outside (-180, 180] can still leave us out of range after one correction
    if delta.abs() > 180.0 {
        normalize_degrees(delta)
    } else {
        delta
    }
}

/// Absolute angular distance between two orientations, in [0, 180]
#[inline]
pub fn relative_angle(a: f32, b: f32) -> f32 {
    let diff = (a - b).abs().rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}
