//! Player kinematics
//!
//! The player is either sliding on the slope or flying above it. While
//! grounded the body is glued to the surface and follows its tangent; once the
//! surface drops away (crest, ramp lip, jump) gravity takes over until the
//! feet come back down and the landing is judged.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::Character;
use super::terrain::TerrainGenerator;
use super::tick::TickInput;
use crate::normalize_degrees;
use crate::tuning::PlayerTuning;

/// Mutable kinematic state of the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Centre of the standing hitbox
    pub pos: Vec2,
    pub vel: Vec2,
    /// Degrees, normalized to (-180, 180]; 0 is upright on flat ground
    pub orientation: f32,
    pub grounded: bool,
    pub crouching: bool,
    pub gravity_boosting: bool,
    pub speed_boosting: bool,
}

/// Outcome of resolving the player against the ground for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundTransition {
    /// Still sliding, snapped onto the surface
    Grounded,
    /// Surface dropped away this tick
    TookOff,
    /// Still in the air
    Airborne,
    /// Feet reached the ground; landing must be judged before `commit_landing`
    LandingAttempt { slope_angle: f32 },
}

/// Integrates the player against the heightfield
#[derive(Debug, Clone)]
pub struct PlayerKinematics {
    pub tuning: PlayerTuning,
    pub character: Character,
    pub state: PlayerState,
}

impl PlayerKinematics {
    /// Create an airborne player at `pos`
    pub fn new(tuning: PlayerTuning, character: Character, pos: Vec2) -> Self {
        Self {
            tuning,
            character,
            state: PlayerState {
                pos,
                vel: Vec2::ZERO,
                orientation: 0.0,
                grounded: false,
                crouching: false,
                gravity_boosting: false,
                speed_boosting: false,
            },
        }
    }

    /// Standing hitbox size; taller characters are bigger
    pub fn standing_size(&self) -> Vec2 {
        Vec2::new(self.tuning.base_width, self.tuning.base_height) * self.character.height_scale
    }

    /// y of the player's feet
    pub fn bottom(&self) -> f32 {
        self.state.pos.y + self.standing_size().y * 0.5
    }

    /// Current hitbox; crouching lowers the top, the feet stay put
    pub fn hitbox(&self) -> Aabb {
        let mut size = self.standing_size();
        if self.state.crouching {
            size.y *= self.tuning.crouch_factor;
        }
        Aabb::from_bottom_center(Vec2::new(self.state.pos.x, self.bottom()), size)
    }

    pub fn gravity(&self) -> f32 {
        let mut g = self.tuning.base_gravity * self.character.weight_scale;
        if self.state.gravity_boosting && !self.state.grounded {
            g *= self.tuning.gravity_boost_factor;
        }
        g
    }

    /// Forward speed; heavier characters carry more speed down the hill
    pub fn forward_speed(&self, trail_multiplier: f32) -> f32 {
        let mut speed = self.tuning.base_speed * self.character.weight_scale;
        if self.state.speed_boosting && self.state.grounded {
            speed *= self.tuning.speed_boost_factor;
        }
        speed * trail_multiplier
    }

    /// Vertical launch velocity; taller characters jump higher
    pub fn jump_impulse(&self) -> f32 {
        self.tuning.jump_velocity
            * (self.tuning.jump_base_factor
                + self.character.height_scale * self.tuning.jump_height_factor)
    }

    /// Air rotation rate (degrees/s); taller characters spin slower
    pub fn rotation_rate(&self) -> f32 {
        self.tuning.rotation_speed / self.character.height_scale
    }

    /// Apply one tick of input. Returns true if the player jumped.
    ///
    /// A jump comes from the jump button or from releasing a grounded crouch.
    pub fn apply_input(&mut self, input: &TickInput, dt: f32) -> bool {
        let s = &mut self.state;

        if s.grounded {
            let released_crouch = s.crouching && !input.crouch;
            s.crouching = input.crouch;
            s.gravity_boosting = false;
            s.speed_boosting = input.speed_boost;

            if input.jump || released_crouch {
                let impulse = self.jump_impulse();
                let s = &mut self.state;
                s.vel.y = impulse;
                s.grounded = false;
                s.crouching = false;
                s.speed_boosting = false;
                return true;
            }
            return false;
        }

        s.crouching = false;
        s.gravity_boosting = input.crouch;
        s.speed_boosting = false;

        let rate = self.rotation_rate();
        let mut spin = 0.0;
        if input.rotate_forward {
            spin += rate;
        }
        if input.rotate_backward {
            spin -= rate;
        }
        if input.roll_right {
            spin += rate * self.tuning.roll_factor;
        }
        if input.roll_left {
            spin -= rate * self.tuning.roll_factor;
        }
        if spin != 0.0 {
            let s = &mut self.state;
            s.orientation = normalize_degrees(s.orientation + spin * dt);
        }
        false
    }

    /// Advance velocity and position by `dt`
    pub fn integrate(&mut self, dt: f32, trail_multiplier: f32) {
        let gravity = self.gravity();
        let speed = self.forward_speed(trail_multiplier);
        let s = &mut self.state;
        s.vel.x = speed;
        s.vel.y += gravity * dt;
        s.pos += s.vel * dt;
    }

    /// Resolve grounded/airborne against the terrain after integration
    ///
    /// Leaving the ground needs the feet to clear it by `exit_threshold`, while
    /// touching down only needs them within `entry_threshold`. The gap keeps
    /// vertex-to-vertex height noise from toggling the state every tick.
    pub fn resolve_ground_state(&mut self, terrain: &TerrainGenerator) -> GroundTransition {
        let ground = terrain.height_at(self.state.pos.x);
        let bottom = self.bottom();

        if self.state.grounded {
            if bottom < ground - self.tuning.exit_threshold {
                self.state.grounded = false;
                self.state.crouching = false;
                return GroundTransition::TookOff;
            }
            self.snap_to_ground(terrain);
            return GroundTransition::Grounded;
        }

        let touching = bottom >= ground - self.tuning.entry_threshold;
        let settling = self.state.vel.y >= -self.tuning.landing_velocity_tolerance;
        if touching && settling {
            GroundTransition::LandingAttempt {
                slope_angle: terrain.slope_angle_at(self.state.pos.x),
            }
        } else {
            GroundTransition::Airborne
        }
    }

    /// Commit a judged-safe landing
    pub fn commit_landing(&mut self, terrain: &TerrainGenerator) {
        self.state.grounded = true;
        self.state.gravity_boosting = false;
        self.snap_to_ground(terrain);
    }

    /// Put the feet on the surface, align to the slope and follow its tangent
    pub fn snap_to_ground(&mut self, terrain: &TerrainGenerator) {
        let x = self.state.pos.x;
        let half_height = self.standing_size().y * 0.5;
        let slope = terrain.slope_angle_at(x);
        let s = &mut self.state;
        s.pos.y = terrain.height_at(x) - half_height;
        s.vel.y = s.vel.x * slope.to_radians().tan();
        s.orientation = normalize_degrees(slope);
    }
}
