//! Hitbox overlap tests
//!
//! Player and obstacles both collide as axis-aligned boxes. Obstacle sprites
//! are drawn rotated to the slope, but their hitboxes stay upright and are
//! shrunk to a fraction of the sprite so near misses on steep ground stay fair.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box (screen coordinates, +y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given size centred on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Box of the given size whose bottom edge is centred on `bottom_center`
    pub fn from_bottom_center(bottom_center: Vec2, size: Vec2) -> Self {
        let size = size.abs();
        Self::new(
            Vec2::new(bottom_center.x - size.x * 0.5, bottom_center.y - size.y),
            Vec2::new(bottom_center.x + size.x * 0.5, bottom_center.y),
        )
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap; boxes that only share an edge do not collide
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}
