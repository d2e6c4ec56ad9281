//! Axis-Aligned Bounding Box
//!
//! The 2D box every collider, the quadtree and the casts work in terms of.
//! A zero box (`Aabb::default()`) is a legal value and doubles as the
//! "no overlap" result of [`Aabb::intersection`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world units.
///
/// Invariant: `min.x <= max.x && min.y <= max.y`. [`Aabb::from_corners`]
/// re-sorts unordered input; [`Aabb::new`] trusts the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner (bottom-left)
    pub min: Vec2,
    /// Maximum corner (top-right)
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from already ordered corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a box from two arbitrary corners, sorting them per axis.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box centered on `center` with the given half extents.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Width and height as a vector.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size() * 0.5
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grows the box outward by `amount` on every side (negative shrinks).
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Grows the box by a per-axis amount on every side.
    pub fn expanded_by(&self, amount: Vec2) -> Self {
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// Returns the box moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive point test: points on the boundary are contained.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// True unless the boxes are fully separated on some axis.
    ///
    /// Touching edges count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Overlap region of the two boxes, or a zero box when they do not overlap.
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        if !self.overlaps(other) {
            return Aabb::default();
        }
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Closest point inside (or on) the box to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.max(self.min).min(self.max)
    }
}
