use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A volume the bounding-volume hierarchy can be built from.
pub trait BoundingVolume: Copy + Debug {
    /// Smallest volume of this kind enclosing both
    fn merged(&self, other: &Self) -> Self;

    /// Returns true if the two volumes overlap
    fn overlaps(&self, other: &Self) -> bool;

    /// Returns true if `other` lies entirely inside this volume
    fn contains(&self, other: &Self) -> bool;

    /// A measure of size used to pick the side to descend first
    fn size(&self) -> f32;

    /// How much this volume would grow to also enclose `other`
    fn growth(&self, other: &Self) -> f32;

    /// This volume enlarged by `margin` in every direction
    fn inflated(&self, margin: f32) -> Self;
}

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a sphere from centre and radius
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl BoundingVolume for BoundingSphere {
    fn merged(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance_sq = offset.length_squared();
        let radius_diff = other.radius - self.radius;

        // One sphere encloses the other
        if radius_diff * radius_diff >= distance_sq {
            return if self.radius > other.radius { *self } else { *other };
        }

        let distance = distance_sq.sqrt();
        let radius = (distance + self.radius + other.radius) * 0.5;

        // Move toward the larger sphere in proportion to the radius change
        let center = if distance > 0.0 {
            self.center + offset * ((radius - self.radius) / distance)
        } else {
            self.center
        };
        Self { center, radius }
    }

    #[inline]
    fn overlaps(&self, other: &Self) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }

    #[inline]
    fn contains(&self, other: &Self) -> bool {
        self.center.distance(other.center) + other.radius <= self.radius
    }

    #[inline]
    fn size(&self) -> f32 {
        (4.0 / 3.0) * std::f32::consts::PI * self.radius * self.radius * self.radius
    }

    fn growth(&self, other: &Self) -> f32 {
        let merged = self.merged(other);
        merged.radius * merged.radius - self.radius * self.radius
    }

    #[inline]
    fn inflated(&self, margin: f32) -> Self {
        Self::new(self.center, self.radius + margin)
    }
}
