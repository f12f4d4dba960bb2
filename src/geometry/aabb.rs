use serde::{Deserialize, Serialize};

use crate::math::Vec3;

use super::bounding::BoundingVolume;

/// An axis-aligned bounding box.
///
/// Tighter than a bounding sphere for long thin shapes; either can back a
/// [`Bvh`](crate::collision::Bvh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size along each axis
    #[inline]
    pub fn half_extents(self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn volume(self) -> f32 {
        let size = self.max - self.min;
        size.x * size.y * size.z
    }

    #[inline]
    pub fn surface_area(self) -> f32 {
        let size = self.max - self.min;
        2.0 * (size.x * size.y + size.y * size.z + size.z * size.x)
    }

    /// Smallest box enclosing both
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Returns true if the boxes share any point, touching included
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        let low = self.min.max(other.min);
        let high = self.max.min(other.max);
        low.x <= high.x && low.y <= high.y && low.z <= high.z
    }

    #[inline]
    pub fn contains_aabb(self, other: Self) -> bool {
        self.union(other) == self
    }

    /// The box grown by `margin` on every side
    #[inline]
    pub fn expand(self, margin: f32) -> Self {
        let m = Vec3::splat(margin);
        Self::new(self.min - m, self.max + m)
    }
}

impl BoundingVolume for Aabb {
    fn merged(&self, other: &Self) -> Self {
        self.union(*other)
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.intersects(*other)
    }

    fn contains(&self, other: &Self) -> bool {
        self.contains_aabb(*other)
    }

    fn size(&self) -> f32 {
        self.volume()
    }

    /// Growth in surface area, the usual insertion cost for boxes
    fn growth(&self, other: &Self) -> f32 {
        self.union(*other).surface_area() - self.surface_area()
    }

    fn inflated(&self, margin: f32) -> Self {
        self.expand(margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_extents() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.half_extents(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.volume(), 48.0);
        assert_eq!(aabb.surface_area(), 88.0);
    }

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let touching = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let apart = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));

        assert!(a.intersects(b));
        assert!(b.intersects(a));
        assert!(a.intersects(touching));
        assert!(!a.intersects(apart));
    }

    #[test]
    fn test_union_and_containment() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(b);

        assert_eq!(u, Aabb::new(Vec3::ZERO, Vec3::splat(3.0)));
        assert!(u.contains_aabb(a));
        assert!(!a.contains_aabb(u));
        assert!(a.expand(0.5).contains_aabb(Aabb::new(Vec3::splat(-0.5), Vec3::splat(1.5))));
    }

    #[test]
    fn test_bounding_volume_impl() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 1.0));
        let m = BoundingVolume::merged(&a, &b);
        assert!(BoundingVolume::contains(&m, &a));
        assert!(BoundingVolume::contains(&m, &b));
        assert!(!BoundingVolume::overlaps(&a, &b));
        assert_eq!(BoundingVolume::growth(&a, &a), 0.0);
        assert!(BoundingVolume::growth(&a, &b) > 0.0);
    }
}
