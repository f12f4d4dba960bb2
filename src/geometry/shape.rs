use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Mat4, Vec3};

use super::aabb::Aabb;
use super::bounding::BoundingSphere;

/// A collision shape that can be attached to rigid bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A sphere defined by its radius
    Sphere(Sphere),
    /// A box (cuboid) defined by half-extents
    Box(BoxShape),
}

impl Shape {
    /// Creates a sphere shape
    #[inline]
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(Sphere::new(radius))
    }

    /// Creates a box shape from half-extents
    #[inline]
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box(BoxShape::new(half_extents))
    }

    /// Inertia tensor of the solid shape with the given mass
    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        match self {
            Shape::Sphere(s) => Mat3::sphere_inertia_tensor(s.radius, mass),
            Shape::Box(b) => Mat3::block_inertia_tensor(b.half_extents, mass),
        }
    }

    /// Smallest sphere around the shape placed at `transform`
    pub fn bounding_sphere(&self, transform: &Mat4) -> BoundingSphere {
        let center = transform.translation();
        match self {
            Shape::Sphere(s) => BoundingSphere::new(center, s.radius),
            Shape::Box(b) => BoundingSphere::new(center, b.half_extents.length()),
        }
    }

    /// World-space AABB of the shape placed at `transform`
    pub fn world_aabb(&self, transform: &Mat4) -> Aabb {
        match self {
            Shape::Sphere(s) => Aabb::from_center_half_extents(
                transform.translation(),
                Vec3::splat(s.radius),
            ),
            Shape::Box(b) => b.world_aabb(transform),
        }
    }

    /// Volume of the shape
    pub fn volume(&self) -> f32 {
        match self {
            Shape::Sphere(s) => s.volume(),
            Shape::Box(b) => b.volume(),
        }
    }
}

/// A sphere collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given radius
    #[inline]
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Returns the volume of the sphere
    #[inline]
    pub fn volume(&self) -> f32 {
        (4.0 / 3.0) * std::f32::consts::PI * self.radius * self.radius * self.radius
    }
}

/// A box (cuboid) collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    /// Half-extents (half the size in each dimension)
    pub half_extents: Vec3,
}

impl BoxShape {
    /// Creates a new box with the given half-extents
    #[inline]
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    /// Returns the full size of the box
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// Returns the volume of the box
    #[inline]
    pub fn volume(&self) -> f32 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }

    /// Returns the AABB of this box given a world transform
    pub fn world_aabb(&self, transform: &Mat4) -> Aabb {
        let rot = transform.linear();

        // Sum the absolute values of the rotated axes
        let abs_rot = Mat3::from_cols(rot.col(0).abs(), rot.col(1).abs(), rot.col(2).abs());
        Aabb::from_center_half_extents(transform.translation(), abs_rot * self.half_extents)
    }

    /// Returns the 8 vertices of the box in local space
    #[inline]
    pub fn vertices(&self) -> [Vec3; 8] {
        let h = self.half_extents;
        [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(h.x, h.y, h.z),
        ]
    }
}

/// An infinite plane `normal . p = offset`.
///
/// Used both as a half-space (everything behind the normal is solid) and as
/// a two-sided plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Distance of the plane from the origin along the normal
    pub offset: f32,
}

impl Plane {
    /// Creates a plane, normalizing `normal`.
    ///
    /// # Panics
    ///
    /// Panics if `normal` has zero length.
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize(),
            offset,
        }
    }

    /// The ground plane y = 0 facing up
    pub fn ground() -> Self {
        Self::new(Vec3::Y, 0.0)
    }

    /// Signed distance of a point from the plane
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}
