use std::ops::{Mul, MulAssign, Neg};

use serde::{Deserialize, Serialize};

use super::vec3::Vec3;

/// A quaternion representing an orientation in 3D space.
///
/// Stored as (x, y, z, w) where w is the scalar part. Rigid bodies keep
/// their orientation exclusively as a unit quaternion; rotation matrices are
/// derived from it on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new quaternion from components, without normalizing
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Overwrites all four components and renormalizes.
    ///
    /// A near-zero quaternion collapses to the identity.
    #[inline]
    pub fn set(&mut self, w: f32, x: f32, y: f32, z: f32) {
        *self = Self::new(x, y, z, w).normalize();
    }

    /// Creates a quaternion from a rotation axis and angle (in radians)
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        let axis = axis.normalize();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Returns the squared length of the quaternion
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Returns the length of the quaternion
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a unit-length quaternion.
    ///
    /// A quaternion whose magnitude is effectively zero becomes the identity
    /// instead of being divided by ~0.
    #[inline]
    pub fn normalize(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq < f32::EPSILON {
            return Self::IDENTITY;
        }
        let inv_len = 1.0 / len_sq.sqrt();
        Self::new(
            self.x * inv_len,
            self.y * inv_len,
            self.z * inv_len,
            self.w * inv_len,
        )
    }

    /// Returns the conjugate (inverse rotation for unit quaternions)
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Dot product of two quaternions
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Rotates a vector by this quaternion
    #[inline]
    pub fn rotate_vec(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Post-multiplies by the pure quaternion (0, v)
    #[inline]
    pub fn rotate_by_vector(&mut self, v: Vec3) {
        *self *= Quat::new(v.x, v.y, v.z, 0.0);
    }

    /// First-order integration of an angular velocity.
    ///
    /// Computes `self + 0.5 * (0, v * scale) * self`. The result is not
    /// normalized.
    #[inline]
    pub fn add_scaled_vector(self, v: Vec3, scale: f32) -> Self {
        let spin = Quat::new(v.x * scale, v.y * scale, v.z * scale, 0.0) * self;
        Self::new(
            self.x + spin.x * 0.5,
            self.y + spin.y * 0.5,
            self.z + spin.z * 0.5,
            self.w + spin.w * 0.5,
        )
    }

    /// Returns true if this quaternion is within `epsilon` of unit length
    #[inline]
    pub fn is_normalized(self, epsilon: f32) -> bool {
        (self.length_squared() - 1.0).abs() <= epsilon
    }
}

impl Mul for Quat {
    type Output = Self;

    /// Quaternion multiplication (combines rotations)
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self::new(
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        )
    }
}

impl MulAssign for Quat {
    #[inline]
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Neg for Quat {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}
