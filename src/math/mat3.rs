use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::quat::Quat;
use super::vec3::Vec3;
use crate::error::MathError;

/// Determinants smaller than this are treated as singular.
pub(crate) const SINGULAR_DETERMINANT: f32 = 1e-10;

/// A 3x3 matrix stored in column-major order.
///
/// Used for rotation matrices, inertia tensors and the contact-space basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat3 {
    /// Columns of the matrix
    pub cols: [Vec3; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    /// Zero matrix
    pub const ZERO: Self = Self {
        cols: [Vec3::ZERO, Vec3::ZERO, Vec3::ZERO],
    };

    /// Identity matrix
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// Creates a matrix from column vectors
    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Creates a matrix whose columns are the three given basis vectors
    #[inline]
    pub fn from_components(one: Vec3, two: Vec3, three: Vec3) -> Self {
        Self::from_cols(one, two, three)
    }

    /// Creates a matrix from row vectors
    #[inline]
    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self::from_cols(
            Vec3::new(r0.x, r1.x, r2.x),
            Vec3::new(r0.y, r1.y, r2.y),
            Vec3::new(r0.z, r1.z, r2.z),
        )
    }

    /// Creates a diagonal matrix
    #[inline]
    pub fn from_diagonal(diag: Vec3) -> Self {
        Self::from_cols(
            Vec3::new(diag.x, 0.0, 0.0),
            Vec3::new(0.0, diag.y, 0.0),
            Vec3::new(0.0, 0.0, diag.z),
        )
    }

    /// Creates a rotation matrix from a quaternion
    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        let x2 = q.x + q.x;
        let y2 = q.y + q.y;
        let z2 = q.z + q.z;

        let xx = q.x * x2;
        let xy = q.x * y2;
        let xz = q.x * z2;
        let yy = q.y * y2;
        let yz = q.y * z2;
        let zz = q.z * z2;
        let wx = q.w * x2;
        let wy = q.w * y2;
        let wz = q.w * z2;

        Self::from_cols(
            Vec3::new(1.0 - (yy + zz), xy + wz, xz - wy),
            Vec3::new(xy - wz, 1.0 - (xx + zz), yz + wx),
            Vec3::new(xz + wy, yz - wx, 1.0 - (xx + yy)),
        )
    }

    /// Builds an inertia tensor from its principal moments and products of
    /// inertia.
    #[inline]
    pub fn inertia_tensor_coeffs(ix: f32, iy: f32, iz: f32, ixy: f32, ixz: f32, iyz: f32) -> Self {
        Self::from_rows(
            Vec3::new(ix, -ixy, -ixz),
            Vec3::new(-ixy, iy, -iyz),
            Vec3::new(-ixz, -iyz, iz),
        )
    }

    /// Inertia tensor of a solid box with the given half-sizes and mass
    #[inline]
    pub fn block_inertia_tensor(half_sizes: Vec3, mass: f32) -> Self {
        let sq = half_sizes.component_product(half_sizes);
        let k = mass / 3.0;
        Self::inertia_tensor_coeffs(k * (sq.y + sq.z), k * (sq.x + sq.z), k * (sq.x + sq.y), 0.0, 0.0, 0.0)
    }

    /// Inertia tensor of a solid sphere with the given radius and mass
    #[inline]
    pub fn sphere_inertia_tensor(radius: f32, mass: f32) -> Self {
        Self::from_diagonal(Vec3::splat(0.4 * mass * radius * radius))
    }

    /// Creates a skew-symmetric (cross product) matrix from a vector
    /// Such that skew_symmetric(v) * u = v.cross(u)
    #[inline]
    pub fn skew_symmetric(v: Vec3) -> Self {
        Self::from_cols(
            Vec3::new(0.0, v.z, -v.y),
            Vec3::new(-v.z, 0.0, v.x),
            Vec3::new(v.y, -v.x, 0.0),
        )
    }

    /// Returns the transpose of the matrix
    #[inline]
    pub fn transpose(self) -> Self {
        Self::from_rows(self.cols[0], self.cols[1], self.cols[2])
    }

    /// Returns the determinant of the matrix
    #[inline]
    pub fn determinant(self) -> f32 {
        self.cols[0].dot(self.cols[1].cross(self.cols[2]))
    }

    /// Returns the inverse of the matrix.
    ///
    /// Fails with [`MathError::SingularMatrix`] when the determinant is
    /// (near) zero rather than returning a meaningless result.
    #[inline]
    pub fn inverse(self) -> Result<Self, MathError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_DETERMINANT || !det.is_finite() {
            return Err(MathError::SingularMatrix { determinant: det });
        }

        let inv_det = 1.0 / det;

        // Rows of the inverse are the cross products of the columns
        let r0 = self.cols[1].cross(self.cols[2]) * inv_det;
        let r1 = self.cols[2].cross(self.cols[0]) * inv_det;
        let r2 = self.cols[0].cross(self.cols[1]) * inv_det;

        Ok(Self::from_rows(r0, r1, r2))
    }

    /// Transforms a vector by this matrix
    #[inline]
    pub fn transform_vec(self, v: Vec3) -> Vec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }

    /// Transforms a vector by the transpose of this matrix
    #[inline]
    pub fn transform_transpose(self, v: Vec3) -> Vec3 {
        Vec3::new(self.cols[0].dot(v), self.cols[1].dot(v), self.cols[2].dot(v))
    }

    /// Returns a column of the matrix
    #[inline]
    pub fn col(self, index: usize) -> Vec3 {
        self.cols[index]
    }

    /// Returns a row of the matrix
    #[inline]
    pub fn row(self, index: usize) -> Vec3 {
        Vec3::new(self.cols[0][index], self.cols[1][index], self.cols[2][index])
    }

    /// Returns the element at `row`, `col`
    #[inline]
    pub fn get(self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    /// Interpolates every element between `a` and `b`
    #[inline]
    pub fn linear_interpolate(a: Self, b: Self, prop: f32) -> Self {
        a.scale(1.0 - prop) + b.scale(prop)
    }

    /// Scalar multiplication
    #[inline]
    pub fn scale(self, s: f32) -> Self {
        Self::from_cols(self.cols[0] * s, self.cols[1] * s, self.cols[2] * s)
    }

    /// Returns true if this is approximately equal to another matrix
    #[inline]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.cols[0] - other.cols[0]).length_squared() < epsilon * epsilon
            && (self.cols[1] - other.cols[1]).length_squared() < epsilon * epsilon
            && (self.cols[2] - other.cols[2]).length_squared() < epsilon * epsilon
    }
}

impl Add for Mat3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::from_cols(
            self.cols[0] + other.cols[0],
            self.cols[1] + other.cols[1],
            self.cols[2] + other.cols[2],
        )
    }
}

impl AddAssign for Mat3 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.cols[0] += other.cols[0];
        self.cols[1] += other.cols[1];
        self.cols[2] += other.cols[2];
    }
}

impl Sub for Mat3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::from_cols(
            self.cols[0] - other.cols[0],
            self.cols[1] - other.cols[1],
            self.cols[2] - other.cols[2],
        )
    }
}

impl SubAssign for Mat3 {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.cols[0] -= other.cols[0];
        self.cols[1] -= other.cols[1];
        self.cols[2] -= other.cols[2];
    }
}

impl Neg for Mat3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Self::from_cols(
            self.transform_vec(other.cols[0]),
            self.transform_vec(other.cols[1]),
            self.transform_vec(other.cols[2]),
        )
    }
}

impl MulAssign for Mat3 {
    #[inline]
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.transform_vec(v)
    }
}

impl Mul<f32> for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, s: f32) -> Self {
        self.scale(s)
    }
}
