use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::mat3::{Mat3, SINGULAR_DETERMINANT};
use super::quat::Quat;
use super::vec3::Vec3;
use crate::error::MathError;

/// A 4x3 affine transform: a 3x3 linear part plus a translation.
///
/// The implicit bottom row is (0, 0, 0, 1). Column 3 holds the translation,
/// so `axis(3)` is the origin of the transformed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Columns of the matrix; the last one is the translation
    pub cols: [Vec3; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ZERO],
    };

    /// Creates a transform from a linear part and a translation
    #[inline]
    pub fn from_parts(linear: Mat3, translation: Vec3) -> Self {
        Self {
            cols: [linear.cols[0], linear.cols[1], linear.cols[2], translation],
        }
    }

    /// Creates a translation-only transform
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_parts(Mat3::IDENTITY, translation)
    }

    /// Creates a pose transform from a (unit) orientation and a position
    #[inline]
    pub fn from_orientation_and_position(orientation: Quat, position: Vec3) -> Self {
        Self::from_parts(Mat3::from_quat(orientation), position)
    }

    /// The 3x3 linear (rotation) part
    #[inline]
    pub fn linear(self) -> Mat3 {
        Mat3::from_cols(self.cols[0], self.cols[1], self.cols[2])
    }

    /// The translation part
    #[inline]
    pub fn translation(self) -> Vec3 {
        self.cols[3]
    }

    /// Returns column `index`; 0..3 are the basis axes, 3 the translation
    #[inline]
    pub fn axis(self, index: usize) -> Vec3 {
        self.cols[index]
    }

    /// Transforms a point (applies the translation)
    #[inline]
    pub fn transform_point(self, p: Vec3) -> Vec3 {
        self.linear().transform_vec(p) + self.cols[3]
    }

    /// Transforms a direction (ignores the translation)
    #[inline]
    pub fn transform_direction(self, d: Vec3) -> Vec3 {
        self.linear().transform_vec(d)
    }

    /// Inverse-transforms a point, assuming the linear part is a pure rotation
    #[inline]
    pub fn transform_inverse_point(self, p: Vec3) -> Vec3 {
        self.linear().transform_transpose(p - self.cols[3])
    }

    /// Inverse-transforms a direction, assuming the linear part is a pure
    /// rotation
    #[inline]
    pub fn transform_inverse_direction(self, d: Vec3) -> Vec3 {
        self.linear().transform_transpose(d)
    }

    /// Determinant of the affine matrix (that of its linear part)
    #[inline]
    pub fn determinant(self) -> f32 {
        self.linear().determinant()
    }

    /// General affine inverse.
    ///
    /// Fails with [`MathError::SingularMatrix`] when the linear part cannot
    /// be inverted.
    pub fn inverse(self) -> Result<Self, MathError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_DETERMINANT || !det.is_finite() {
            return Err(MathError::SingularMatrix { determinant: det });
        }
        let inv = self.linear().inverse()?;
        Ok(Self::from_parts(inv, -(inv * self.cols[3])))
    }

    /// Column-major 4x4 array for graphics APIs
    pub fn to_gl_array(self) -> [f32; 16] {
        let [c0, c1, c2, t] = self.cols;
        [
            c0.x, c0.y, c0.z, 0.0, //
            c1.x, c1.y, c1.z, 0.0, //
            c2.x, c2.y, c2.z, 0.0, //
            t.x, t.y, t.z, 1.0,
        ]
    }

    /// Returns true if this is approximately equal to another matrix
    #[inline]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        self.cols
            .iter()
            .zip(other.cols.iter())
            .all(|(a, b)| (*a - *b).length_squared() < epsilon * epsilon)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    /// Composition: `(a * b).transform_point(p) == a.transform_point(b.transform_point(p))`
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self::from_parts(
            self.linear() * other.linear(),
            self.transform_point(other.cols[3]),
        )
    }
}

impl Mul<Vec3> for Mat4 {
    type Output = Vec3;

    #[inline]
    fn mul(self, p: Vec3) -> Vec3 {
        self.transform_point(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn pose() -> Mat4 {
        Mat4::from_orientation_and_position(
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 1.0), PI / 3.0),
            Vec3::new(1.0, -2.0, 3.0),
        )
    }

    #[test]
    fn test_transform_point_and_inverse() {
        let m = pose();
        let p = Vec3::new(0.5, 4.0, -1.0);
        let world = m.transform_point(p);
        assert_abs_diff_eq!(m.transform_inverse_point(world), p, epsilon = 1e-5);
    }

    #[test]
    fn test_direction_ignores_translation() {
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(m.transform_direction(Vec3::Y), Vec3::Y);
        assert_eq!(m.transform_point(Vec3::Y), Vec3::new(10.0, 1.0, 0.0));
        assert_eq!(m.transform_inverse_direction(Vec3::Y), Vec3::Y);
    }

    #[test]
    fn test_axis() {
        let m = Mat4::from_orientation_and_position(
            Quat::from_axis_angle(Vec3::Z, PI / 2.0),
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert_abs_diff_eq!(m.axis(0), Vec3::Y, epsilon = 1e-6);
        assert_eq!(m.axis(3), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_inverse_matches_rigid_inverse() {
        let m = pose();
        let inv = m.inverse().unwrap();
        let p = Vec3::new(3.0, 1.0, 2.0);
        assert_abs_diff_eq!(inv.transform_point(p), m.transform_inverse_point(p), epsilon = 1e-5);
        assert!((m * inv).approx_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn test_singular_inverse_fails() {
        let mut m = Mat4::IDENTITY;
        m.cols[2] = Vec3::ZERO;
        assert!(matches!(m.inverse(), Err(MathError::SingularMatrix { .. })));
    }

    #[test]
    fn test_composition() {
        let a = pose();
        let b = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert_abs_diff_eq!((a * b).transform_point(p), a.transform_point(b.transform_point(p)), epsilon = 1e-5);
    }

    #[test]
    fn test_gl_array_layout() {
        let gl = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)).to_gl_array();
        assert_eq!(&gl[12..], &[4.0, 5.0, 6.0, 1.0]);
        assert_eq!(gl[0], 1.0);
        assert_eq!(gl[3], 0.0);
    }

    proptest! {
        #[test]
        fn inverse_times_original_is_identity(
            a in -5.0f32..5.0, b in -5.0f32..5.0, c in -5.0f32..5.0,
            d in -5.0f32..5.0, e in -5.0f32..5.0, f in -5.0f32..5.0,
            g in -5.0f32..5.0, h in -5.0f32..5.0, i in -5.0f32..5.0,
            tx in -20.0f32..20.0, ty in -20.0f32..20.0, tz in -20.0f32..20.0,
        ) {
            let m = Mat4::from_parts(
                Mat3::from_rows(Vec3::new(a, b, c), Vec3::new(d, e, f), Vec3::new(g, h, i)),
                Vec3::new(tx, ty, tz),
            );
            prop_assume!(m.determinant().abs() > 1.0);
            let inv = m.inverse().unwrap();
            prop_assert!((inv * m).approx_eq(Mat4::IDENTITY, 1e-2));
        }
    }
}
