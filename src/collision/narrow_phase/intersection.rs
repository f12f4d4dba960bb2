//! Boolean overlap tests used as early-outs before generating contacts.

use crate::geometry::Plane;
use crate::math::Vec3;

use crate::collision::primitive::{CollisionBox, CollisionSphere};

/// Axes shorter than this (squared) are skipped in the separating-axis test
pub(crate) const DEGENERATE_AXIS_SQ: f32 = 1e-4;

/// Returns true if the sphere reaches below the half-space surface
pub fn sphere_and_half_space(sphere: &CollisionSphere, plane: &Plane) -> bool {
    let distance = plane.normal.dot(sphere.center()) - sphere.radius;
    distance <= plane.offset
}

/// Returns true if two spheres overlap
pub fn sphere_and_sphere(one: &CollisionSphere, two: &CollisionSphere) -> bool {
    let radii = one.radius + two.radius;
    one.center().distance_squared(two.center()) < radii * radii
}

/// Returns true if any part of the box reaches below the half-space surface
pub fn box_and_half_space(cbox: &CollisionBox, plane: &Plane) -> bool {
    let projected_radius = cbox.project_onto(plane.normal);
    let distance = plane.normal.dot(cbox.center()) - projected_radius;
    distance <= plane.offset
}

/// Separating-axis test over the 15 candidate axes of two boxes
pub fn box_and_box(one: &CollisionBox, two: &CollisionBox) -> bool {
    let to_centre = two.center() - one.center();
    box_axes(one, two).iter().all(|&axis| {
        axis.length_squared() < DEGENERATE_AXIS_SQ
            || penetration_on_axis(one, two, axis.normalize(), to_centre) >= 0.0
    })
}

/// The 15 separating-axis candidates: three face normals of each box, then
/// the cross product of every edge pair.
pub(crate) fn box_axes(one: &CollisionBox, two: &CollisionBox) -> [Vec3; 15] {
    let mut axes = [Vec3::ZERO; 15];
    for i in 0..3 {
        axes[i] = one.axis(i);
        axes[i + 3] = two.axis(i);
    }
    for i in 0..3 {
        for j in 0..3 {
            axes[6 + i * 3 + j] = one.axis(i).cross(two.axis(j));
        }
    }
    axes
}

/// Overlap of the two boxes' projections onto a unit axis; negative means
/// the axis separates them.
pub(crate) fn penetration_on_axis(
    one: &CollisionBox,
    two: &CollisionBox,
    axis: Vec3,
    to_centre: Vec3,
) -> f32 {
    let one_project = one.project_onto(axis);
    let two_project = two.project_onto(axis);
    let distance = to_centre.dot(axis).abs();
    one_project + two_project - distance
}
