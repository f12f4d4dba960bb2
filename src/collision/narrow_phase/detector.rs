//! Contact generators for every primitive pair except box/box.
//!
//! Each generator writes into a [`CollisionData`] and returns how many
//! contacts it added. Nothing is written once the buffer's budget is spent.

use crate::collision::contact::CollisionData;
use crate::collision::primitive::{CollisionBox, CollisionSphere};
use crate::geometry::Plane;
use crate::math::Vec3;

use super::intersection;

/// Sphere against a half-space. The contact normal is the plane normal.
pub fn sphere_and_half_space(sphere: &CollisionSphere, plane: &Plane, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let position = sphere.center();
    let distance = plane.normal.dot(position) - sphere.radius - plane.offset;
    if distance >= 0.0 {
        return 0;
    }

    let point = position - plane.normal * (distance + sphere.radius);
    usize::from(data.add_contact([sphere.body, None], point, plane.normal, -distance))
}

/// Sphere against a two-sided plane; the sphere is pushed out on whichever
/// side its centre lies.
pub fn sphere_and_true_plane(sphere: &CollisionSphere, plane: &Plane, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let position = sphere.center();
    let centre_distance = plane.normal.dot(position) - plane.offset;
    if centre_distance * centre_distance > sphere.radius * sphere.radius {
        return 0;
    }

    let (normal, penetration) = if centre_distance < 0.0 {
        (-plane.normal, sphere.radius + centre_distance)
    } else {
        (plane.normal, sphere.radius - centre_distance)
    };
    let point = position - plane.normal * centre_distance;
    usize::from(data.add_contact([sphere.body, None], point, normal, penetration))
}

/// Sphere against sphere. The normal points from `two` toward `one`.
pub fn sphere_and_sphere(one: &CollisionSphere, two: &CollisionSphere, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let midline = one.center() - two.center();
    let size = midline.length();
    let radii = one.radius + two.radius;
    // Coincident centres give no usable normal
    if size <= 0.0 || size >= radii {
        return 0;
    }

    let normal = midline / size;
    let penetration = radii - size;
    let point = one.center() - normal * one.radius;
    usize::from(data.add_contact([one.body, two.body], point, normal, penetration))
}

/// Box against a half-space: one contact per vertex on or below the surface.
pub fn box_and_half_space(cbox: &CollisionBox, plane: &Plane, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() || !intersection::box_and_half_space(cbox, plane) {
        return 0;
    }

    let mut written = 0;
    for vertex in cbox.world_vertices() {
        let distance = vertex.dot(plane.normal);
        if distance > plane.offset {
            continue;
        }
        // Halfway between the vertex and the surface
        let point = vertex - plane.normal * (0.5 * (distance - plane.offset));
        if !data.add_contact([cbox.body, None], point, plane.normal, plane.offset - distance) {
            break;
        }
        written += 1;
    }
    written
}

/// Box against sphere. The normal points from the sphere toward the box.
pub fn box_and_sphere(cbox: &CollisionBox, sphere: &CollisionSphere, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let centre = sphere.center();
    let rel_centre = cbox.transform.transform_inverse_point(centre);
    let half = cbox.half_size;
    let radius = sphere.radius;

    if rel_centre.x.abs() - radius > half.x
        || rel_centre.y.abs() - radius > half.y
        || rel_centre.z.abs() - radius > half.z
    {
        return 0;
    }

    let closest = rel_centre.clamp_symmetric(half);
    let distance_sq = closest.distance_squared(rel_centre);
    if distance_sq > radius * radius {
        return 0;
    }

    if distance_sq > 0.0 {
        let closest_world = cbox.transform.transform_point(closest);
        let normal = (closest_world - centre).normalize();
        let penetration = radius - distance_sq.sqrt();
        return usize::from(data.add_contact([cbox.body, sphere.body], closest_world, normal, penetration));
    }

    // The centre is inside the box: leave through the nearest face
    let mut axis = 0;
    let mut depth = half.x - rel_centre.x.abs();
    for i in 1..3 {
        let d = half[i] - rel_centre[i].abs();
        if d < depth {
            depth = d;
            axis = i;
        }
    }
    let sign = if rel_centre[axis] < 0.0 { -1.0 } else { 1.0 };
    let mut on_face = rel_centre;
    on_face[axis] = sign * half[axis];

    let normal = cbox.axis(axis) * -sign;
    let point = cbox.transform.transform_point(on_face);
    usize::from(data.add_contact([cbox.body, sphere.body], point, normal, radius + depth))
}

/// Box against a single world-space point; the box is pushed off the point
/// through its nearest face.
pub fn box_and_point(cbox: &CollisionBox, point: Vec3, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let rel = cbox.transform.transform_inverse_point(point);
    let mut best: Option<(usize, f32)> = None;
    for i in 0..3 {
        let depth = cbox.half_size[i] - rel[i].abs();
        if depth < 0.0 {
            return 0;
        }
        if best.map_or(true, |(_, d)| depth < d) {
            best = Some((i, depth));
        }
    }
    let Some((axis, depth)) = best else {
        return 0;
    };

    let sign = if rel[axis] < 0.0 { -1.0 } else { 1.0 };
    let normal = cbox.axis(axis) * -sign;
    usize::from(data.add_contact([cbox.body, None], point, normal, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::CollisionConfig;
    use crate::math::{Mat4, Quat};
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_4;

    fn data() -> CollisionData {
        CollisionData::new(16, CollisionConfig::default())
    }

    fn sphere_at(p: Vec3, r: f32) -> CollisionSphere {
        CollisionSphere::new(None, r, Mat4::from_translation(p))
    }

    fn box_at(p: Vec3, half: Vec3) -> CollisionBox {
        CollisionBox::new(None, half, Mat4::from_translation(p))
    }

    #[test]
    fn test_sphere_resting_in_ground() {
        let mut data = data();
        let sphere = sphere_at(Vec3::new(0.0, 0.5, 0.0), 1.0);
        assert_eq!(sphere_and_half_space(&sphere, &Plane::ground(), &mut data), 1);

        let contact = data.contacts()[0];
        assert_abs_diff_eq!(contact.penetration, 0.5);
        assert_eq!(contact.contact_normal, Vec3::Y);
        assert_abs_diff_eq!(contact.contact_point, Vec3::ZERO);
        assert_eq!(contact.bodies[1], None);
    }

    #[test]
    fn test_sphere_above_ground() {
        let mut data = data();
        let sphere = sphere_at(Vec3::new(0.0, 1.5, 0.0), 1.0);
        assert_eq!(sphere_and_half_space(&sphere, &Plane::ground(), &mut data), 0);
        assert!(data.is_empty());
    }

    #[test]
    fn test_true_plane_both_sides() {
        let mut data = data();
        let above = sphere_at(Vec3::new(0.0, 0.25, 0.0), 1.0);
        let below = sphere_at(Vec3::new(0.0, -0.25, 0.0), 1.0);
        assert_eq!(sphere_and_true_plane(&above, &Plane::ground(), &mut data), 1);
        assert_eq!(sphere_and_true_plane(&below, &Plane::ground(), &mut data), 1);

        let (up, down) = (data.contacts()[0], data.contacts()[1]);
        assert_eq!(up.contact_normal, Vec3::Y);
        assert_abs_diff_eq!(up.penetration, 0.75);
        assert_eq!(down.contact_normal, -Vec3::Y);
        assert_abs_diff_eq!(down.penetration, 0.75);
        assert_abs_diff_eq!(down.contact_point, Vec3::ZERO);
    }

    #[test]
    fn test_sphere_and_sphere() {
        let mut data = data();
        let one = sphere_at(Vec3::new(1.5, 0.0, 0.0), 1.0);
        let two = sphere_at(Vec3::ZERO, 1.0);
        assert_eq!(sphere_and_sphere(&one, &two, &mut data), 1);

        let contact = data.contacts()[0];
        assert_abs_diff_eq!(contact.contact_normal, Vec3::X);
        assert_abs_diff_eq!(contact.penetration, 0.5);
        assert_abs_diff_eq!(contact.contact_point, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_and_sphere_unequal_radii() {
        let mut data = data();
        let one = sphere_at(Vec3::new(2.5, 0.0, 0.0), 2.0);
        let two = sphere_at(Vec3::ZERO, 1.0);
        assert_eq!(sphere_and_sphere(&one, &two, &mut data), 1);

        // On the surface of sphere one
        let contact = data.contacts()[0];
        assert_abs_diff_eq!(contact.penetration, 0.5);
        assert_abs_diff_eq!(contact.contact_point, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_and_sphere_degenerate() {
        let mut data = data();
        let a = sphere_at(Vec3::ZERO, 1.0);
        assert_eq!(sphere_and_sphere(&a, &a, &mut data), 0);
        assert_eq!(sphere_and_sphere(&a, &sphere_at(Vec3::new(2.0, 0.0, 0.0), 1.0), &mut data), 0);
    }

    #[test]
    fn test_box_on_ground_has_four_contacts() {
        let mut data = data();
        let cbox = box_at(Vec3::new(0.0, 0.9, 0.0), Vec3::ONE);
        assert_eq!(box_and_half_space(&cbox, &Plane::ground(), &mut data), 4);
        for contact in data.contacts() {
            assert_abs_diff_eq!(contact.penetration, 0.1, epsilon = 1e-6);
            assert_eq!(contact.contact_normal, Vec3::Y);
            assert_abs_diff_eq!(contact.contact_point.y, -0.05, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_box_above_ground_has_no_contacts() {
        let mut data = data();
        let hovering = box_at(Vec3::new(0.0, 0.55, 0.0), Vec3::splat(0.5));
        assert_eq!(box_and_half_space(&hovering, &Plane::ground(), &mut data), 0);
        assert!(data.is_empty());

        let touching = box_at(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        assert_eq!(box_and_half_space(&touching, &Plane::ground(), &mut data), 4);
        for contact in data.contacts() {
            assert_eq!(contact.penetration, 0.0);
        }
    }

    #[test]
    fn test_box_on_ground_respects_budget() {
        let mut data = CollisionData::new(3, CollisionConfig::default());
        let cbox = box_at(Vec3::new(0.0, 0.9, 0.0), Vec3::ONE);
        assert_eq!(box_and_half_space(&cbox, &Plane::ground(), &mut data), 3);
        assert_eq!(data.contacts_left(), 0);
        assert_eq!(sphere_and_half_space(&sphere_at(Vec3::ZERO, 1.0), &Plane::ground(), &mut data), 0);
    }

    #[test]
    fn test_box_and_sphere_face() {
        let mut data = data();
        let cbox = box_at(Vec3::ZERO, Vec3::ONE);
        let sphere = sphere_at(Vec3::new(0.0, 1.5, 0.0), 1.0);
        assert_eq!(box_and_sphere(&cbox, &sphere, &mut data), 1);

        let contact = data.contacts()[0];
        assert_abs_diff_eq!(contact.contact_normal, -Vec3::Y);
        assert_abs_diff_eq!(contact.penetration, 0.5);
        assert_abs_diff_eq!(contact.contact_point, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_box_and_sphere_corner_miss() {
        let mut data = data();
        let cbox = box_at(Vec3::ZERO, Vec3::ONE);
        // Inside the slab tests but farther than the radius from the corner
        let sphere = sphere_at(Vec3::new(1.8, 1.8, 1.8), 1.0);
        assert_eq!(box_and_sphere(&cbox, &sphere, &mut data), 0);
    }

    #[test]
    fn test_box_and_sphere_centre_inside() {
        let mut data = data();
        let cbox = box_at(Vec3::ZERO, Vec3::ONE);
        let sphere = sphere_at(Vec3::new(0.0, 0.0, 0.8), 0.5);
        assert_eq!(box_and_sphere(&cbox, &sphere, &mut data), 1);

        let contact = data.contacts()[0];
        assert!(contact.contact_normal.is_finite());
        assert_abs_diff_eq!(contact.contact_normal, -Vec3::Z);
        assert_abs_diff_eq!(contact.penetration, 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.contact_point, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_box_and_point() {
        let mut data = data();
        let cbox = CollisionBox::new(
            None,
            Vec3::ONE,
            Mat4::from_orientation_and_position(Quat::from_axis_angle(Vec3::Y, FRAC_PI_4), Vec3::ZERO),
        );
        assert_eq!(box_and_point(&cbox, Vec3::new(0.0, 0.9, 0.0), &mut data), 1);
        let contact = data.contacts()[0];
        assert_abs_diff_eq!(contact.penetration, 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.contact_normal, -Vec3::Y, epsilon = 1e-6);

        assert_eq!(box_and_point(&cbox, Vec3::new(0.0, 1.1, 0.0), &mut data), 0);
    }
}
