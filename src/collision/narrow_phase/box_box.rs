use crate::collision::contact::CollisionData;
use crate::collision::primitive::CollisionBox;
use crate::math::Vec3;

use super::intersection::{box_axes, penetration_on_axis, DEGENERATE_AXIS_SQ};

/// Segments closer to parallel than this (in the closest-point
/// denominator) use the fallback edge point
const PARALLEL_EPSILON: f32 = 1e-4;

/// Box against box by the separating-axis theorem.
///
/// The axis of least overlap decides the contact: a face axis gives a
/// vertex-face contact, a cross-product axis an edge-edge contact. Writes at
/// most one contact.
pub fn box_and_box(one: &CollisionBox, two: &CollisionBox, data: &mut CollisionData) -> usize {
    if !data.has_more_contacts() {
        return 0;
    }

    let to_centre = two.center() - one.center();
    let axes = box_axes(one, two);

    let mut best: Option<(usize, f32)> = None;
    let mut best_single_axis = None;
    for (index, &axis) in axes.iter().enumerate() {
        if index == 6 {
            best_single_axis = best.map(|(i, _)| i);
        }
        if axis.length_squared() < DEGENERATE_AXIS_SQ {
            continue;
        }
        let overlap = penetration_on_axis(one, two, axis.normalize(), to_centre);
        if overlap < 0.0 {
            return 0;
        }
        if best.map_or(true, |(_, smallest)| overlap < smallest) {
            best = Some((index, overlap));
        }
    }
    let Some((best, penetration)) = best else {
        return 0;
    };

    if best < 3 {
        return point_face_contact(one, two, to_centre, best, penetration, data);
    }
    if best < 6 {
        return point_face_contact(two, one, -to_centre, best - 3, penetration, data);
    }

    // Edge-edge
    let edge = best - 6;
    let (one_index, two_index) = (edge / 3, edge % 3);
    let one_axis = one.axis(one_index);
    let two_axis = two.axis(two_index);
    let mut axis = one_axis.cross(two_axis).normalize();
    if axis.dot(to_centre) > 0.0 {
        axis = -axis;
    }

    // Midpoints of the two edges that touch
    let mut on_one = one.half_size;
    let mut on_two = two.half_size;
    for i in 0..3 {
        if i == one_index {
            on_one[i] = 0.0;
        } else if one.axis(i).dot(axis) > 0.0 {
            on_one[i] = -on_one[i];
        }
        if i == two_index {
            on_two[i] = 0.0;
        } else if two.axis(i).dot(axis) < 0.0 {
            on_two[i] = -on_two[i];
        }
    }
    let on_one = one.transform.transform_point(on_one);
    let on_two = two.transform.transform_point(on_two);

    let use_one = best_single_axis.map_or(false, |i| i > 2);
    let point = edge_contact_point(
        (on_one, one_axis, one.half_size[one_index]),
        (on_two, two_axis, two.half_size[two_index]),
        use_one,
    );
    usize::from(data.add_contact([one.body, two.body], point, axis, penetration))
}

/// Writes the contact for a vertex of `two` resting on face `axis` of `one`
fn point_face_contact(
    one: &CollisionBox,
    two: &CollisionBox,
    to_centre: Vec3,
    axis: usize,
    penetration: f32,
    data: &mut CollisionData,
) -> usize {
    let mut normal = one.axis(axis);
    if normal.dot(to_centre) > 0.0 {
        normal = -normal;
    }

    // The vertex of two deepest along the normal
    let mut vertex = two.half_size;
    for i in 0..3 {
        if two.axis(i).dot(normal) < 0.0 {
            vertex[i] = -vertex[i];
        }
    }
    let point = two.transform.transform_point(vertex);
    usize::from(data.add_contact([one.body, two.body], point, normal, penetration))
}

/// Closest point between two edges, each given as (midpoint, direction,
/// half length).
///
/// Parallel edges, or a closest point beyond either edge's end, fall back
/// to one of the midpoints.
fn edge_contact_point(one: (Vec3, Vec3, f32), two: (Vec3, Vec3, f32), use_one: bool) -> Vec3 {
    let (p_one, d_one, one_size) = one;
    let (p_two, d_two, two_size) = two;
    let fallback = if use_one { p_one } else { p_two };

    let sm_one = d_one.length_squared();
    let sm_two = d_two.length_squared();
    let dp_one_two = d_two.dot(d_one);

    let to_start = p_one - p_two;
    let dp_sta_one = d_one.dot(to_start);
    let dp_sta_two = d_two.dot(to_start);

    let denom = sm_one * sm_two - dp_one_two * dp_one_two;
    if denom.abs() < PARALLEL_EPSILON {
        return fallback;
    }

    let mua = (dp_one_two * dp_sta_two - sm_two * dp_sta_one) / denom;
    let mub = (sm_one * dp_sta_two - dp_one_two * dp_sta_one) / denom;
    if mua.abs() > one_size || mub.abs() > two_size {
        return fallback;
    }

    let c_one = p_one + d_one * mua;
    let c_two = p_two + d_two * mub;
    (c_one + c_two) * 0.5
}
