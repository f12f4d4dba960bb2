//! Narrow phase: exact tests that turn candidate pairs into contacts.

mod box_box;
mod detector;
pub mod intersection;

use crate::geometry::Plane;

use super::contact::CollisionData;
use super::primitive::Primitive;

pub use box_box::box_and_box;
pub use detector::{
    box_and_half_space, box_and_point, box_and_sphere, sphere_and_half_space, sphere_and_sphere,
    sphere_and_true_plane,
};

/// Generates contacts between two primitives, whatever their kinds.
///
/// Returns the number of contacts written.
pub fn collide(one: &Primitive, two: &Primitive, data: &mut CollisionData) -> usize {
    match (one, two) {
        (Primitive::Sphere(a), Primitive::Sphere(b)) => sphere_and_sphere(a, b, data),
        (Primitive::Box(a), Primitive::Sphere(b)) => box_and_sphere(a, b, data),
        (Primitive::Sphere(a), Primitive::Box(b)) => box_and_sphere(b, a, data),
        (Primitive::Box(a), Primitive::Box(b)) => box_and_box(a, b, data),
    }
}

/// Generates contacts between a primitive and a static half-space
pub fn collide_half_space(primitive: &Primitive, plane: &Plane, data: &mut CollisionData) -> usize {
    match primitive {
        Primitive::Sphere(sphere) => sphere_and_half_space(sphere, plane, data),
        Primitive::Box(cbox) => box_and_half_space(cbox, plane, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::CollisionConfig;
    use crate::collision::primitive::{CollisionBox, CollisionSphere};
    use crate::dynamics::{BodySet, RigidBody};
    use crate::math::{Mat4, Vec3};

    #[test]
    fn test_collide_keeps_normal_convention() {
        let mut bodies = BodySet::new();
        let sphere_body = bodies.insert(RigidBody::new());
        let box_body = bodies.insert(RigidBody::new());
        let sphere = Primitive::Sphere(CollisionSphere::new(
            Some(sphere_body),
            1.0,
            Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)),
        ));
        let cbox = Primitive::Box(CollisionBox::new(Some(box_body), Vec3::ONE, Mat4::IDENTITY));

        // Either argument order yields the same contact
        for (one, two) in [(&sphere, &cbox), (&cbox, &sphere)] {
            let mut data = CollisionData::new(4, CollisionConfig::default());
            assert_eq!(collide(one, two, &mut data), 1);
            let contact = data.contacts()[0];
            assert_eq!(contact.bodies, [Some(box_body), Some(sphere_body)]);
            assert!(contact.contact_normal.y < 0.0);
        }
    }

    #[test]
    fn test_collide_half_space() {
        let mut data = CollisionData::new(16, CollisionConfig::default());
        let sphere = Primitive::Sphere(CollisionSphere::new(None, 1.0, Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0))));
        let cbox = Primitive::Box(CollisionBox::new(None, Vec3::ONE, Mat4::from_translation(Vec3::new(5.0, 0.5, 0.0))));
        assert_eq!(collide_half_space(&sphere, &Plane::ground(), &mut data), 1);
        assert_eq!(collide_half_space(&cbox, &Plane::ground(), &mut data), 4);
        assert_eq!(data.len(), 5);
    }
}
