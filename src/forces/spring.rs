use std::any::Any;

use crate::dynamics::{BodyHandle, BodyView, RigidBody};
use crate::math::Vec3;

use super::ForceGenerator;

/// A Hooke's-law spring between a point on the body it is registered on and
/// a point on another body. Both points are given in body space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Attachment point on the registered body
    pub connection_point: Vec3,
    /// The body at the other end
    pub other: BodyHandle,
    /// Attachment point on the other body
    pub other_connection_point: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl Spring {
    pub fn new(
        connection_point: Vec3,
        other: BodyHandle,
        other_connection_point: Vec3,
        spring_constant: f32,
        rest_length: f32,
    ) -> Self {
        Self {
            connection_point,
            other,
            other_connection_point,
            spring_constant,
            rest_length,
        }
    }

    /// Force on the end at `from` given the other end at `to`.
    ///
    /// Zero when the ends coincide.
    pub fn force_between(&self, from: Vec3, to: Vec3) -> Vec3 {
        let span = from - to;
        let Some(direction) = span.try_normalize() else {
            return Vec3::ZERO;
        };
        let magnitude = -self.spring_constant * (span.length() - self.rest_length);
        direction * magnitude
    }
}

impl ForceGenerator for Spring {
    fn update_force(&mut self, body: &mut RigidBody, others: &BodyView<'_>, _dt: f32) {
        let Some(other) = others.get(self.other) else {
            return;
        };
        let here = body.point_in_world_space(self.connection_point);
        let there = other.point_in_world_space(self.other_connection_point);

        let force = self.force_between(here, there);
        if force != Vec3::ZERO {
            body.add_force_at_point(force, here);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{BodySet, RigidBodyDesc};
    use crate::forces::ForceRegistry;
    use approx::assert_abs_diff_eq;

    fn pair(distance: f32) -> (BodySet, BodyHandle, BodyHandle) {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBodyDesc::dynamic().build().unwrap());
        let b = bodies.insert(
            RigidBodyDesc::dynamic()
                .with_position(Vec3::new(distance, 0.0, 0.0))
                .build()
                .unwrap(),
        );
        (bodies, a, b)
    }

    #[test]
    fn test_stretched_spring_pulls_together() {
        let (mut bodies, a, b) = pair(15.0);
        let mut registry = ForceRegistry::new();
        let on_a = registry.add_generator(Spring::new(Vec3::ZERO, b, Vec3::ZERO, 5.0, 10.0));
        let on_b = registry.add_generator(Spring::new(Vec3::ZERO, a, Vec3::ZERO, 5.0, 10.0));
        registry.register(a, on_a).unwrap();
        registry.register(b, on_b).unwrap();
        registry.update_forces(&mut bodies, 0.1);

        assert_abs_diff_eq!(bodies.get(a).unwrap().accumulated_force(), Vec3::new(25.0, 0.0, 0.0), epsilon = 1e-4);
        assert_abs_diff_eq!(bodies.get(b).unwrap().accumulated_force(), Vec3::new(-25.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_compressed_spring_pushes_apart() {
        let (_, _, b) = pair(1.0);
        let spring = Spring::new(Vec3::ZERO, b, Vec3::ZERO, 2.0, 4.0);
        let force = spring.force_between(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(force, Vec3::new(-6.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_off_centre_attachment_adds_torque() {
        let (mut bodies, a, b) = pair(5.0);
        let mut registry = ForceRegistry::new();
        let spring = registry.add_generator(Spring::new(Vec3::new(0.0, 1.0, 0.0), b, Vec3::ZERO, 1.0, 1.0));
        registry.register(a, spring).unwrap();
        registry.update_forces(&mut bodies, 0.1);
        assert!(bodies.get(a).unwrap().accumulated_torque().length() > 0.0);
    }

    #[test]
    fn test_missing_other_body_is_silent() {
        let (mut bodies, a, b) = pair(5.0);
        bodies.remove(b);
        let mut registry = ForceRegistry::new();
        let spring = registry.add_generator(Spring::new(Vec3::ZERO, b, Vec3::ZERO, 1.0, 1.0));
        registry.register(a, spring).unwrap();
        registry.update_forces(&mut bodies, 0.1);
        assert_eq!(bodies.get(a).unwrap().accumulated_force(), Vec3::ZERO);
    }
}
