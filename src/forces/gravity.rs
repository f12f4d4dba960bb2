use std::any::Any;

use crate::dynamics::{BodyView, RigidBody};
use crate::math::Vec3;

use super::ForceGenerator;

/// Applies a gravitational force proportional to mass.
///
/// Bodies of infinite mass are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub gravity: Vec3,
}

impl Gravity {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(Vec3::GRAVITY)
    }
}

impl ForceGenerator for Gravity {
    fn update_force(&mut self, body: &mut RigidBody, _others: &BodyView<'_>, _dt: f32) {
        if !body.has_finite_mass() {
            return;
        }
        body.add_force(self.gravity * body.mass());
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

    #[test]
    fn test_force_scales_with_mass() {
        let mut bodies = BodySet::new();
        let heavy = bodies.insert(RigidBodyDesc::dynamic().with_mass(4.0).build().unwrap());
        let fixed = bodies.insert(RigidBodyDesc::fixed().build().unwrap());

        let mut registry = ForceRegistry::new();
        let gravity = registry.add_generator(Gravity::new(Vec3::new(0.0, -10.0, 0.0)));
        registry.register(heavy, gravity).unwrap();
        registry.register(fixed, gravity).unwrap();
        registry.update_forces(&mut bodies, 0.1);

        assert_eq!(bodies.get(heavy).unwrap().accumulated_force(), Vec3::new(0.0, -40.0, 0.0));
        assert_eq!(bodies.get(fixed).unwrap().accumulated_force(), Vec3::ZERO);
    }
}
