use std::any::Any;

use crate::dynamics::{BodyView, RigidBody};
use crate::math::{Mat3, Vec3};

use super::ForceGenerator;

/// An aerodynamic surface.
///
/// The air velocity at the body (body velocity plus wind) is taken into body
/// space, multiplied by `tensor` and the resulting force is applied at
/// `position` on the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aero {
    /// Converts body-space air velocity into body-space force
    pub tensor: Mat3,
    /// Point of application in body space
    pub position: Vec3,
    /// Wind velocity in world space
    pub windspeed: Vec3,
}

impl Aero {
    pub fn new(tensor: Mat3, position: Vec3, windspeed: Vec3) -> Self {
        Self {
            tensor,
            position,
            windspeed,
        }
    }

    /// World-space force the surface would produce with `tensor`
    pub fn force_from_tensor(&self, body: &RigidBody, tensor: Mat3) -> Vec3 {
        let velocity = body.velocity + self.windspeed;
        let body_velocity = body.direction_in_local_space(velocity);
        let body_force = tensor * body_velocity;
        body.direction_in_world_space(body_force)
    }

    fn apply(&self, body: &mut RigidBody, tensor: Mat3) {
        let force = self.force_from_tensor(body, tensor);
        if force != Vec3::ZERO {
            body.add_force_at_body_point(force, self.position);
        }
    }
}

impl ForceGenerator for Aero {
    fn update_force(&mut self, body: &mut RigidBody, _others: &BodyView<'_>, _dt: f32) {
        self.apply(body, self.tensor);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A control surface whose tensor blends between `min_tensor`, the base
/// tensor and `max_tensor` according to a control setting in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroControl {
    pub aero: Aero,
    pub min_tensor: Mat3,
    pub max_tensor: Mat3,
    control_setting: f32,
}

impl AeroControl {
    pub fn new(base: Mat3, min: Mat3, max: Mat3, position: Vec3, windspeed: Vec3) -> Self {
        Self {
            aero: Aero::new(base, position, windspeed),
            min_tensor: min,
            max_tensor: max,
            control_setting: 0.0,
        }
    }

    /// Sets the control position; clamped to [-1, 1]
    pub fn set_control(&mut self, value: f32) {
        self.control_setting = value.clamp(-1.0, 1.0);
    }

    /// Current control position
    pub fn control(&self) -> f32 {
        self.control_setting
    }

    /// Tensor for the current control position
    pub fn tensor(&self) -> Mat3 {
        let c = self.control_setting;
        if c <= -1.0 {
            self.min_tensor
        } else if c >= 1.0 {
            self.max_tensor
        } else if c < 0.0 {
            Mat3::linear_interpolate(self.min_tensor, self.aero.tensor, c + 1.0)
        } else if c > 0.0 {
            Mat3::linear_interpolate(self.aero.tensor, self.max_tensor, c)
        } else {
            self.aero.tensor
        }
    }
}

impl ForceGenerator for AeroControl {
    fn update_force(&mut self, body: &mut RigidBody, _others: &BodyView<'_>, _dt: f32) {
        let tensor = self.tensor();
        self.aero.apply(body, tensor);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
