use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::geometry::Shape;
use crate::math::{Mat3, Mat4, Quat, Vec3};

/// Default motion threshold below which a body is put to sleep
pub const DEFAULT_SLEEP_EPSILON: f32 = 0.3;

/// A rigid body in the physics simulation.
///
/// `transform` and the world-space inverse inertia tensor are derived from
/// the pose by [`RigidBody::calculate_derived_data`]; they are read-only to
/// everything outside the integrator and the contact resolver.
#[derive(Debug, Clone)]
pub struct RigidBody {
    // Pose
    /// Position of the centre of mass in world space
    pub position: Vec3,
    /// Orientation; kept at unit length
    pub orientation: Quat,

    // Velocities
    /// Linear velocity
    pub velocity: Vec3,
    /// Angular velocity (in radians per second)
    pub angular_velocity: Vec3,
    /// Constant acceleration (usually gravity)
    pub acceleration: Vec3,

    // Mass properties
    /// Inverse mass (0 for infinite mass)
    inv_mass: f32,
    /// Body space inverse inertia tensor
    inv_inertia_local: Mat3,

    // Derived
    inv_inertia_world: Mat3,
    transform: Mat4,

    // Accumulators
    force: Vec3,
    torque: Vec3,
    last_frame_acceleration: Vec3,

    // Damping
    /// Fraction of linear velocity kept per second
    pub linear_damping: f32,
    /// Fraction of angular velocity kept per second
    pub angular_damping: f32,

    // Sleep
    is_awake: bool,
    can_sleep: bool,
    motion: f32,
    sleep_epsilon: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            inv_mass: 1.0,
            inv_inertia_local: Mat3::IDENTITY,
            inv_inertia_world: Mat3::IDENTITY,
            transform: Mat4::IDENTITY,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            last_frame_acceleration: Vec3::ZERO,
            linear_damping: 0.99,
            angular_damping: 0.99,
            is_awake: true,
            can_sleep: true,
            motion: 2.0 * DEFAULT_SLEEP_EPSILON,
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
        };
        body.calculate_derived_data();
        body
    }
}

impl RigidBody {
    /// Creates a unit-mass body at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the world transform and world-space inverse inertia tensor
    /// from the current pose. Also renormalizes the orientation.
    pub fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = Mat4::from_orientation_and_position(self.orientation, self.position);
        self.inv_inertia_world = if self.has_finite_mass() {
            let rot = self.transform.linear();
            rot * self.inv_inertia_local * rot.transpose()
        } else {
            Mat3::ZERO
        };
    }

    // Mass

    /// Returns the inverse mass
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Sets the inverse mass; 0 makes the body immovable
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        assert!(inverse_mass >= 0.0, "inverse mass must be non-negative, got {inverse_mass}");
        self.inv_mass = inverse_mass;
        self.calculate_derived_data();
    }

    /// Sets the mass. An infinite mass makes the body immovable.
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if !(mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        self.set_inverse_mass(1.0 / mass);
        Ok(())
    }

    /// Returns the mass (infinity for immovable bodies)
    pub fn mass(&self) -> f32 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            f32::INFINITY
        }
    }

    /// Returns true if this body has finite mass
    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inv_mass > 0.0
    }

    /// Sets the body-space inertia tensor; stores its inverse.
    pub fn set_inertia_tensor(&mut self, inertia: Mat3) -> Result<()> {
        self.inv_inertia_local = inertia.inverse()?;
        self.calculate_derived_data();
        Ok(())
    }

    /// Sets the body-space inverse inertia tensor directly
    pub fn set_inverse_inertia_tensor(&mut self, inverse: Mat3) {
        self.inv_inertia_local = inverse;
        self.calculate_derived_data();
    }

    /// Body-space inverse inertia tensor
    #[inline]
    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        self.inv_inertia_local
    }

    /// World-space inverse inertia tensor
    #[inline]
    pub fn inverse_inertia_tensor_world(&self) -> Mat3 {
        self.inv_inertia_world
    }

    /// Sets both damping factors; each must lie in [0, 1]
    pub fn set_damping(&mut self, linear: f32, angular: f32) -> Result<()> {
        for value in [linear, angular] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PhysicsError::InvalidDamping(value));
            }
        }
        self.linear_damping = linear;
        self.angular_damping = angular;
        Ok(())
    }

    // Derived data

    /// World transform of the body
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Acceleration applied during the last integration step
    #[inline]
    pub fn last_frame_acceleration(&self) -> Vec3 {
        self.last_frame_acceleration
    }

    /// Accumulated force for the current step
    #[inline]
    pub fn accumulated_force(&self) -> Vec3 {
        self.force
    }

    /// Accumulated torque for the current step
    #[inline]
    pub fn accumulated_torque(&self) -> Vec3 {
        self.torque
    }

    // Space conversion

    /// Converts a world point into body space
    #[inline]
    pub fn point_in_local_space(&self, point: Vec3) -> Vec3 {
        self.transform.transform_inverse_point(point)
    }

    /// Converts a body-space point into world space
    #[inline]
    pub fn point_in_world_space(&self, point: Vec3) -> Vec3 {
        self.transform.transform_point(point)
    }

    /// Converts a world direction into body space
    #[inline]
    pub fn direction_in_local_space(&self, direction: Vec3) -> Vec3 {
        self.transform.transform_inverse_direction(direction)
    }

    /// Converts a body-space direction into world space
    #[inline]
    pub fn direction_in_world_space(&self, direction: Vec3) -> Vec3 {
        self.transform.transform_direction(direction)
    }

    // Forces

    /// Adds a force at the centre of mass
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
        self.set_awake(true);
    }

    /// Adds a force at a point given in world space
    pub fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        let arm = point - self.position;
        self.force += force;
        self.torque += arm.cross(force);
        self.set_awake(true);
    }

    /// Adds a force at a point given in body space
    pub fn add_force_at_body_point(&mut self, force: Vec3, point: Vec3) {
        let world = self.point_in_world_space(point);
        self.add_force_at_point(force, world);
    }

    /// Adds a torque
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
        self.set_awake(true);
    }

    /// Clears the force and torque accumulators
    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    // Impulses

    /// Applies an impulse at the centre of mass
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse * self.inv_mass;
        self.set_awake(true);
    }

    /// Applies an impulse at a world point
    pub fn apply_impulse_at_point(&mut self, impulse: Vec3, point: Vec3) {
        self.velocity += impulse * self.inv_mass;
        let arm = point - self.position;
        self.angular_velocity += self.inv_inertia_world * arm.cross(impulse);
        self.set_awake(true);
    }

    /// Adds directly to the linear velocity
    #[inline]
    pub fn add_velocity(&mut self, delta: Vec3) {
        self.velocity += delta;
    }

    /// Adds directly to the angular velocity
    #[inline]
    pub fn add_rotation(&mut self, delta: Vec3) {
        self.angular_velocity += delta;
    }

    /// Gets the velocity at a world point
    pub fn velocity_at_point(&self, point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - self.position)
    }

    // Sleep

    /// Returns true if the body is being simulated
    #[inline]
    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    /// Returns true if the body may fall asleep
    #[inline]
    pub fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    /// Current recency-weighted motion estimate
    #[inline]
    pub fn motion(&self) -> f32 {
        self.motion
    }

    /// Motion threshold below which the body sleeps
    #[inline]
    pub fn sleep_epsilon(&self) -> f32 {
        self.sleep_epsilon
    }

    /// Sets the sleep threshold
    pub fn set_sleep_epsilon(&mut self, epsilon: f32) {
        self.sleep_epsilon = epsilon.max(0.0);
    }

    /// Wakes the body or puts it to sleep. Sleeping zeroes both velocities.
    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            self.is_awake = true;
            // Avoid falling straight back to sleep
            self.motion = self.sleep_epsilon * 2.0;
        } else {
            self.is_awake = false;
            self.velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
        }
    }

    /// Allows or forbids sleeping; forbidding it wakes the body
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep;
        if !can_sleep && !self.is_awake {
            self.set_awake(true);
        }
    }

    /// Folds this step's kinetic activity into the motion estimate and puts
    /// the body to sleep when it falls below the threshold.
    pub(crate) fn update_sleep(&mut self, dt: f32) {
        if !self.can_sleep {
            return;
        }

        let current = self.velocity.length_squared() + self.angular_velocity.length_squared();
        let bias = 0.5f32.powf(dt);
        self.motion = bias * self.motion + (1.0 - bias) * current;

        if self.motion < self.sleep_epsilon {
            self.set_awake(false);
        } else if self.motion > 10.0 * self.sleep_epsilon {
            self.motion = 10.0 * self.sleep_epsilon;
        }
    }

    pub(crate) fn set_last_frame_acceleration(&mut self, acceleration: Vec3) {
        self.last_frame_acceleration = acceleration;
    }
}

/// Description for creating a rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyDesc {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Mass; `None` makes the body immovable
    pub mass: Option<f32>,
    /// Explicit inertia tensor, overriding the one derived from `shape`
    pub inertia_tensor: Option<Mat3>,
    /// Collision shape; also used to derive the inertia tensor
    pub shape: Option<Shape>,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub can_sleep: bool,
    pub sleep_epsilon: f32,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: Some(1.0),
            inertia_tensor: None,
            shape: None,
            linear_damping: 0.99,
            angular_damping: 0.99,
            can_sleep: true,
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
        }
    }
}

impl RigidBodyDesc {
    /// Creates a new dynamic body description
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// Creates an immovable body description
    pub fn fixed() -> Self {
        Self {
            mass: None,
            can_sleep: false,
            ..Self::default()
        }
    }

    /// Sets the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Sets the mass; infinity makes the body immovable
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = (mass != f32::INFINITY).then_some(mass);
        self
    }

    /// Sets the shape
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Sets an explicit inertia tensor
    pub fn with_inertia_tensor(mut self, inertia: Mat3) -> Self {
        self.inertia_tensor = Some(inertia);
        self
    }

    /// Sets both damping factors
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Allows or forbids sleeping
    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Builds the body, validating mass and damping.
    ///
    /// The inertia tensor comes from `inertia_tensor` if set, else from
    /// `shape`, else from a unit sphere of the given mass.
    pub fn build(&self) -> Result<RigidBody> {
        let inverse_mass = match self.mass {
            None => 0.0,
            Some(mass) if mass > 0.0 => 1.0 / mass,
            Some(mass) => return Err(PhysicsError::InvalidMass(mass)),
        };

        let mut body = RigidBody {
            position: self.position,
            orientation: self.orientation,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            ..RigidBody::default()
        };
        body.set_damping(self.linear_damping, self.angular_damping)?;
        body.inv_mass = inverse_mass;
        body.sleep_epsilon = self.sleep_epsilon.max(0.0);
        body.motion = 2.0 * body.sleep_epsilon;
        body.can_sleep = self.can_sleep;

        body.inv_inertia_local = match self.mass {
            Some(mass) => {
                let inertia = match (self.inertia_tensor, self.shape) {
                    (Some(inertia), _) => inertia,
                    (None, Some(shape)) => shape.inertia_tensor(mass),
                    (None, None) => Mat3::sphere_inertia_tensor(1.0, mass),
                };
                inertia.inverse()?
            }
            None => Mat3::ZERO,
        };

        body.calculate_derived_data();
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MathError;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_body_creation() {
        let body = RigidBodyDesc::dynamic()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_mass(2.0)
            .build()
            .unwrap();

        assert_eq!(body.position, Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(body.inverse_mass(), 0.5);
        assert_eq!(body.transform().translation(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_fixed_body() {
        let body = RigidBodyDesc::fixed().build().unwrap();
        assert!(!body.has_finite_mass());
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.inverse_inertia_tensor_world(), Mat3::ZERO);
    }

    #[test]
    fn test_invalid_desc() {
        let err = RigidBodyDesc::dynamic().with_mass(-1.0).build().unwrap_err();
        assert_eq!(err, PhysicsError::InvalidMass(-1.0));

        let err = RigidBodyDesc::dynamic().with_damping(1.5, 0.5).build().unwrap_err();
        assert_eq!(err, PhysicsError::InvalidDamping(1.5));

        let err = RigidBodyDesc::dynamic()
            .with_inertia_tensor(Mat3::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, PhysicsError::Math(MathError::SingularMatrix { .. })));
    }

    #[test]
    fn test_shape_inertia() {
        let body = RigidBodyDesc::dynamic()
            .with_mass(3.0)
            .with_shape(Shape::cuboid(Vec3::ONE))
            .build()
            .unwrap();
        // Cube with half-size 1 and mass 3 has I = 2 on every axis
        assert_abs_diff_eq!(body.inverse_inertia_tensor().get(0, 0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_world_inertia_rotates() {
        let mut body = RigidBodyDesc::dynamic()
            .with_inertia_tensor(Mat3::from_diagonal(Vec3::new(1.0, 2.0, 4.0)))
            .build()
            .unwrap();
        body.orientation = Quat::from_axis_angle(Vec3::Z, PI / 2.0);
        body.calculate_derived_data();
        // After a quarter turn about Z the x and y moments swap
        let world = body.inverse_inertia_tensor_world();
        assert_abs_diff_eq!(world.get(0, 0), 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(world.get(1, 1), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_force_at_point_generates_torque() {
        let mut body = RigidBody::new();
        body.add_force_at_point(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(body.accumulated_force(), Vec3::Y);
        assert_eq!(body.accumulated_torque(), Vec3::Z);

        body.clear_accumulators();
        assert_eq!(body.accumulated_torque(), Vec3::ZERO);
    }

    #[test]
    fn test_space_conversion() {
        let mut body = RigidBody::new();
        body.position = Vec3::new(0.0, 5.0, 0.0);
        body.orientation = Quat::from_axis_angle(Vec3::Y, PI / 2.0);
        body.calculate_derived_data();

        let local = Vec3::new(1.0, 0.0, 0.0);
        let world = body.point_in_world_space(local);
        assert_abs_diff_eq!(world, Vec3::new(0.0, 5.0, -1.0), epsilon = 1e-5);
        assert_abs_diff_eq!(body.point_in_local_space(world), local, epsilon = 1e-5);
        assert_abs_diff_eq!(
            body.direction_in_local_space(body.direction_in_world_space(Vec3::Z)),
            Vec3::Z,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_apply_impulse_wakes() {
        let mut body = RigidBody::new();
        body.set_awake(false);
        body.apply_impulse(Vec3::new(1.0, 0.0, 0.0));
        assert!(body.is_awake());
        assert_eq!(body.velocity, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_velocity_at_point() {
        let mut body = RigidBody::new();
        body.velocity = Vec3::new(1.0, 0.0, 0.0);
        body.angular_velocity = Vec3::new(0.0, 0.0, 1.0);

        // (0, 0, 1) x (0, 1, 0) = (-1, 0, 0) cancels the linear part
        let vel = body.velocity_at_point(Vec3::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(vel, Vec3::ZERO);
    }

    #[test]
    fn test_sleep_zeroes_velocity() {
        let mut body = RigidBody::new();
        body.velocity = Vec3::ONE;
        body.set_awake(false);
        assert!(!body.is_awake());
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_motion_is_capped() {
        let mut body = RigidBody::new();
        body.velocity = Vec3::new(100.0, 0.0, 0.0);
        body.update_sleep(1.0);
        assert_abs_diff_eq!(body.motion(), 10.0 * DEFAULT_SLEEP_EPSILON);
    }

    #[test]
    fn test_desc_deserializes_with_defaults() {
        let desc: RigidBodyDesc = serde_json::from_str(r#"{ "mass": 4.0 }"#).unwrap();
        assert_eq!(desc.mass, Some(4.0));
        assert_eq!(desc.linear_damping, 0.99);
        assert!(desc.shape.is_none());
    }

    #[test]
    fn test_fixed_desc_survives_json() {
        let desc = RigidBodyDesc::fixed()
            .with_position(Vec3::new(0.0, -1.0, 0.0))
            .with_shape(Shape::cuboid(Vec3::new(10.0, 1.0, 10.0)));
        let json = serde_json::to_string(&desc).unwrap();
        let back: RigidBodyDesc = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mass, None);

        let body = back.build().unwrap();
        assert!(!body.has_finite_mass());
        assert_eq!(body.position, Vec3::new(0.0, -1.0, 0.0));

        // An infinite mass means the same thing
        assert_eq!(RigidBodyDesc::dynamic().with_mass(f32::INFINITY).mass, None);
    }
}
