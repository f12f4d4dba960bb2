use log::warn;

use crate::collision::Contact;
use crate::dynamics::{BodyHandle, BodySet, RigidBody};
use crate::math::{Mat3, Vec3};

/// Velocity and rotation changes one resolution step applied to each body
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityChange {
    pub linear: [Vec3; 2],
    pub angular: [Vec3; 2],
}

/// Position and orientation changes one resolution step applied to each body
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionChange {
    pub linear: [Vec3; 2],
    pub angular: [Vec3; 2],
}

/// Mutable access to a contact's bodies. A missing or duplicated handle
/// comes back as `None`.
fn bodies_mut(set: &mut BodySet, handles: [Option<BodyHandle>; 2]) -> [Option<&mut RigidBody>; 2] {
    match handles {
        [Some(a), Some(b)] if a != b => set
            .get_pair_mut(a, b)
            .map_or([None, None], |(one, two)| [Some(one), Some(two)]),
        [Some(a), _] => [set.get_mut(a), None],
        [None, Some(b)] => [None, set.get_mut(b)],
        [None, None] => [None, None],
    }
}

fn bodies_ref(set: &BodySet, handles: [Option<BodyHandle>; 2]) -> [Option<&RigidBody>; 2] {
    [handles[0].and_then(|h| set.get(h)), handles[1].and_then(|h| set.get(h))]
}

impl Contact {
    /// Swaps the two bodies, reversing the normal
    pub(crate) fn swap_bodies(&mut self) {
        self.contact_normal = -self.contact_normal;
        self.bodies.swap(0, 1);
    }

    /// Prepares the scratch data the resolver works from: contact basis,
    /// contact-relative positions, closing velocity and the desired change.
    pub(crate) fn calculate_internals(&mut self, bodies: &BodySet, dt: f32, restitution_limit: f32) {
        // The first body must be real
        if self.bodies[0].is_none() {
            self.swap_bodies();
        }
        self.calculate_contact_basis();

        let [one, two] = bodies_ref(bodies, self.bodies);
        self.relative_contact_position = [
            one.map_or(Vec3::ZERO, |b| self.contact_point - b.position),
            two.map_or(Vec3::ZERO, |b| self.contact_point - b.position),
        ];

        self.contact_velocity = Vec3::ZERO;
        if let Some(one) = one {
            self.contact_velocity += self.local_velocity(one, 0, dt);
        }
        if let Some(two) = two {
            self.contact_velocity -= self.local_velocity(two, 1, dt);
        }

        self.calculate_desired_delta_velocity(bodies, dt, restitution_limit);
    }

    /// Builds an orthonormal basis with the contact normal as its x axis.
    ///
    /// The first tangent is built against whichever world axis is further
    /// from the normal.
    pub(crate) fn calculate_contact_basis(&mut self) {
        let n = self.contact_normal;
        let tangent = if n.x.abs() > n.y.abs() {
            let s = 1.0 / (n.z * n.z + n.x * n.x).sqrt();
            Vec3::new(n.z * s, 0.0, -n.x * s)
        } else {
            let s = 1.0 / (n.z * n.z + n.y * n.y).sqrt();
            Vec3::new(0.0, -n.z * s, n.y * s)
        };
        let bitangent = n.cross(tangent);
        self.contact_to_world = Mat3::from_components(n, tangent, bitangent);
    }

    /// Velocity of the contact point on one body, in contact space.
    ///
    /// Includes the velocity last step's acceleration built up along the
    /// tangents, so friction can cancel it.
    fn local_velocity(&self, body: &RigidBody, index: usize, dt: f32) -> Vec3 {
        let velocity = body.angular_velocity.cross(self.relative_contact_position[index]) + body.velocity;
        let mut contact_velocity = self.contact_to_world.transform_transpose(velocity);

        let mut acc_velocity = self
            .contact_to_world
            .transform_transpose(body.last_frame_acceleration() * dt);
        acc_velocity.x = 0.0;
        contact_velocity += acc_velocity;
        contact_velocity
    }

    /// Works out the velocity change along the normal that resolves the
    /// contact.
    ///
    /// Closing speeds below `restitution_limit` get no bounce, and the part
    /// of the closing speed caused by last step's acceleration is not
    /// reflected, so resting contacts stay at rest.
    pub(crate) fn calculate_desired_delta_velocity(&mut self, bodies: &BodySet, dt: f32, restitution_limit: f32) {
        let [one, two] = bodies_ref(bodies, self.bodies);
        let mut velocity_from_acc = 0.0;
        if let Some(one) = one.filter(|b| b.is_awake()) {
            velocity_from_acc += (one.last_frame_acceleration() * dt).dot(self.contact_normal);
        }
        if let Some(two) = two.filter(|b| b.is_awake()) {
            velocity_from_acc -= (two.last_frame_acceleration() * dt).dot(self.contact_normal);
        }

        let restitution = if self.contact_velocity.x.abs() < restitution_limit {
            0.0
        } else {
            self.restitution
        };

        self.desired_delta_velocity =
            -self.contact_velocity.x - restitution * (self.contact_velocity.x - velocity_from_acc);
    }

    /// Wakes a sleeping body that is touching an awake one. Contacts with
    /// the world never wake anything.
    pub(crate) fn match_awake_state(&self, bodies: &mut BodySet) {
        if let [Some(one), Some(two)] = bodies_mut(bodies, self.bodies) {
            // Only a moving body can wake another
            match (one.is_awake(), two.is_awake()) {
                (true, false) if one.has_finite_mass() => two.set_awake(true),
                (false, true) if two.has_finite_mass() => one.set_awake(true),
                _ => {}
            }
        }
    }

    /// Returns true if no body at this contact can move
    pub(crate) fn is_immovable(&self, bodies: &BodySet) -> bool {
        bodies_ref(bodies, self.bodies)
            .iter()
            .flatten()
            .all(|b| !b.has_finite_mass())
    }

    /// Applies the impulse that resolves the closing velocity, returning
    /// the changes made to each body.
    pub(crate) fn apply_velocity_change(&mut self, bodies: &mut BodySet) -> VelocityChange {
        let mut change = VelocityChange::default();
        let [one, two] = bodies_mut(bodies, self.bodies);
        let Some(one) = one else {
            return change;
        };

        let inverse_inertia = [
            one.inverse_inertia_tensor_world(),
            two.as_ref().map_or(Mat3::ZERO, |b| b.inverse_inertia_tensor_world()),
        ];
        let inverse_mass = [one.inverse_mass(), two.as_ref().map_or(0.0, |b| b.inverse_mass())];

        let impulse_contact = if self.friction == 0.0 {
            self.frictionless_impulse(&inverse_inertia, &inverse_mass)
        } else {
            self.friction_impulse(&inverse_inertia, &inverse_mass)
        };
        let impulse = self.contact_to_world * impulse_contact;

        let torque = self.relative_contact_position[0].cross(impulse);
        change.angular[0] = inverse_inertia[0] * torque;
        change.linear[0] = impulse * inverse_mass[0];
        one.add_velocity(change.linear[0]);
        one.add_rotation(change.angular[0]);

        if let Some(two) = two {
            let torque = impulse.cross(self.relative_contact_position[1]);
            change.angular[1] = inverse_inertia[1] * torque;
            change.linear[1] = impulse * -inverse_mass[1];
            two.add_velocity(change.linear[1]);
            two.add_rotation(change.angular[1]);
        }
        change
    }

    /// Impulse in contact space along the normal only
    fn frictionless_impulse(&self, inverse_inertia: &[Mat3; 2], inverse_mass: &[f32; 2]) -> Vec3 {
        let normal = self.contact_normal;
        let mut delta_velocity = 0.0;
        for i in 0..2 {
            let rel = self.relative_contact_position[i];
            let delta_vel_world = (inverse_inertia[i] * rel.cross(normal)).cross(rel);
            delta_velocity += delta_vel_world.dot(normal) + inverse_mass[i];
        }
        if delta_velocity <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(self.desired_delta_velocity / delta_velocity, 0.0, 0.0)
    }

    /// Impulse in contact space that also removes sliding, limited to the
    /// friction cone.
    fn friction_impulse(&self, inverse_inertia: &[Mat3; 2], inverse_mass: &[f32; 2]) -> Vec3 {
        // Velocity change per unit impulse, in world space
        let mut delta_vel_world = Mat3::ZERO;
        for i in 0..2 {
            let impulse_to_torque = Mat3::skew_symmetric(self.relative_contact_position[i]);
            delta_vel_world += (impulse_to_torque * inverse_inertia[i] * impulse_to_torque).scale(-1.0);
        }
        let total_inverse_mass = inverse_mass[0] + inverse_mass[1];

        let mut delta_velocity = self.contact_to_world.transpose() * delta_vel_world * self.contact_to_world;
        delta_velocity += Mat3::from_diagonal(Vec3::splat(total_inverse_mass));

        let impulse_matrix = match delta_velocity.inverse() {
            Ok(m) => m,
            Err(err) => {
                warn!("friction impulse fell back to frictionless: {err}");
                return self.frictionless_impulse(inverse_inertia, inverse_mass);
            }
        };

        let vel_kill = Vec3::new(
            self.desired_delta_velocity,
            -self.contact_velocity.y,
            -self.contact_velocity.z,
        );
        let mut impulse = impulse_matrix * vel_kill;

        // Dynamic friction once the cone is exceeded
        let planar = (impulse.y * impulse.y + impulse.z * impulse.z).sqrt();
        if planar > impulse.x * self.friction {
            impulse.y /= planar;
            impulse.z /= planar;
            let along_normal = delta_velocity.get(0, 0)
                + delta_velocity.get(0, 1) * self.friction * impulse.y
                + delta_velocity.get(0, 2) * self.friction * impulse.z;
            impulse.x = self.desired_delta_velocity / along_normal;
            impulse.y *= self.friction * impulse.x;
            impulse.z *= self.friction * impulse.x;
        }
        impulse
    }

    /// Moves and rotates the bodies apart by `penetration`, sharing the move
    /// in proportion to each body's linear and angular inertia along the
    /// normal.
    ///
    /// Rotation is capped at `angular_limit` times the contact's distance
    /// from the centre of mass; the rest becomes linear movement.
    pub(crate) fn apply_position_change(
        &self,
        bodies: &mut BodySet,
        penetration: f32,
        angular_limit: f32,
    ) -> PositionChange {
        let mut change = PositionChange::default();
        let normal = self.contact_normal;
        let mut bodies = bodies_mut(bodies, self.bodies);

        let mut angular_inertia = [0.0; 2];
        let mut linear_inertia = [0.0; 2];
        let mut total_inertia = 0.0;
        for (i, body) in bodies.iter().enumerate() {
            if let Some(body) = body {
                let rel = self.relative_contact_position[i];
                let angular_inertia_world = (body.inverse_inertia_tensor_world() * rel.cross(normal)).cross(rel);
                angular_inertia[i] = angular_inertia_world.dot(normal);
                linear_inertia[i] = body.inverse_mass();
                total_inertia += linear_inertia[i] + angular_inertia[i];
            }
        }
        if total_inertia <= 0.0 {
            return change;
        }

        for (i, body) in bodies.iter_mut().enumerate() {
            let Some(body) = body else {
                continue;
            };
            if !body.has_finite_mass() {
                continue;
            }
            let sign = if i == 0 { 1.0 } else { -1.0 };
            let rel = self.relative_contact_position[i];
            let mut angular_move = sign * penetration * (angular_inertia[i] / total_inertia);
            let mut linear_move = sign * penetration * (linear_inertia[i] / total_inertia);

            // Limit rotation for contacts far from the centre of mass
            let projection = rel - normal * rel.dot(normal);
            let max_magnitude = angular_limit * projection.length();
            if angular_move.abs() > max_magnitude {
                let total_move = angular_move + linear_move;
                angular_move = max_magnitude.copysign(angular_move);
                linear_move = total_move - angular_move;
            }

            change.angular[i] = if angular_move == 0.0 || angular_inertia[i] == 0.0 {
                Vec3::ZERO
            } else {
                let direction = rel.cross(normal);
                body.inverse_inertia_tensor_world() * direction * (angular_move / angular_inertia[i])
            };
            change.linear[i] = normal * linear_move;

            body.position += change.linear[i];
            body.orientation = body.orientation.add_scaled_vector(change.angular[i], 1.0);
            body.calculate_derived_data();
        }
        change
    }
}
