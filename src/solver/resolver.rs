use log::trace;
use serde::{Deserialize, Serialize};

use crate::collision::Contact;
use crate::dynamics::BodySet;

/// Configuration for the contact resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Cap on velocity iterations; `None` uses four per contact
    pub velocity_iterations: Option<usize>,
    /// Cap on position iterations; `None` uses four per contact
    pub position_iterations: Option<usize>,
    /// Desired velocity changes at or below this are left alone
    pub velocity_epsilon: f32,
    /// Penetrations at or below this are left alone
    pub position_epsilon: f32,
    /// Closing speeds below this get no bounce
    pub restitution_velocity_limit: f32,
    /// Largest rotation a position correction may use, as a fraction of
    /// the contact's distance from the centre of mass
    pub angular_limit: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: None,
            position_iterations: None,
            velocity_epsilon: 0.01,
            position_epsilon: 0.01,
            restitution_velocity_limit: 0.25,
            angular_limit: 0.2,
        }
    }
}

/// Resolves a step's contacts one at a time, worst first.
///
/// Penetration is resolved first, then closing velocity. Each pass stops
/// when nothing exceeds its epsilon or the iteration cap is reached; an
/// unfinished pass is an accepted approximation, not an error.
#[derive(Debug, Clone, Default)]
pub struct ContactResolver {
    config: SolverConfig,
    velocity_iterations_used: usize,
    position_iterations_used: usize,
}

impl ContactResolver {
    /// Creates a resolver
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            velocity_iterations_used: 0,
            position_iterations_used: 0,
        }
    }

    /// Gets the configuration
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Sets the configuration
    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    /// Velocity iterations used by the last call to [`resolve_contacts`](Self::resolve_contacts)
    pub fn velocity_iterations_used(&self) -> usize {
        self.velocity_iterations_used
    }

    /// Position iterations used by the last call to [`resolve_contacts`](Self::resolve_contacts)
    pub fn position_iterations_used(&self) -> usize {
        self.position_iterations_used
    }

    /// Resolves penetration and then closing velocity for every contact
    pub fn resolve_contacts(&mut self, contacts: &mut [Contact], bodies: &mut BodySet, dt: f32) {
        self.velocity_iterations_used = 0;
        self.position_iterations_used = 0;
        if contacts.is_empty() {
            return;
        }

        self.prepare_contacts(contacts, bodies, dt);
        self.adjust_positions(contacts, bodies);
        self.adjust_velocities(contacts, bodies, dt);

        trace!(
            "resolved {} contacts in {} position and {} velocity iterations",
            contacts.len(),
            self.position_iterations_used,
            self.velocity_iterations_used
        );
    }

    /// Computes every contact's basis, relative positions and velocities
    pub fn prepare_contacts(&self, contacts: &mut [Contact], bodies: &BodySet, dt: f32) {
        for contact in contacts.iter_mut() {
            contact.calculate_internals(bodies, dt, self.config.restitution_velocity_limit);
        }
    }

    /// Pushes bodies apart, deepest penetration first
    pub fn adjust_positions(&mut self, contacts: &mut [Contact], bodies: &mut BodySet) {
        let max_iterations = self.config.position_iterations.unwrap_or(contacts.len() * 4);

        while self.position_iterations_used < max_iterations {
            let Some(worst) = worst_contact(contacts, bodies, self.config.position_epsilon, |c| c.penetration)
            else {
                break;
            };

            let contact = contacts[worst];
            contact.match_awake_state(bodies);
            let change = contact.apply_position_change(bodies, contact.penetration, self.config.angular_limit);

            // Moving a body changes the penetration of its other contacts
            for other in contacts.iter_mut() {
                for (b, body) in other.bodies.into_iter().enumerate() {
                    let Some(body) = body else {
                        continue;
                    };
                    for d in 0..2 {
                        if contact.bodies[d] == Some(body) {
                            let delta = change.linear[d]
                                + change.angular[d].cross(other.relative_contact_position[b]);
                            let sign = if b == 0 { -1.0 } else { 1.0 };
                            other.penetration += sign * delta.dot(other.contact_normal);
                        }
                    }
                }
            }
            self.position_iterations_used += 1;
        }
    }

    /// Applies impulses, largest desired velocity change first
    pub fn adjust_velocities(&mut self, contacts: &mut [Contact], bodies: &mut BodySet, dt: f32) {
        let max_iterations = self.config.velocity_iterations.unwrap_or(contacts.len() * 4);
        let limit = self.config.restitution_velocity_limit;

        while self.velocity_iterations_used < max_iterations {
            let Some(worst) = worst_contact(contacts, bodies, self.config.velocity_epsilon, |c| {
                c.desired_delta_velocity
            }) else {
                break;
            };

            contacts[worst].match_awake_state(bodies);
            let change = contacts[worst].apply_velocity_change(bodies);
            let resolved = contacts[worst].bodies;

            // Other contacts on the same bodies see a new closing velocity
            for other in contacts.iter_mut() {
                for (b, body) in other.bodies.into_iter().enumerate() {
                    let Some(body) = body else {
                        continue;
                    };
                    for d in 0..2 {
                        if resolved[d] == Some(body) {
                            let delta = change.linear[d]
                                + change.angular[d].cross(other.relative_contact_position[b]);
                            let sign = if b == 0 { 1.0 } else { -1.0 };
                            other.contact_velocity += other.contact_to_world.transform_transpose(delta) * sign;
                            other.calculate_desired_delta_velocity(bodies, dt, limit);
                        }
                    }
                }
            }
            self.velocity_iterations_used += 1;
        }
    }
}

/// Index of the contact with the largest `key` above `epsilon`, skipping
/// contacts nothing can move
fn worst_contact(
    contacts: &[Contact],
    bodies: &BodySet,
    epsilon: f32,
    key: impl Fn(&Contact) -> f32,
) -> Option<usize> {
    let mut max = epsilon;
    let mut worst = None;
    for (i, contact) in contacts.iter().enumerate() {
        let value = key(contact);
        if value > max && !contact.is_immovable(bodies) {
            max = value;
            worst = Some(i);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionConfig, CollisionData, CollisionSphere};
    use crate::collision::narrow_phase::{sphere_and_half_space, sphere_and_sphere};
    use crate::dynamics::{BodyHandle, RigidBodyDesc};
    use crate::geometry::{Plane, Shape};
    use crate::math::Vec3;
    use approx::assert_abs_diff_eq;

    fn ball(bodies: &mut BodySet, position: Vec3, velocity: Vec3) -> BodyHandle {
        bodies.insert(
            RigidBodyDesc::dynamic()
                .with_position(position)
                .with_velocity(velocity)
                .with_shape(Shape::sphere(1.0))
                .with_damping(1.0, 1.0)
                .build()
                .unwrap(),
        )
    }

    fn sphere_of(bodies: &BodySet, handle: BodyHandle) -> CollisionSphere {
        CollisionSphere::new(Some(handle), 1.0, bodies.get(handle).unwrap().transform())
    }

    #[test]
    fn test_elastic_collision_conserves_momentum() {
        let mut bodies = BodySet::new();
        let a = ball(&mut bodies, Vec3::new(-0.95, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0));
        let b = ball(&mut bodies, Vec3::new(0.95, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));

        let mut data = CollisionData::new(
            4,
            CollisionConfig {
                restitution: 1.0,
                ..CollisionConfig::default()
            },
        );
        sphere_and_sphere(&sphere_of(&bodies, a), &sphere_of(&bodies, b), &mut data);
        assert_eq!(data.len(), 1);

        let momentum = |bodies: &BodySet| bodies.get(a).unwrap().velocity + bodies.get(b).unwrap().velocity;
        let before = momentum(&bodies);

        let mut resolver = ContactResolver::default();
        resolver.resolve_contacts(data.contacts_mut(), &mut bodies, 0.01);

        assert_abs_diff_eq!(momentum(&bodies), before, epsilon = 1e-4);
        // Equal masses swap velocities in an elastic collision
        assert_abs_diff_eq!(bodies.get(a).unwrap().velocity.x, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bodies.get(b).unwrap().velocity.x, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_penetration_does_not_grow() {
        let mut bodies = BodySet::new();
        let handles: Vec<_> = (0..3)
            .map(|i| ball(&mut bodies, Vec3::new(i as f32 * 1.8, 0.8, 0.0), Vec3::new(0.0, -1.0, 0.0)))
            .collect();

        let mut data = CollisionData::new(16, CollisionConfig::default());
        for &h in &handles {
            sphere_and_half_space(&sphere_of(&bodies, h), &Plane::ground(), &mut data);
        }
        for pair in handles.windows(2) {
            sphere_and_sphere(&sphere_of(&bodies, pair[0]), &sphere_of(&bodies, pair[1]), &mut data);
        }
        let before: f32 = data.contacts().iter().map(|c| c.penetration).fold(0.0, f32::max);

        let mut resolver = ContactResolver::default();
        resolver.resolve_contacts(data.contacts_mut(), &mut bodies, 0.01);

        let after: f32 = data.contacts().iter().map(|c| c.penetration).fold(0.0, f32::max);
        assert!(after <= before);
        assert!(after <= resolver.config().position_epsilon + 1e-4);
        assert!(resolver.position_iterations_used() > 0);
        for &h in &handles {
            assert!(bodies.get(h).unwrap().velocity.y >= -1e-4);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let mut bodies = BodySet::new();
        let h = ball(&mut bodies, Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -3.0, 0.0));
        let mut data = CollisionData::new(4, CollisionConfig::default());
        sphere_and_half_space(&sphere_of(&bodies, h), &Plane::ground(), &mut data);

        let mut resolver = ContactResolver::new(SolverConfig {
            velocity_iterations: Some(0),
            position_iterations: Some(0),
            ..SolverConfig::default()
        });
        resolver.resolve_contacts(data.contacts_mut(), &mut bodies, 0.01);

        // Nothing runs, but the contact was still prepared
        let body = bodies.get(h).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(body.velocity, Vec3::new(0.0, -3.0, 0.0));
        assert_abs_diff_eq!(data.contacts()[0].contact_velocity().x, -3.0);
    }

    #[test]
    fn test_contact_between_immovable_bodies_is_skipped() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBodyDesc::fixed().build().unwrap());
        let b = bodies.insert(RigidBodyDesc::fixed().with_position(Vec3::X).build().unwrap());
        let mut contacts = [Contact::new([Some(a), Some(b)], Vec3::ZERO, Vec3::X, 0.5, 0.4, 0.0)];

        let mut resolver = ContactResolver::default();
        resolver.resolve_contacts(&mut contacts, &mut bodies, 0.01);
        assert_eq!(resolver.position_iterations_used(), 0);
        assert_eq!(resolver.velocity_iterations_used(), 0);
        assert_eq!(bodies.get(b).unwrap().position, Vec3::X);
    }

    #[test]
    fn test_config_from_json() {
        let config: SolverConfig = serde_json::from_str(r#"{ "velocity_iterations": 12 }"#).unwrap();
        assert_eq!(config.velocity_iterations, Some(12));
        assert_eq!(config.position_iterations, None);
        assert_eq!(config.angular_limit, 0.2);
    }
}
