use log::trace;

use crate::math::Vec3;

use super::particle::{Particle, ParticleHandle, ParticleSet};

/// Two particles touching, or one particle touching immovable scenery when
/// the second is `None`.
///
/// The normal points from the second particle toward the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleContact {
    pub particles: [Option<ParticleHandle>; 2],
    pub restitution: f32,
    pub contact_normal: Vec3,
    pub penetration: f32,
    /// Movement applied to each particle by the last interpenetration fix
    particle_movement: [Vec3; 2],
}

fn particles_mut(set: &mut ParticleSet, handles: [Option<ParticleHandle>; 2]) -> [Option<&mut Particle>; 2] {
    match handles {
        [Some(a), Some(b)] if a != b => set
            .get_pair_mut(a, b)
            .map_or([None, None], |(one, two)| [Some(one), Some(two)]),
        [Some(a), _] => [set.get_mut(a), None],
        [None, Some(b)] => [None, set.get_mut(b)],
        [None, None] => [None, None],
    }
}

impl ParticleContact {
    pub fn new(particles: [Option<ParticleHandle>; 2], contact_normal: Vec3, penetration: f32, restitution: f32) -> Self {
        Self {
            particles,
            restitution,
            contact_normal,
            penetration,
            particle_movement: [Vec3::ZERO; 2],
        }
    }

    /// Movement applied to each particle by the last interpenetration fix
    pub fn particle_movement(&self) -> [Vec3; 2] {
        self.particle_movement
    }

    /// Speed at which the particles move apart along the normal; negative
    /// when closing
    pub fn separating_velocity(&self, set: &ParticleSet) -> f32 {
        let mut relative = self.particles[0]
            .and_then(|h| set.get(h))
            .map_or(Vec3::ZERO, |p| p.velocity);
        if let Some(other) = self.particles[1].and_then(|h| set.get(h)) {
            relative -= other.velocity;
        }
        relative.dot(self.contact_normal)
    }

    /// Resolves velocity, then interpenetration
    pub fn resolve(&mut self, set: &mut ParticleSet, dt: f32) {
        self.resolve_velocity(set, dt);
        self.resolve_interpenetration(set);
    }

    fn resolve_velocity(&mut self, set: &mut ParticleSet, dt: f32) {
        let separating = self.separating_velocity(set);
        if separating > 0.0 {
            return;
        }

        let [one, two] = particles_mut(set, self.particles);
        let Some(one) = one else {
            return;
        };

        let mut new_separating = -separating * self.restitution;

        // Closing speed built up by acceleration during this step alone is
        // not bounced back, so resting contacts stay at rest
        let mut acc_caused = one.acceleration;
        if let Some(two) = two.as_ref() {
            acc_caused -= two.acceleration;
        }
        let acc_caused_separating = acc_caused.dot(self.contact_normal) * dt;
        if acc_caused_separating < 0.0 {
            new_separating = (new_separating + self.restitution * acc_caused_separating).max(0.0);
        }

        let delta_velocity = new_separating - separating;
        let total_inverse_mass = one.inverse_mass() + two.as_ref().map_or(0.0, |p| p.inverse_mass());
        if total_inverse_mass <= 0.0 {
            return;
        }

        let impulse_per_inverse_mass = self.contact_normal * (delta_velocity / total_inverse_mass);
        one.velocity += impulse_per_inverse_mass * one.inverse_mass();
        if let Some(two) = two {
            two.velocity += impulse_per_inverse_mass * -two.inverse_mass();
        }
    }

    fn resolve_interpenetration(&mut self, set: &mut ParticleSet) {
        self.particle_movement = [Vec3::ZERO; 2];
        if self.penetration <= 0.0 {
            return;
        }

        let [one, two] = particles_mut(set, self.particles);
        let Some(one) = one else {
            return;
        };
        let total_inverse_mass = one.inverse_mass() + two.as_ref().map_or(0.0, |p| p.inverse_mass());
        if total_inverse_mass <= 0.0 {
            return;
        }

        let move_per_inverse_mass = self.contact_normal * (self.penetration / total_inverse_mass);
        self.particle_movement[0] = move_per_inverse_mass * one.inverse_mass();
        one.position += self.particle_movement[0];
        if let Some(two) = two {
            self.particle_movement[1] = move_per_inverse_mass * -two.inverse_mass();
            two.position += self.particle_movement[1];
        }
    }
}

/// Resolves particle contacts, most negative separating velocity first,
/// for at most `iterations` resolutions.
#[derive(Debug, Clone, Default)]
pub struct ParticleContactResolver {
    iterations: usize,
    iterations_used: usize,
}

impl ParticleContactResolver {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            iterations_used: 0,
        }
    }

    pub fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Resolutions performed by the last call to [`resolve_contacts`](Self::resolve_contacts)
    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    pub fn resolve_contacts(&mut self, contacts: &mut [ParticleContact], set: &mut ParticleSet, dt: f32) {
        self.iterations_used = 0;
        while self.iterations_used < self.iterations {
            let mut max = f32::MAX;
            let mut worst = None;
            for (i, contact) in contacts.iter().enumerate() {
                let separating = contact.separating_velocity(set);
                if separating < max && (separating < 0.0 || contact.penetration > 0.0) {
                    max = separating;
                    worst = Some(i);
                }
            }
            let Some(worst) = worst else {
                break;
            };

            contacts[worst].resolve(set, dt);

            // Moving a particle changes the penetration of its other contacts
            let movement = contacts[worst].particle_movement;
            let resolved = contacts[worst].particles;
            for contact in contacts.iter_mut() {
                for (b, particle) in contact.particles.into_iter().enumerate() {
                    let Some(particle) = particle else {
                        continue;
                    };
                    let sign = if b == 0 { -1.0 } else { 1.0 };
                    for d in 0..2 {
                        if resolved[d] == Some(particle) {
                            contact.penetration += sign * movement[d].dot(contact.contact_normal);
                        }
                    }
                }
            }
            self.iterations_used += 1;
        }
        trace!("resolved {} particle contacts in {} iterations", contacts.len(), self.iterations_used);
    }
}
