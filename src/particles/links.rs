//! Contact generators: cables, rods and the ground.
//!
//! Links keep particles together by emitting a contact whenever the link is
//! violated; the contact resolver does the rest.

use std::fmt::Debug;

use crate::math::Vec3;

use super::contact::ParticleContact;
use super::particle::{ParticleHandle, ParticleSet};

/// Something that produces particle contacts each step
pub trait ParticleContactGenerator: Debug {
    /// Pushes at most `limit` contacts onto `contacts`, returning how many
    /// were added
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize;
}

/// Position of both ends and the distance between them
fn ends(particles: &ParticleSet, pair: [ParticleHandle; 2]) -> Option<(Vec3, Vec3, f32)> {
    let a = particles.get(pair[0])?.position;
    let b = particles.get(pair[1])?.position;
    Some((a, b, a.distance(b)))
}

/// A cable between two particles: slack when short, a bouncy contact when
/// stretched beyond `max_length`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleCable {
    pub particles: [ParticleHandle; 2],
    pub max_length: f32,
    pub restitution: f32,
}

impl ParticleContactGenerator for ParticleCable {
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some((a, b, length)) = ends(particles, self.particles) else {
            return 0;
        };
        if limit == 0 || length < self.max_length {
            return 0;
        }
        let Some(normal) = (b - a).try_normalize() else {
            return 0;
        };
        contacts.push(ParticleContact::new(
            [Some(self.particles[0]), Some(self.particles[1])],
            normal,
            length - self.max_length,
            self.restitution,
        ));
        1
    }
}

/// A rod between two particles that keeps them exactly `length` apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRod {
    pub particles: [ParticleHandle; 2],
    pub length: f32,
}

/// Contact keeping `length` between ends at `a` and `b`; the normal points
/// from `a` toward `b` when stretched and away when compressed
fn rod_contact(a: Vec3, b: Vec3, current: f32, length: f32) -> Option<(Vec3, f32)> {
    if current == length {
        return None;
    }
    let normal = (b - a).try_normalize()?;
    Some(if current > length {
        (normal, current - length)
    } else {
        (-normal, length - current)
    })
}

impl ParticleContactGenerator for ParticleRod {
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some((a, b, current)) = ends(particles, self.particles) else {
            return 0;
        };
        if limit == 0 {
            return 0;
        }
        let Some((normal, penetration)) = rod_contact(a, b, current, self.length) else {
            return 0;
        };
        contacts.push(ParticleContact::new(
            [Some(self.particles[0]), Some(self.particles[1])],
            normal,
            penetration,
            0.0,
        ));
        1
    }
}

/// A cable from a particle to a fixed anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleCableConstraint {
    pub particle: ParticleHandle,
    pub anchor: Vec3,
    pub max_length: f32,
    pub restitution: f32,
}

impl ParticleContactGenerator for ParticleCableConstraint {
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some(particle) = particles.get(self.particle) else {
            return 0;
        };
        let length = particle.position.distance(self.anchor);
        if limit == 0 || length < self.max_length {
            return 0;
        }
        let Some(normal) = (self.anchor - particle.position).try_normalize() else {
            return 0;
        };
        contacts.push(ParticleContact::new(
            [Some(self.particle), None],
            normal,
            length - self.max_length,
            self.restitution,
        ));
        1
    }
}

/// A rod from a particle to a fixed anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRodConstraint {
    pub particle: ParticleHandle,
    pub anchor: Vec3,
    pub length: f32,
}

impl ParticleContactGenerator for ParticleRodConstraint {
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some(particle) = particles.get(self.particle) else {
            return 0;
        };
        if limit == 0 {
            return 0;
        }
        let current = particle.position.distance(self.anchor);
        let Some((normal, penetration)) = rod_contact(particle.position, self.anchor, current, self.length) else {
            return 0;
        };
        contacts.push(ParticleContact::new([Some(self.particle), None], normal, penetration, 0.0));
        1
    }
}

/// Keeps every particle above the plane y = 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContacts {
    pub restitution: f32,
}

impl Default for GroundContacts {
    fn default() -> Self {
        Self { restitution: 0.2 }
    }
}

impl ParticleContactGenerator for GroundContacts {
    fn add_contact(&self, particles: &ParticleSet, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let mut count = 0;
        for (handle, particle) in particles.iter() {
            if count >= limit {
                break;
            }
            let y = particle.position.y;
            if y < 0.0 {
                contacts.push(ParticleContact::new([Some(handle), None], Vec3::Y, -y, self.restitution));
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Particle;
    use approx::assert_abs_diff_eq;

    fn pair(distance: f32) -> (ParticleSet, [ParticleHandle; 2]) {
        let mut set = ParticleSet::new();
        let a = set.insert(Particle::new(Vec3::ZERO));
        let b = set.insert(Particle::new(Vec3::new(distance, 0.0, 0.0)));
        (set, [a, b])
    }

    #[test]
    fn test_cable() {
        let (set, handles) = pair(2.5);
        let mut contacts = Vec::new();
        let slack = ParticleCable {
            particles: handles,
            max_length: 3.0,
            restitution: 0.5,
        };
        assert_eq!(slack.add_contact(&set, &mut contacts, 10), 0);

        let taut = ParticleCable { max_length: 2.0, ..slack };
        assert_eq!(taut.add_contact(&set, &mut contacts, 10), 1);
        assert_eq!(contacts[0].contact_normal, Vec3::X);
        assert_abs_diff_eq!(contacts[0].penetration, 0.5);
        assert_eq!(taut.add_contact(&set, &mut contacts, 0), 0);
    }

    #[test]
    fn test_rod_both_ways() {
        let (set, handles) = pair(2.5);
        let mut contacts = Vec::new();
        ParticleRod { particles: handles, length: 2.0 }.add_contact(&set, &mut contacts, 10);
        ParticleRod { particles: handles, length: 3.0 }.add_contact(&set, &mut contacts, 10);
        assert_eq!(ParticleRod { particles: handles, length: 2.5 }.add_contact(&set, &mut contacts, 10), 0);

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].contact_normal, Vec3::X);
        assert_eq!(contacts[1].contact_normal, -Vec3::X);
        assert_abs_diff_eq!(contacts[1].penetration, 0.5);
    }

    #[test]
    fn test_anchored_links() {
        let mut set = ParticleSet::new();
        let p = set.insert(Particle::new(Vec3::new(0.0, -3.0, 0.0)));
        let mut contacts = Vec::new();

        let cable = ParticleCableConstraint {
            particle: p,
            anchor: Vec3::ZERO,
            max_length: 2.0,
            restitution: 0.3,
        };
        assert_eq!(cable.add_contact(&set, &mut contacts, 10), 1);
        assert_eq!(contacts[0].contact_normal, Vec3::Y);
        assert_eq!(contacts[0].particles, [Some(p), None]);

        let rod = ParticleRodConstraint {
            particle: p,
            anchor: Vec3::ZERO,
            length: 4.0,
        };
        assert_eq!(rod.add_contact(&set, &mut contacts, 10), 1);
        // Too close: pushed away from the anchor
        assert_eq!(contacts[1].contact_normal, -Vec3::Y);
        assert_abs_diff_eq!(contacts[1].penetration, 1.0);
    }

    #[test]
    fn test_ground_contacts_limit() {
        let mut set = ParticleSet::new();
        for x in 0..4 {
            set.insert(Particle::new(Vec3::new(x as f32, -0.5, 0.0)));
        }
        set.insert(Particle::new(Vec3::new(0.0, 1.0, 0.0)));

        let mut contacts = Vec::new();
        assert_eq!(GroundContacts::default().add_contact(&set, &mut contacts, 3), 3);
        assert!(contacts.iter().all(|c| c.penetration == 0.5 && c.restitution == 0.2));
    }
}
