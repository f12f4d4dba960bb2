use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::math::Vec3;

/// A point mass with no orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Constant acceleration, usually gravity
    pub acceleration: Vec3,
    /// Fraction of velocity kept after one second
    pub damping: f32,
    inverse_mass: f32,
    force_accum: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            damping: 0.99,
            inverse_mass: 1.0,
            force_accum: Vec3::ZERO,
        }
    }
}

impl Particle {
    /// Creates a unit-mass particle at `position`
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the mass, builder style
    pub fn with_mass(mut self, mass: f32) -> Result<Self> {
        self.set_mass(mass)?;
        Ok(self)
    }

    /// Sets the velocity, builder style
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the constant acceleration, builder style
    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Sets the damping, builder style
    pub fn with_damping(mut self, damping: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&damping) {
            return Err(PhysicsError::InvalidDamping(damping));
        }
        self.damping = damping;
        Ok(self)
    }

    /// Sets the mass. An infinite mass makes the particle immovable.
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        self.inverse_mass = mass.recip();
        Ok(())
    }

    /// The mass; infinite for immovable particles
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::INFINITY
        } else {
            self.inverse_mass.recip()
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Sets the inverse mass; 0 makes the particle immovable
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        assert!(inverse_mass >= 0.0, "inverse mass must be non-negative, got {inverse_mass}");
        self.inverse_mass = inverse_mass;
    }

    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Adds a force for the next integration only
    #[inline]
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    #[inline]
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    #[inline]
    pub fn clear_accumulator(&mut self) {
        self.force_accum = Vec3::ZERO;
    }

    /// Advances the particle by `dt` seconds.
    ///
    /// Position moves with the old velocity, then the velocity picks up the
    /// acceleration and is damped. Immovable particles are skipped.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive.
    pub fn integrate(&mut self, dt: f32) {
        assert!(dt > 0.0, "time step must be positive, got {dt}");
        if !self.has_finite_mass() {
            return;
        }

        self.position += self.velocity * dt;

        let acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += acceleration * dt;
        self.velocity *= self.damping.powf(dt);

        self.clear_accumulator();
    }
}

/// A handle to a particle in a [`ParticleSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleHandle(u32);

impl ParticleHandle {
    /// Returns the slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every particle of a [`ParticleWorld`](super::ParticleWorld). Particles
/// are never removed, so handles stay valid for the set's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a particle
    pub fn insert(&mut self, particle: Particle) -> ParticleHandle {
        self.particles.push(particle);
        ParticleHandle(self.particles.len() as u32 - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(handle.index())
    }

    #[inline]
    pub fn get_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.particles.get_mut(handle.index())
    }

    /// Mutably borrows two distinct particles at once
    pub fn get_pair_mut(
        &mut self,
        a: ParticleHandle,
        b: ParticleHandle,
    ) -> Option<(&mut Particle, &mut Particle)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia >= self.len() || ib >= self.len() {
            return None;
        }
        if ia < ib {
            let (left, right) = self.particles.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.particles.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Mutably borrows one particle with a read-only view of the rest
    pub fn split_mut(&mut self, handle: ParticleHandle) -> Option<(&mut Particle, ParticleView<'_>)> {
        let index = handle.index();
        if index >= self.len() {
            return None;
        }
        let (before, rest) = self.particles.split_at_mut(index);
        let (particle, after) = rest.split_first_mut()?;
        Some((
            particle,
            ParticleView {
                before,
                after,
                skipped: index,
            },
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleHandle, &Particle)> + '_ {
        self.particles
            .iter()
            .enumerate()
            .map(|(i, p)| (ParticleHandle(i as u32), p))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParticleHandle, &mut Particle)> + '_ {
        self.particles
            .iter_mut()
            .enumerate()
            .map(|(i, p)| (ParticleHandle(i as u32), p))
    }
}

/// Read-only access to every particle except the one borrowed mutably
#[derive(Debug)]
pub struct ParticleView<'a> {
    before: &'a [Particle],
    after: &'a [Particle],
    skipped: usize,
}

impl<'a> ParticleView<'a> {
    /// Gets another particle; the borrowed one reads as absent
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        let index = handle.index();
        if index < self.skipped {
            self.before.get(index)
        } else if index > self.skipped {
            self.after.get(index - self.skipped - 1)
        } else {
            None
        }
    }
}
