//! Force generators for particles and the registry that runs them.

use std::fmt::Debug;

use log::debug;

use crate::error::{PhysicsError, Result};
use crate::math::Vec3;

use super::particle::{Particle, ParticleHandle, ParticleSet, ParticleView};

/// Something that adds force to a particle once per step
pub trait ParticleForceGenerator: Debug {
    /// Adds this generator's force for the current step to `particle`.
    ///
    /// `others` gives read-only access to every other particle.
    fn update_force(&mut self, particle: &mut Particle, others: &ParticleView<'_>, dt: f32);
}

/// A handle to a generator owned by a [`ParticleForceRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleGeneratorHandle(u32);

/// Owns particle force generators and the (particle, generator)
/// associations, run in registration order.
#[derive(Debug, Default)]
pub struct ParticleForceRegistry {
    generators: Vec<Box<dyn ParticleForceGenerator>>,
    registrations: Vec<(ParticleHandle, ParticleGeneratorHandle)>,
}

impl ParticleForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a generator
    pub fn add_generator<G: ParticleForceGenerator + 'static>(&mut self, generator: G) -> ParticleGeneratorHandle {
        self.generators.push(Box::new(generator));
        ParticleGeneratorHandle(self.generators.len() as u32 - 1)
    }

    /// Associates a generator with a particle
    pub fn register(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) {
        self.registrations.push((particle, generator));
        debug!("registered particle force generator {generator:?} on {particle:?}");
    }

    /// Removes one association
    pub fn unregister(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) -> Result<()> {
        let index = self
            .registrations
            .iter()
            .position(|&entry| entry == (particle, generator))
            .ok_or(PhysicsError::NotRegistered)?;
        self.registrations.remove(index);
        Ok(())
    }

    /// Drops every association; generators stay owned by the registry
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Runs every association once
    pub fn update_forces(&mut self, particles: &mut ParticleSet, dt: f32) {
        for &(particle_handle, generator_handle) in &self.registrations {
            let Some(generator) = self.generators.get_mut(generator_handle.0 as usize) else {
                continue;
            };
            let Some((particle, others)) = particles.split_mut(particle_handle) else {
                continue;
            };
            generator.update_force(particle, &others, dt);
        }
    }
}

/// Constant gravitational acceleration, applied as a force so it can be
/// registered on selected particles only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleGravity {
    pub gravity: Vec3,
}

impl ParticleGravity {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl ParticleForceGenerator for ParticleGravity {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, _dt: f32) {
        if !particle.has_finite_mass() {
            return;
        }
        particle.add_force(self.gravity * particle.mass());
    }
}

/// Drag with linear and quadratic coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleDrag {
    pub k1: f32,
    pub k2: f32,
}

impl ParticleDrag {
    pub fn new(k1: f32, k2: f32) -> Self {
        Self { k1, k2 }
    }
}

impl ParticleForceGenerator for ParticleDrag {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, _dt: f32) {
        let speed = particle.velocity.length();
        let Some(direction) = particle.velocity.try_normalize() else {
            return;
        };
        let drag = self.k1 * speed + self.k2 * speed * speed;
        particle.add_force(direction * -drag);
    }
}

/// Hooke's law force along `displacement` (from the other end to this one)
fn spring_force(displacement: Vec3, spring_constant: f32, rest_length: f32) -> Vec3 {
    match displacement.try_normalize() {
        Some(direction) => direction * (-spring_constant * (displacement.length() - rest_length)),
        None => Vec3::ZERO,
    }
}

/// A spring to another particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpring {
    pub other: ParticleHandle,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleSpring {
    pub fn new(other: ParticleHandle, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleSpring {
    fn update_force(&mut self, particle: &mut Particle, others: &ParticleView<'_>, _dt: f32) {
        let Some(other) = others.get(self.other) else {
            return;
        };
        let force = spring_force(particle.position - other.position, self.spring_constant, self.rest_length);
        particle.add_force(force);
    }
}

/// A spring to a fixed point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleAnchoredSpring {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleAnchoredSpring {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleAnchoredSpring {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, _dt: f32) {
        particle.add_force(spring_force(particle.position - self.anchor, self.spring_constant, self.rest_length));
    }
}

/// A spring to another particle that only pulls, never pushes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBungee {
    pub other: ParticleHandle,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleBungee {
    pub fn new(other: ParticleHandle, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleBungee {
    fn update_force(&mut self, particle: &mut Particle, others: &ParticleView<'_>, _dt: f32) {
        let Some(other) = others.get(self.other) else {
            return;
        };
        let displacement = particle.position - other.position;
        if displacement.length() <= self.rest_length {
            return;
        }
        particle.add_force(spring_force(displacement, self.spring_constant, self.rest_length));
    }
}

/// A bungee to a fixed point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleAnchoredBungee {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl ParticleAnchoredBungee {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleAnchoredBungee {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, _dt: f32) {
        let displacement = particle.position - self.anchor;
        if displacement.length() <= self.rest_length {
            return;
        }
        particle.add_force(spring_force(displacement, self.spring_constant, self.rest_length));
    }
}

/// Buoyancy in a liquid whose surface is y = `water_height`.
///
/// Nothing above the surface; below it the force ramps linearly to the full
/// `liquid_density * volume` at `max_depth` under the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBuoyancy {
    pub max_depth: f32,
    pub volume: f32,
    pub water_height: f32,
    pub liquid_density: f32,
}

impl ParticleBuoyancy {
    pub fn new(max_depth: f32, volume: f32, water_height: f32) -> Self {
        Self {
            max_depth,
            volume,
            water_height,
            liquid_density: 1000.0,
        }
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.liquid_density = density;
        self
    }
}

impl ParticleForceGenerator for ParticleBuoyancy {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, _dt: f32) {
        let depth = particle.position.y;
        if depth >= self.water_height {
            return;
        }
        let full = self.liquid_density * self.volume;
        let lift = if depth <= self.water_height - self.max_depth || self.max_depth <= 0.0 {
            full
        } else {
            full * (self.water_height - depth) / self.max_depth
        };
        particle.add_force(Vec3::new(0.0, lift, 0.0));
    }
}

/// A stiff spring to a fixed point, integrated analytically over the step
/// so very high spring constants stay stable.
///
/// Only meaningful for under-damped springs (`damping^2 < 4k`); others add
/// no force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleFakeSpring {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub damping: f32,
}

impl ParticleFakeSpring {
    pub fn new(anchor: Vec3, spring_constant: f32, damping: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            damping,
        }
    }
}

impl ParticleForceGenerator for ParticleFakeSpring {
    fn update_force(&mut self, particle: &mut Particle, _others: &ParticleView<'_>, dt: f32) {
        if !particle.has_finite_mass() {
            return;
        }

        let discriminant = 4.0 * self.spring_constant - self.damping * self.damping;
        if discriminant <= 0.0 {
            return;
        }
        let gamma = 0.5 * discriminant.sqrt();

        let position = particle.position - self.anchor;
        let c = position * (self.damping / (2.0 * gamma)) + particle.velocity * gamma.recip();

        // Where the damped oscillator puts the particle after dt
        let target = (position * (gamma * dt).cos() + c * (gamma * dt).sin()) * (-0.5 * dt * self.damping).exp();
        let acceleration = (target - position) * (dt * dt).recip() - particle.velocity * dt.recip();
        particle.add_force(acceleration * particle.mass());
    }
}
