use log::{debug, trace};

use crate::error::Result;

use super::contact::{ParticleContact, ParticleContactResolver};
use super::forces::{ParticleForceGenerator, ParticleForceRegistry, ParticleGeneratorHandle};
use super::links::ParticleContactGenerator;
use super::particle::{Particle, ParticleHandle, ParticleSet};

/// Owns a set of particles, their forces and the generators that keep them
/// in contact, and steps them together.
#[derive(Debug)]
pub struct ParticleWorld {
    particles: ParticleSet,
    registry: ParticleForceRegistry,
    resolver: ParticleContactResolver,
    contact_generators: Vec<Box<dyn ParticleContactGenerator>>,
    contacts: Vec<ParticleContact>,
    max_contacts: usize,
    /// Resolver iterations are twice the contact count when unset
    iterations: Option<usize>,
}

impl ParticleWorld {
    /// Creates a world that handles up to `max_contacts` contacts per frame
    pub fn new(max_contacts: usize, iterations: Option<usize>) -> Self {
        debug!("particle world created with {max_contacts} contacts");
        Self {
            particles: ParticleSet::new(),
            registry: ParticleForceRegistry::new(),
            resolver: ParticleContactResolver::new(iterations.unwrap_or(0)),
            contact_generators: Vec::new(),
            contacts: Vec::with_capacity(max_contacts),
            max_contacts,
            iterations,
        }
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleHandle {
        self.particles.insert(particle)
    }

    pub fn particle(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(handle)
    }

    pub fn particle_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.particles.get_mut(handle)
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Takes ownership of a force generator
    pub fn add_force_generator<G: ParticleForceGenerator + 'static>(&mut self, generator: G) -> ParticleGeneratorHandle {
        self.registry.add_generator(generator)
    }

    pub fn register_force(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) {
        self.registry.register(particle, generator);
    }

    pub fn unregister_force(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) -> Result<()> {
        self.registry.unregister(particle, generator)
    }

    pub fn add_contact_generator<G: ParticleContactGenerator + 'static>(&mut self, generator: G) {
        self.contact_generators.push(Box::new(generator));
    }

    /// Clears every particle's force accumulator
    pub fn start_frame(&mut self) {
        for (_, particle) in self.particles.iter_mut() {
            particle.clear_accumulator();
        }
    }

    /// Asks every contact generator for contacts, up to the budget
    pub fn generate_contacts(&mut self) -> usize {
        self.contacts.clear();
        for generator in &self.contact_generators {
            let limit = self.max_contacts - self.contacts.len();
            if limit == 0 {
                break;
            }
            generator.add_contact(&self.particles, &mut self.contacts, limit);
        }
        self.contacts.len()
    }

    /// Integrates every particle
    pub fn integrate(&mut self, dt: f32) {
        for (_, particle) in self.particles.iter_mut() {
            particle.integrate(dt);
        }
    }

    /// Runs one step: forces, integration, contact generation, resolution
    pub fn run_physics(&mut self, dt: f32) {
        self.registry.update_forces(&mut self.particles, dt);
        self.integrate(dt);

        let used = self.generate_contacts();
        trace!("particle step generated {used} contacts");
        if used > 0 {
            let iterations = self.iterations.unwrap_or(used * 2);
            self.resolver.set_iterations(iterations);
            self.resolver.resolve_contacts(&mut self.contacts, &mut self.particles, dt);
        }
    }

    /// Contacts found in the last step
    pub fn contacts(&self) -> &[ParticleContact] {
        &self.contacts
    }
}
