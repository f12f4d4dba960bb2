//! A mass-aggregate particle engine.
//!
//! Particles have no orientation; rigid structures are built from particles
//! held together by cables and rods, which generate contacts resolved by the
//! same iterative scheme as collisions.

mod contact;
mod forces;
mod links;
mod particle;
mod world;

pub use contact::{ParticleContact, ParticleContactResolver};
pub use forces::{
    ParticleAnchoredBungee, ParticleAnchoredSpring, ParticleBungee, ParticleBuoyancy, ParticleDrag,
    ParticleFakeSpring, ParticleForceGenerator, ParticleForceRegistry, ParticleGeneratorHandle,
    ParticleGravity, ParticleSpring,
};
pub use links::{
    GroundContacts, ParticleCable, ParticleCableConstraint, ParticleContactGenerator, ParticleRod,
    ParticleRodConstraint,
};
pub use particle::{Particle, ParticleHandle, ParticleSet, ParticleView};
pub use world::ParticleWorld;
