//! Force generators and the registry that drives them.
//!
//! A generator only ever adds forces and torques to the body it is handed;
//! integration happens later in the step.

mod aero;
mod buoyancy;
mod gravity;
mod spring;

use std::any::Any;
use std::fmt::Debug;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dynamics::{BodyHandle, BodySet, BodyView, RigidBody};
use crate::error::{PhysicsError, Result};

pub use aero::{Aero, AeroControl};
pub use buoyancy::Buoyancy;
pub use gravity::Gravity;
pub use spring::Spring;

/// Something that adds force to a rigid body once per step.
pub trait ForceGenerator: Debug {
    /// Adds this generator's force for the current step to `body`.
    ///
    /// `others` gives read-only access to every other body in the world.
    fn update_force(&mut self, body: &mut RigidBody, others: &BodyView<'_>, dt: f32);

    /// Used to recover the concrete generator, e.g. to steer an
    /// [`AeroControl`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A handle to a generator owned by a [`ForceRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneratorHandle(u32);

impl GeneratorHandle {
    /// Returns the slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns force generators and the (body, generator) associations between
/// them and the bodies they act on.
///
/// Associations run in registration order every step.
#[derive(Debug, Default)]
pub struct ForceRegistry {
    generators: Vec<Option<Box<dyn ForceGenerator>>>,
    registrations: Vec<(BodyHandle, GeneratorHandle)>,
}

impl ForceRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a generator
    pub fn add_generator<G: ForceGenerator + 'static>(&mut self, generator: G) -> GeneratorHandle {
        self.add_boxed(Box::new(generator))
    }

    /// Takes ownership of a boxed generator
    pub fn add_boxed(&mut self, generator: Box<dyn ForceGenerator>) -> GeneratorHandle {
        let handle = GeneratorHandle(self.generators.len() as u32);
        self.generators.push(Some(generator));
        handle
    }

    /// Drops a generator and every association using it
    pub fn remove_generator(&mut self, handle: GeneratorHandle) -> Result<Box<dyn ForceGenerator>> {
        let generator = self
            .generators
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(PhysicsError::UnknownGenerator(handle))?;
        self.registrations.retain(|&(_, g)| g != handle);
        Ok(generator)
    }

    /// Returns true if the handle refers to a live generator
    pub fn contains(&self, handle: GeneratorHandle) -> bool {
        matches!(self.generators.get(handle.index()), Some(Some(_)))
    }

    /// Gets a generator
    pub fn generator(&self, handle: GeneratorHandle) -> Option<&dyn ForceGenerator> {
        self.generators.get(handle.index())?.as_deref()
    }

    /// Gets a generator mutably
    pub fn generator_mut(&mut self, handle: GeneratorHandle) -> Option<&mut dyn ForceGenerator> {
        match self.generators.get_mut(handle.index()) {
            Some(Some(generator)) => Some(generator.as_mut()),
            _ => None,
        }
    }

    /// Gets a generator as its concrete type
    pub fn generator_as<G: ForceGenerator + 'static>(&mut self, handle: GeneratorHandle) -> Option<&mut G> {
        self.generator_mut(handle)?.as_any_mut().downcast_mut::<G>()
    }

    /// Associates a generator with a body
    pub fn register(&mut self, body: BodyHandle, generator: GeneratorHandle) -> Result<()> {
        if !self.contains(generator) {
            return Err(PhysicsError::UnknownGenerator(generator));
        }
        self.registrations.push((body, generator));
        debug!("registered force generator {generator:?} on body {body:?}");
        Ok(())
    }

    /// Removes one association; other bodies using the generator keep it
    pub fn unregister(&mut self, body: BodyHandle, generator: GeneratorHandle) -> Result<()> {
        let index = self
            .registrations
            .iter()
            .position(|&entry| entry == (body, generator))
            .ok_or(PhysicsError::NotRegistered)?;
        self.registrations.remove(index);
        debug!("unregistered force generator {generator:?} from body {body:?}");
        Ok(())
    }

    /// Drops every association that targets `body`
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.registrations.retain(|&(b, _)| b != body);
    }

    /// Drops every association; generators stay owned by the registry
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    /// Number of associations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if there are no associations
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// The associations in the order they run
    pub fn registrations(&self) -> &[(BodyHandle, GeneratorHandle)] {
        &self.registrations
    }

    /// Runs every association once
    pub fn update_forces(&mut self, bodies: &mut BodySet, dt: f32) {
        for &(body_handle, generator_handle) in &self.registrations {
            let Some(Some(generator)) = self.generators.get_mut(generator_handle.index()) else {
                continue;
            };
            let Some((body, others)) = bodies.split_mut(body_handle) else {
                continue;
            };
            generator.update_force(body, &others, dt);
        }
    }
}
