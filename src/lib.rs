//! # impulse3d
//!
//! A 3D rigid body and particle physics engine.
//!
//! ## Features
//!
//! - **Rigid Body Dynamics**: semi-implicit integration with damping, sleeping and force accumulators
//! - **Force Generators**: gravity, springs, aerodynamic surfaces and buoyancy, driven by a registry
//! - **Broad Phase**: bounding volume hierarchy, or brute force for small scenes
//! - **Narrow Phase**: sphere, box and plane contact generation, including box/box by separating axes
//! - **Contact Resolution**: sequential impulses with friction, worst-first position correction
//! - **Particles**: a mass-aggregate engine with cables, rods and their own contact resolver
//!
//! ## Quick Start
//!
//! ```rust
//! use impulse3d::prelude::*;
//!
//! let mut world = World::default();
//! world.add_plane(Plane::ground());
//!
//! let ball = world
//!     .create_body(
//!         RigidBodyDesc::dynamic()
//!             .with_position(Vec3::new(0.0, 5.0, 0.0))
//!             .with_shape(Shape::sphere(0.5)),
//!     )
//!     .unwrap();
//!
//! let dt = 1.0 / 60.0;
//! for _ in 0..600 {
//!     world.start_frame();
//!     world.step(dt);
//! }
//! let pos = world.body_position(ball).unwrap();
//! assert!((pos.y - 0.5).abs() < 0.05);
//! ```

pub mod collision;
pub mod constraints;
pub mod dynamics;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod math;
pub mod particles;
pub mod solver;
mod world;

pub use error::{MathError, PhysicsError, Result};
pub use world::{World, WorldConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collision::{BroadPhaseMode, ColliderHandle, CollisionConfig, Contact};
    pub use crate::dynamics::{BodyHandle, RigidBody, RigidBodyDesc};
    pub use crate::error::{MathError, PhysicsError};
    pub use crate::forces::{Aero, AeroControl, Buoyancy, ForceGenerator, GeneratorHandle, Gravity, Spring};
    pub use crate::geometry::{Aabb, BoundingSphere, Plane, Shape};
    pub use crate::math::{Mat3, Mat4, Quat, Vec3};
    pub use crate::particles::{
        GroundContacts, Particle, ParticleCable, ParticleHandle, ParticleRod, ParticleWorld,
    };
    pub use crate::solver::{ContactResolver, SolverConfig};
    pub use crate::world::{World, WorldConfig};
}
