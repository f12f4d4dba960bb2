//! Collision detection: world-space primitives, broad-phase culling and the
//! contact generators that fill a [`CollisionData`] buffer.

pub mod broad_phase;
pub mod contact;
pub mod narrow_phase;
pub mod primitive;

pub use broad_phase::{brute_force_pairs, overlapping_pairs, BroadPhaseMode, Bvh};
pub use contact::{CollisionConfig, CollisionData, Contact};
pub use primitive::{Collider, ColliderHandle, CollisionBox, CollisionSphere, Primitive};
