//! Error types.
//!
//! Programming errors inside the core (a non-positive time step, normalizing
//! a zero vector, a negative inverse mass) are assertions. The types here
//! cover conditions a caller can meaningfully react to: singular matrices and
//! host input that refers to things the world does not know about.

use thiserror::Error;

use crate::collision::ColliderHandle;
use crate::dynamics::BodyHandle;
use crate::forces::GeneratorHandle;

/// Failure of a numeric operation.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MathError {
    /// The matrix has a (near) zero determinant and cannot be inverted.
    #[error("matrix is singular (determinant {determinant})")]
    SingularMatrix { determinant: f32 },
}

/// Failure of a world or body operation.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PhysicsError {
    #[error("no body with handle {0:?}")]
    UnknownBody(BodyHandle),

    #[error("no force generator with handle {0:?}")]
    UnknownGenerator(GeneratorHandle),

    #[error("no collider with handle {0:?}")]
    UnknownCollider(ColliderHandle),

    #[error("invalid mass {0}: must be positive")]
    InvalidMass(f32),

    #[error("invalid damping {0}: must lie in [0, 1]")]
    InvalidDamping(f32),

    #[error("the force generator is not registered against that body")]
    NotRegistered,

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result alias used by world-facing operations.
pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
