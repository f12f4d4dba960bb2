//! Rigid bodies, their storage and integration.

mod body_set;
mod integrator;
mod rigid_body;

pub use body_set::{BodyHandle, BodySet, BodyView};
pub use integrator::integrate;
pub use rigid_body::{RigidBody, RigidBodyDesc, DEFAULT_SLEEP_EPSILON};
