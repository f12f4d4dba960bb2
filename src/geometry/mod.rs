//! Shapes and bounding volumes.

mod aabb;
mod bounding;
mod shape;

pub use aabb::Aabb;
pub use bounding::{BoundingSphere, BoundingVolume};
pub use shape::{BoxShape, Plane, Shape, Sphere};
