use serde::{Deserialize, Serialize};

use crate::dynamics::BodyHandle;
use crate::geometry::{BoundingSphere, Shape};
use crate::math::{Mat4, Vec3};

/// A handle to a collider attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(pub(crate) u32);

impl ColliderHandle {
    /// Returns the slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A sphere placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionSphere {
    pub body: Option<BodyHandle>,
    pub radius: f32,
    pub transform: Mat4,
}

impl CollisionSphere {
    pub fn new(body: Option<BodyHandle>, radius: f32, transform: Mat4) -> Self {
        Self {
            body,
            radius,
            transform,
        }
    }

    /// Centre of the sphere
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.transform.axis(3)
    }
}

/// An oriented box placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    pub body: Option<BodyHandle>,
    pub half_size: Vec3,
    pub transform: Mat4,
}

impl CollisionBox {
    pub fn new(body: Option<BodyHandle>, half_size: Vec3, transform: Mat4) -> Self {
        Self {
            body,
            half_size,
            transform,
        }
    }

    /// Axis `index` of the box frame; 3 is the centre
    #[inline]
    pub fn axis(&self, index: usize) -> Vec3 {
        self.transform.axis(index)
    }

    /// Centre of the box
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.transform.axis(3)
    }

    /// Half the length of the box's projection onto `axis`
    #[inline]
    pub fn project_onto(&self, axis: Vec3) -> f32 {
        self.half_size.x * axis.dot(self.axis(0)).abs()
            + self.half_size.y * axis.dot(self.axis(1)).abs()
            + self.half_size.z * axis.dot(self.axis(2)).abs()
    }

    /// The eight corners in world space
    pub fn world_vertices(&self) -> [Vec3; 8] {
        let h = self.half_size;
        let mut out = [Vec3::ZERO; 8];
        for (i, vertex) in out.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 4 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 1 == 0 { -h.z } else { h.z },
            );
            *vertex = self.transform.transform_point(local);
        }
        out
    }
}

/// A collider's shape in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere(CollisionSphere),
    Box(CollisionBox),
}

impl Primitive {
    /// The body the primitive belongs to
    pub fn body(&self) -> Option<BodyHandle> {
        match self {
            Primitive::Sphere(s) => s.body,
            Primitive::Box(b) => b.body,
        }
    }
}

/// A shape bound to a body with a body-space offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub body: BodyHandle,
    pub shape: Shape,
    /// Placement of the shape in body space
    pub offset: Mat4,
    transform: Mat4,
}

impl Collider {
    pub fn new(body: BodyHandle, shape: Shape, offset: Mat4) -> Self {
        Self {
            body,
            shape,
            offset,
            transform: offset,
        }
    }

    /// Recomputes the world transform from the body's transform
    pub fn update_transform(&mut self, body_transform: &Mat4) {
        self.transform = *body_transform * self.offset;
    }

    /// World transform as of the last update
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Bounding sphere in world space
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.shape.bounding_sphere(&self.transform)
    }

    /// The collider as a world-space primitive
    pub fn primitive(&self) -> Primitive {
        match self.shape {
            Shape::Sphere(s) => Primitive::Sphere(CollisionSphere::new(
                Some(self.body),
                s.radius,
                self.transform,
            )),
            Shape::Box(b) => Primitive::Box(CollisionBox::new(
                Some(self.body),
                b.half_extents,
                self.transform,
            )),
        }
    }
}
