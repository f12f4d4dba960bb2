use std::any::Any;

use crate::dynamics::{BodyView, RigidBody};
use crate::math::Vec3;

use super::ForceGenerator;

/// Buoyancy from a liquid whose surface is the plane y = `water_height`.
///
/// There is no force while the centre of buoyancy is above the surface. Below
/// it the upward force ramps linearly to `liquid_density * volume`, reached
/// at `max_depth` under the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buoyancy {
    /// Centre of buoyancy in body space
    pub centre_of_buoyancy: Vec3,
    /// Depth at which the body counts as fully submerged
    pub max_depth: f32,
    /// Displaced volume when fully submerged
    pub volume: f32,
    /// Height of the liquid surface
    pub water_height: f32,
    /// Density of the liquid; water is 1000 kg/m^3
    pub liquid_density: f32,
}

impl Buoyancy {
    pub fn new(centre_of_buoyancy: Vec3, max_depth: f32, volume: f32, water_height: f32) -> Self {
        Self {
            centre_of_buoyancy,
            max_depth,
            volume,
            water_height,
            liquid_density: 1000.0,
        }
    }

    /// Sets the liquid density
    pub fn with_density(mut self, density: f32) -> Self {
        self.liquid_density = density;
        self
    }

    /// Upward force for a centre of buoyancy at height `depth`
    pub fn force_at(&self, depth: f32) -> f32 {
        let full = self.liquid_density * self.volume;
        if depth >= self.water_height {
            0.0
        } else if depth <= self.water_height - self.max_depth || self.max_depth <= 0.0 {
            full
        } else {
            full * (self.water_height - depth) / self.max_depth
        }
    }
}

impl ForceGenerator for Buoyancy {
    fn update_force(&mut self, body: &mut RigidBody, _others: &BodyView<'_>, _dt: f32) {
        let point = body.point_in_world_space(self.centre_of_buoyancy);
        let lift = self.force_at(point.y);
        if lift > 0.0 {
            body.add_force_at_body_point(Vec3::new(0.0, lift, 0.0), self.centre_of_buoyancy);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
