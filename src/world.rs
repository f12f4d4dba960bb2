use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::collision::narrow_phase::{collide, collide_half_space};
use crate::collision::{
    brute_force_pairs, BroadPhaseMode, Bvh, Collider, ColliderHandle, CollisionConfig, CollisionData,
    Contact,
};
use crate::dynamics::{integrate, BodyHandle, BodySet, RigidBody, RigidBodyDesc};
use crate::error::{PhysicsError, Result};
use crate::forces::{ForceGenerator, ForceRegistry, GeneratorHandle};
use crate::geometry::{BoundingSphere, Plane, Shape};
use crate::math::{Mat4, Quat, Vec3};
use crate::solver::{ContactResolver, SolverConfig};

/// Configuration for the physics world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Constant acceleration given to every body
    pub gravity: Vec3,
    /// Contacts kept per step; detection stops once the buffer is full
    pub max_contacts: usize,
    pub broad_phase: BroadPhaseMode,
    pub collision: CollisionConfig,
    pub solver: SolverConfig,
    /// Slack around each collider's volume in the BVH, so slow bodies do
    /// not reinsert every step
    pub bvh_margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::GRAVITY,
            max_contacts: 256,
            broad_phase: BroadPhaseMode::default(),
            collision: CollisionConfig::default(),
            solver: SolverConfig::default(),
            bvh_margin: 0.1,
        }
    }
}

/// The physics world: bodies, their colliders and forces, and the pipeline
/// that steps them.
///
/// Each step runs forces, integration, collider updates, the broad and
/// narrow phases and finally contact resolution.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    bodies: BodySet,
    registry: ForceRegistry,
    colliders: Vec<Option<Collider>>,
    free_colliders: Vec<u32>,
    /// Static half-spaces every collider is tested against
    planes: Vec<Plane>,
    bvh: Bvh<BoundingSphere, ColliderHandle>,
    collision: CollisionData,
    resolver: ContactResolver,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// A body takes part in collision detection only while it can move
fn is_active(bodies: &BodySet, handle: BodyHandle) -> bool {
    bodies
        .get(handle)
        .is_some_and(|body| body.is_awake() && body.has_finite_mass())
}

impl World {
    /// Creates an empty world
    pub fn new(config: WorldConfig) -> Self {
        debug!(
            "world created: gravity {:?}, {} contacts, {:?}",
            config.gravity, config.max_contacts, config.broad_phase
        );
        Self {
            bodies: BodySet::new(),
            registry: ForceRegistry::new(),
            colliders: Vec::new(),
            free_colliders: Vec::new(),
            planes: Vec::new(),
            bvh: Bvh::with_margin(config.bvh_margin),
            collision: CollisionData::new(config.max_contacts, config.collision),
            resolver: ContactResolver::new(config.solver),
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Creates a body, and a collider for it if the description has a shape
    pub fn create_body(&mut self, desc: RigidBodyDesc) -> Result<BodyHandle> {
        let mut body = desc.build()?;
        body.acceleration = self.config.gravity;
        let handle = self.bodies.insert(body);
        debug!("created body {handle:?}");

        if let Some(shape) = desc.shape {
            self.attach_collider(handle, shape, Mat4::IDENTITY)?;
        }
        Ok(handle)
    }

    /// Removes a body together with its colliders and force registrations
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let body = self
            .bodies
            .remove(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;

        for (index, slot) in self.colliders.iter_mut().enumerate() {
            if slot.is_some_and(|collider| collider.body == handle) {
                *slot = None;
                self.bvh.remove(ColliderHandle(index as u32));
                self.free_colliders.push(index as u32);
            }
        }
        self.registry.remove_body(handle);
        debug!("removed body {handle:?}");
        Ok(body)
    }

    /// Attaches a shape to a body, placed by `offset` in body space
    pub fn attach_collider(&mut self, body: BodyHandle, shape: Shape, offset: Mat4) -> Result<ColliderHandle> {
        let transform = self
            .bodies
            .get(body)
            .ok_or(PhysicsError::UnknownBody(body))?
            .transform();
        let mut collider = Collider::new(body, shape, offset);
        collider.update_transform(&transform);

        let handle = match self.free_colliders.pop() {
            Some(index) => {
                self.colliders[index as usize] = Some(collider);
                ColliderHandle(index)
            }
            None => {
                self.colliders.push(Some(collider));
                ColliderHandle(self.colliders.len() as u32 - 1)
            }
        };
        self.bvh.insert(handle, collider.bounding_sphere());
        debug!("attached collider {handle:?} to body {body:?}");
        Ok(handle)
    }

    /// Detaches a collider from its body
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<Collider> {
        let collider = self
            .colliders
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(PhysicsError::UnknownCollider(handle))?;
        self.bvh.remove(handle);
        self.free_colliders.push(handle.0);
        debug!("removed collider {handle:?}");
        Ok(collider)
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.index())?.as_ref()
    }

    /// Adds a static half-space
    pub fn add_plane(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Hands a force generator to the world's registry
    pub fn add_force_generator<G: ForceGenerator + 'static>(&mut self, generator: G) -> GeneratorHandle {
        self.registry.add_generator(generator)
    }

    /// Gets a generator as its concrete type
    pub fn force_generator_mut<G: ForceGenerator + 'static>(&mut self, handle: GeneratorHandle) -> Option<&mut G> {
        self.registry.generator_as(handle)
    }

    /// Applies a generator to a body every step from now on
    pub fn register_force(&mut self, body: BodyHandle, generator: GeneratorHandle) -> Result<()> {
        if !self.bodies.contains(body) {
            return Err(PhysicsError::UnknownBody(body));
        }
        self.registry.register(body, generator)
    }

    pub fn unregister_force(&mut self, body: BodyHandle, generator: GeneratorHandle) -> Result<()> {
        self.registry.unregister(body, generator)
    }

    /// Clears accumulated forces and refreshes derived data, so the host can
    /// add forces of its own before the next step
    pub fn start_frame(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.clear_accumulators();
            body.calculate_derived_data();
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive.
    pub fn step(&mut self, dt: f32) {
        assert!(dt > 0.0, "time step must be positive, got {dt}");

        self.registry.update_forces(&mut self.bodies, dt);
        for (_, body) in self.bodies.iter_mut() {
            integrate(body, dt);
        }

        self.update_colliders();
        self.generate_contacts();
        self.resolver
            .resolve_contacts(self.collision.contacts_mut(), &mut self.bodies, dt);
    }

    fn update_colliders(&mut self) {
        for (index, slot) in self.colliders.iter_mut().enumerate() {
            let Some(collider) = slot else {
                continue;
            };
            let Some(body) = self.bodies.get(collider.body) else {
                continue;
            };
            collider.update_transform(&body.transform());
            self.bvh
                .update(ColliderHandle(index as u32), collider.bounding_sphere());
        }
    }

    /// Fills the contact buffer from the broad and narrow phases
    fn generate_contacts(&mut self) {
        self.collision.reset();

        let pairs = match self.config.broad_phase {
            BroadPhaseMode::BoundingVolumeHierarchy => self.bvh.potential_contacts(usize::MAX),
            BroadPhaseMode::BruteForce => {
                let live: Vec<ColliderHandle> = self
                    .colliders
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_some())
                    .map(|(index, _)| ColliderHandle(index as u32))
                    .collect();
                brute_force_pairs(&live, usize::MAX)
            }
        };
        trace!("broad phase found {} potential contacts", pairs.len());

        for (a, b) in pairs {
            if !self.collision.has_more_contacts() {
                break;
            }
            let (Some(Some(one)), Some(Some(two))) =
                (self.colliders.get(a.index()), self.colliders.get(b.index()))
            else {
                continue;
            };
            if one.body == two.body || !(is_active(&self.bodies, one.body) || is_active(&self.bodies, two.body)) {
                continue;
            }
            collide(&one.primitive(), &two.primitive(), &mut self.collision);
        }

        for collider in self.colliders.iter().flatten() {
            if !is_active(&self.bodies, collider.body) {
                continue;
            }
            let primitive = collider.primitive();
            for plane in &self.planes {
                if !self.collision.has_more_contacts() {
                    break;
                }
                collide_half_space(&primitive, plane, &mut self.collision);
            }
        }
        trace!("narrow phase generated {} contacts", self.collision.len());
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// World position of a body's centre of mass
    pub fn body_position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| b.position)
    }

    pub fn body_orientation(&self, handle: BodyHandle) -> Option<Quat> {
        self.bodies.get(handle).map(|b| b.orientation)
    }

    /// Body-to-world transform, as used by renderers
    pub fn body_transform(&self, handle: BodyHandle) -> Option<Mat4> {
        self.bodies.get(handle).map(|b| b.transform())
    }

    /// Contacts generated by the last step, after resolution
    pub fn contacts(&self) -> &[Contact] {
        self.collision.contacts()
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Changes gravity for every existing and future body
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.acceleration = gravity;
        }
    }

    pub fn set_broad_phase(&mut self, mode: BroadPhaseMode) {
        self.config.broad_phase = mode;
    }

    pub fn set_collision_config(&mut self, config: CollisionConfig) {
        self.config.collision = config;
        self.collision.set_config(config);
    }

    pub fn set_solver_config(&mut self, config: SolverConfig) {
        self.config.solver = config;
        self.resolver.set_config(config);
    }
}
