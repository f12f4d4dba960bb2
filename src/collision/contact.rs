use log::warn;
use serde::{Deserialize, Serialize};

use crate::dynamics::BodyHandle;
use crate::math::{Mat3, Vec3};

/// Material and detection parameters applied to every contact generated
/// during a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Friction coefficient; 0 disables the friction impulse
    pub friction: f32,
    /// Coefficient of restitution in [0, 1]
    pub restitution: f32,
    /// Contact slop handed to generators; the built-in ones only emit
    /// contacts for actual overlap
    pub tolerance: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            friction: 0.0,
            restitution: 0.4,
            tolerance: 0.1,
        }
    }
}

/// A single contact between one or two bodies.
///
/// The normal points from the second body toward the first; resolving the
/// contact pushes `bodies[0]` along it. A missing second body stands for the
/// immovable world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub bodies: [Option<BodyHandle>; 2],
    /// Contact point in world space
    pub contact_point: Vec3,
    /// Contact normal in world space
    pub contact_normal: Vec3,
    /// Depth of overlap along the normal
    pub penetration: f32,
    pub restitution: f32,
    pub friction: f32,

    // Written by the resolver
    pub(crate) contact_to_world: Mat3,
    pub(crate) contact_velocity: Vec3,
    pub(crate) desired_delta_velocity: f32,
    pub(crate) relative_contact_position: [Vec3; 2],
}

impl Contact {
    /// Creates a contact with zeroed resolver state
    pub fn new(
        bodies: [Option<BodyHandle>; 2],
        contact_point: Vec3,
        contact_normal: Vec3,
        penetration: f32,
        restitution: f32,
        friction: f32,
    ) -> Self {
        Self {
            bodies,
            contact_point,
            contact_normal,
            penetration,
            restitution,
            friction,
            contact_to_world: Mat3::IDENTITY,
            contact_velocity: Vec3::ZERO,
            desired_delta_velocity: 0.0,
            relative_contact_position: [Vec3::ZERO; 2],
        }
    }

    /// Basis whose x axis is the contact normal
    pub fn contact_to_world(&self) -> Mat3 {
        self.contact_to_world
    }

    /// Closing velocity in contact space, as last computed by the resolver
    pub fn contact_velocity(&self) -> Vec3 {
        self.contact_velocity
    }

    /// Velocity change along the normal the resolver is aiming for
    pub fn desired_delta_velocity(&self) -> f32 {
        self.desired_delta_velocity
    }

    /// Contact point relative to each body's centre
    pub fn relative_contact_position(&self) -> [Vec3; 2] {
        self.relative_contact_position
    }

    /// Returns true if the contact involves `body`
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.bodies.contains(&Some(body))
    }
}

/// The growable contact buffer filled by the narrow phase.
///
/// Detectors stop writing once `capacity` contacts exist; the buffer is
/// cleared at the start of every step.
#[derive(Debug, Clone)]
pub struct CollisionData {
    contacts: Vec<Contact>,
    capacity: usize,
    pub friction: f32,
    pub restitution: f32,
    pub tolerance: f32,
    exhausted: bool,
}

impl CollisionData {
    /// Creates an empty buffer
    pub fn new(capacity: usize, config: CollisionConfig) -> Self {
        Self {
            contacts: Vec::with_capacity(capacity),
            capacity,
            friction: config.friction,
            restitution: config.restitution,
            tolerance: config.tolerance,
            exhausted: false,
        }
    }

    /// Drops every contact
    pub fn reset(&mut self) {
        self.contacts.clear();
        self.exhausted = false;
    }

    /// Changes the material and tolerance for contacts generated from now on
    pub fn set_config(&mut self, config: CollisionConfig) {
        self.friction = config.friction;
        self.restitution = config.restitution;
        self.tolerance = config.tolerance;
    }

    /// Changes the contact budget
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.contacts.truncate(capacity);
    }

    /// How many more contacts fit
    #[inline]
    pub fn contacts_left(&self) -> usize {
        self.capacity.saturating_sub(self.contacts.len())
    }

    /// Returns true if another contact fits
    #[inline]
    pub fn has_more_contacts(&self) -> bool {
        self.contacts_left() > 0
    }

    /// Adds a contact tagged with the configured material.
    ///
    /// Returns false, and logs once per step, if the budget is spent.
    pub fn add_contact(
        &mut self,
        bodies: [Option<BodyHandle>; 2],
        point: Vec3,
        normal: Vec3,
        penetration: f32,
    ) -> bool {
        if !self.has_more_contacts() {
            if !self.exhausted {
                warn!("contact buffer exhausted at {} contacts", self.capacity);
                self.exhausted = true;
            }
            return false;
        }
        self.contacts.push(Contact::new(
            bodies,
            point,
            normal,
            penetration,
            self.restitution,
            self.friction,
        ));
        true
    }

    /// Number of contacts held
    #[inline]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns true if no contacts are held
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// The contacts generated so far
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// The contacts generated so far, mutably
    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget() {
        let mut data = CollisionData::new(2, CollisionConfig::default());
        assert_eq!(data.contacts_left(), 2);
        assert!(data.add_contact([None, None], Vec3::ZERO, Vec3::Y, 0.1));
        assert!(data.add_contact([None, None], Vec3::ZERO, Vec3::Y, 0.1));
        assert!(!data.add_contact([None, None], Vec3::ZERO, Vec3::Y, 0.1));
        assert_eq!(data.len(), 2);
        assert_eq!(data.contacts_left(), 0);

        data.reset();
        assert!(data.is_empty());
        assert!(data.has_more_contacts());
    }

    #[test]
    fn test_contacts_carry_material() {
        let config = CollisionConfig {
            friction: 0.7,
            restitution: 0.2,
            tolerance: 0.0,
        };
        let mut data = CollisionData::new(4, config);
        data.add_contact([None, None], Vec3::ZERO, Vec3::Y, 0.5);
        let contact = data.contacts()[0];
        assert_eq!(contact.friction, 0.7);
        assert_eq!(contact.restitution, 0.2);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: CollisionConfig = serde_json::from_str(r#"{ "friction": 0.9 }"#).unwrap();
        assert_eq!(config.friction, 0.9);
        assert_eq!(config.restitution, 0.4);
        assert_eq!(config.tolerance, 0.1);
    }
}
