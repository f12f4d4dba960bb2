use serde::{Deserialize, Serialize};

use super::rigid_body::RigidBody;

/// A handle to a body in a [`BodySet`].
///
/// Handles are generational: once a body is removed its handle stays invalid
/// even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Returns the slot index
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the generation of the slot when the handle was issued
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<RigidBody>,
}

/// Arena owning every rigid body of a world
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodySet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the set holds no bodies
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a body and returns its handle
    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    /// Removes a body, returning it if the handle was live
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(body)
    }

    /// Returns true if the handle refers to a live body
    #[inline]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to a body
    #[inline]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    /// Gets a mutable reference to a body
    #[inline]
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    /// Mutably borrows two distinct bodies at once.
    ///
    /// Returns `None` if either handle is stale or both name the same body.
    pub fn get_pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (ia, ib) = (a.index(), b.index());
        let (first, second) = if ia < ib {
            let (left, right) = self.slots.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.slots.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        };
        Some((first.body.as_mut()?, second.body.as_mut()?))
    }

    /// Mutably borrows one body together with a read-only view of all the
    /// others.
    pub fn split_mut(&mut self, handle: BodyHandle) -> Option<(&mut RigidBody, BodyView<'_>)> {
        if !self.contains(handle) {
            return None;
        }
        let index = handle.index();
        let (before, rest) = self.slots.split_at_mut(index);
        let (slot, after) = rest.split_first_mut()?;
        let body = slot.body.as_mut()?;
        Some((
            body,
            BodyView {
                before,
                after,
                skipped: index,
            },
        ))
    }

    /// Iterates over live bodies
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    /// Iterates mutably over live bodies
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.body.as_mut().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation,
                    },
                    body,
                )
            })
        })
    }

    /// Handles of every live body, in slot order
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

/// Read-only access to every body except the one currently borrowed mutably.
#[derive(Debug)]
pub struct BodyView<'a> {
    before: &'a [Slot],
    after: &'a [Slot],
    skipped: usize,
}

impl<'a> BodyView<'a> {
    /// Gets another body; the mutably borrowed one reads as absent
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let index = handle.index();
        let slot = if index < self.skipped {
            self.before.get(index)
        } else if index > self.skipped {
            self.after.get(index - self.skipped - 1)
        } else {
            None
        }?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn body_at(x: f32) -> RigidBody {
        let mut body = RigidBody::default();
        body.position = Vec3::new(x, 0.0, 0.0);
        body
    }

    #[test]
    fn test_insert_and_get() {
        let mut set = BodySet::new();
        let a = set.insert(body_at(1.0));
        let b = set.insert(body_at(2.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(a).unwrap().position.x, 1.0);
        assert_eq!(set.get(b).unwrap().position.x, 2.0);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut set = BodySet::new();
        let a = set.insert(body_at(1.0));
        assert!(set.remove(a).is_some());
        let b = set.insert(body_at(2.0));

        // Slot reused, but the old handle must not alias the new body
        assert_eq!(a.index(), b.index());
        assert!(set.get(a).is_none());
        assert!(set.remove(a).is_none());
        assert_eq!(set.get(b).unwrap().position.x, 2.0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_get_pair_mut() {
        let mut set = BodySet::new();
        let a = set.insert(body_at(1.0));
        let b = set.insert(body_at(2.0));

        {
            let (ba, bb) = set.get_pair_mut(b, a).unwrap();
            assert_eq!(ba.position.x, 2.0);
            assert_eq!(bb.position.x, 1.0);
            ba.position.x = 5.0;
        }
        assert_eq!(set.get(b).unwrap().position.x, 5.0);
        assert!(set.get_pair_mut(a, a).is_none());
    }

    #[test]
    fn test_split_mut_view() {
        let mut set = BodySet::new();
        let a = set.insert(body_at(1.0));
        let b = set.insert(body_at(2.0));
        let c = set.insert(body_at(3.0));

        let (body, view) = set.split_mut(b).unwrap();
        assert_eq!(body.position.x, 2.0);
        assert_eq!(view.get(a).unwrap().position.x, 1.0);
        assert_eq!(view.get(c).unwrap().position.x, 3.0);
        assert!(view.get(b).is_none());
    }

    #[test]
    fn test_iteration_skips_removed() {
        let mut set = BodySet::new();
        let a = set.insert(body_at(1.0));
        let b = set.insert(body_at(2.0));
        set.remove(a);
        let handles = set.handles();
        assert_eq!(handles, vec![b]);
        for (_, body) in set.iter_mut() {
            body.position.x += 1.0;
        }
        assert_eq!(set.get(b).unwrap().position.x, 3.0);
    }
}
