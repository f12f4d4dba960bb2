use std::collections::HashMap;
use std::hash::Hash;

use crate::geometry::BoundingVolume;

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
enum NodeKind<T> {
    Leaf(T),
    Internal([u32; 2]),
}

/// A node in the BVH tree
#[derive(Debug, Clone)]
struct BvhNode<V, T> {
    volume: V,
    parent: u32,
    kind: NodeKind<T>,
}

/// A bounding-volume hierarchy for broad-phase collision detection.
///
/// Every leaf holds one item and its (margin-inflated) volume. Internal
/// nodes always have exactly two children. Nodes live in an arena and refer
/// to each other by index.
#[derive(Debug, Clone)]
pub struct Bvh<V, T> {
    nodes: Vec<BvhNode<V, T>>,
    root: Option<u32>,
    /// Maps items to their leaf node indices
    leaves: HashMap<T, u32>,
    /// Free node list for reuse
    free_list: Vec<u32>,
    /// Margin added around stored volumes
    margin: f32,
}

impl<V: BoundingVolume, T: Copy + Eq + Hash> Default for Bvh<V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: BoundingVolume, T: Copy + Eq + Hash> Bvh<V, T> {
    /// Creates a new empty BVH without a margin
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            leaves: HashMap::new(),
            free_list: Vec::new(),
            margin: 0.0,
        }
    }

    /// Creates a BVH that stores volumes inflated by `margin`
    pub fn with_margin(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
            ..Self::new()
        }
    }

    /// Inserts an item. An item already present is moved to `volume`.
    ///
    /// The leaf reached by descending toward the child that would grow least
    /// is split into an internal node holding the old leaf and the new one.
    pub fn insert(&mut self, item: T, volume: V) {
        if self.leaves.contains_key(&item) {
            self.remove(item);
        }
        let volume = volume.inflated(self.margin);

        let Some(root) = self.root else {
            let leaf = self.allocate(volume, NONE, NodeKind::Leaf(item));
            self.root = Some(leaf);
            self.leaves.insert(item, leaf);
            return;
        };

        // Descend to the leaf where growth is smallest
        let mut current = root;
        while let NodeKind::Internal([left, right]) = self.nodes[current as usize].kind {
            let left_growth = self.nodes[left as usize].volume.growth(&volume);
            let right_growth = self.nodes[right as usize].volume.growth(&volume);
            current = if left_growth < right_growth { left } else { right };
        }

        // Split the leaf: its item moves into a new child beside the new item
        let NodeKind::Leaf(existing) = self.nodes[current as usize].kind else {
            unreachable!("descent always ends on a leaf");
        };
        let existing_volume = self.nodes[current as usize].volume;
        let first = self.allocate(existing_volume, current, NodeKind::Leaf(existing));
        let second = self.allocate(volume, current, NodeKind::Leaf(item));
        self.nodes[current as usize].kind = NodeKind::Internal([first, second]);
        self.leaves.insert(existing, first);
        self.leaves.insert(item, second);

        self.refit(current);
    }

    /// Removes an item, promoting its sibling into the parent's slot.
    ///
    /// Returns false if the item was not present.
    pub fn remove(&mut self, item: T) -> bool {
        let Some(leaf) = self.leaves.remove(&item) else {
            return false;
        };

        let parent = self.nodes[leaf as usize].parent;
        if parent == NONE {
            self.root = None;
            self.free_node(leaf);
            return true;
        }

        let NodeKind::Internal([left, right]) = self.nodes[parent as usize].kind else {
            unreachable!("a parent is always internal");
        };
        let sibling = if left == leaf { right } else { left };

        // Copy the sibling into the parent
        let sibling_node = self.nodes[sibling as usize].clone();
        self.nodes[parent as usize].volume = sibling_node.volume;
        self.nodes[parent as usize].kind = sibling_node.kind;
        match sibling_node.kind {
            NodeKind::Leaf(moved) => {
                self.leaves.insert(moved, parent);
            }
            NodeKind::Internal(children) => {
                for child in children {
                    self.nodes[child as usize].parent = parent;
                }
            }
        }

        self.free_node(leaf);
        self.free_node(sibling);
        self.refit(self.nodes[parent as usize].parent);
        true
    }

    /// Moves an item to a new volume.
    ///
    /// Nothing changes while the stored (inflated) volume still contains the
    /// new one. Returns true if the item was reinserted.
    pub fn update(&mut self, item: T, volume: V) -> bool {
        match self.leaves.get(&item) {
            Some(&leaf) if self.nodes[leaf as usize].volume.contains(&volume) => false,
            _ => {
                self.insert(item, volume);
                true
            }
        }
    }

    /// Collects up to `limit` pairs of items whose volumes overlap.
    ///
    /// Pairs are candidates for exact testing, not confirmed contacts. Each
    /// unordered pair appears once.
    pub fn potential_contacts(&self, limit: usize) -> Vec<(T, T)> {
        let mut pairs = Vec::new();
        if let Some(root) = self.root {
            self.pairs_within(root, limit, &mut pairs);
        }
        pairs
    }

    fn pairs_within(&self, node: u32, limit: usize, out: &mut Vec<(T, T)>) {
        if out.len() >= limit {
            return;
        }
        if let NodeKind::Internal([left, right]) = self.nodes[node as usize].kind {
            self.pairs_within(left, limit, out);
            self.pairs_within(right, limit, out);
            self.pairs_between(left, right, limit, out);
        }
    }

    fn pairs_between(&self, a: u32, b: u32, limit: usize, out: &mut Vec<(T, T)>) {
        if out.len() >= limit {
            return;
        }
        let (node_a, node_b) = (&self.nodes[a as usize], &self.nodes[b as usize]);
        if !node_a.volume.overlaps(&node_b.volume) {
            return;
        }

        match (node_a.kind, node_b.kind) {
            (NodeKind::Leaf(x), NodeKind::Leaf(y)) => out.push((x, y)),
            // Descend into the larger volume first
            (NodeKind::Internal([l, r]), NodeKind::Leaf(_)) => {
                self.pairs_between(l, b, limit, out);
                self.pairs_between(r, b, limit, out);
            }
            (NodeKind::Leaf(_), NodeKind::Internal([l, r])) => {
                self.pairs_between(a, l, limit, out);
                self.pairs_between(a, r, limit, out);
            }
            (NodeKind::Internal([l, r]), NodeKind::Internal(_))
                if node_a.volume.size() >= node_b.volume.size() =>
            {
                self.pairs_between(l, b, limit, out);
                self.pairs_between(r, b, limit, out);
            }
            (NodeKind::Internal(_), NodeKind::Internal([l, r])) => {
                self.pairs_between(a, l, limit, out);
                self.pairs_between(a, r, limit, out);
            }
        }
    }

    /// The stored volume of an item
    pub fn volume_of(&self, item: T) -> Option<V> {
        self.leaves.get(&item).map(|&leaf| self.nodes[leaf as usize].volume)
    }

    /// Volume enclosing everything
    pub fn root_volume(&self) -> Option<V> {
        self.root.map(|root| self.nodes[root as usize].volume)
    }

    /// Returns true if the item is in the tree
    pub fn contains(&self, item: T) -> bool {
        self.leaves.contains_key(&item)
    }

    /// Returns the number of items in the BVH
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns true if the BVH is empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Clears all items from the BVH
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaves.clear();
        self.free_list.clear();
    }

    fn allocate(&mut self, volume: V, parent: u32, kind: NodeKind<T>) -> u32 {
        let node = BvhNode {
            volume,
            parent,
            kind,
        };
        if let Some(index) = self.free_list.pop() {
            self.nodes[index as usize] = node;
            index
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(node);
            index
        }
    }

    fn free_node(&mut self, index: u32) {
        self.free_list.push(index);
    }

    /// Recomputes internal volumes from `start` up to the root
    fn refit(&mut self, start: u32) {
        let mut current = start;
        while current != NONE {
            if let NodeKind::Internal([left, right]) = self.nodes[current as usize].kind {
                let merged = self.nodes[left as usize]
                    .volume
                    .merged(&self.nodes[right as usize].volume);
                self.nodes[current as usize].volume = merged;
            }
            current = self.nodes[current as usize].parent;
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        let Some(root) = self.root else {
            assert!(self.leaves.is_empty());
            return;
        };
        assert_eq!(self.nodes[root as usize].parent, NONE);
        let mut stack = vec![root];
        let mut leaf_count = 0;
        while let Some(node) = stack.pop() {
            match self.nodes[node as usize].kind {
                NodeKind::Leaf(item) => {
                    assert_eq!(self.leaves.get(&item), Some(&node));
                    leaf_count += 1;
                }
                NodeKind::Internal(children) => {
                    for child in children {
                        assert_eq!(self.nodes[child as usize].parent, node);
                        assert!(self.nodes[node as usize]
                            .volume
                            .inflated(1e-3)
                            .contains(&self.nodes[child as usize].volume));
                        stack.push(child);
                    }
                }
            }
        }
        assert_eq!(leaf_count, self.leaves.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Aabb, BoundingSphere};
    use crate::math::Vec3;
    use proptest::prelude::*;

    fn sphere(x: f32, r: f32) -> BoundingSphere {
        BoundingSphere::new(Vec3::new(x, 0.0, 0.0), r)
    }

    fn normalized(mut pairs: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
        for p in pairs.iter_mut() {
            if p.0 > p.1 {
                *p = (p.1, p.0);
            }
        }
        pairs.sort();
        pairs
    }

    #[test]
    fn test_insert_and_query() {
        let mut bvh = Bvh::new();
        bvh.insert(0u32, sphere(0.0, 1.0));
        bvh.insert(1, sphere(1.5, 1.0));
        bvh.insert(2, sphere(10.0, 1.0));
        bvh.check_invariants();

        let pairs = normalized(bvh.potential_contacts(16));
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_pairs_within_subtrees() {
        // Pairs inside a subtree are reported as well as pairs across subtrees
        let mut bvh = Bvh::new();
        bvh.insert(0u32, sphere(0.0, 1.0));
        bvh.insert(1, sphere(1.0, 1.0));
        bvh.insert(2, sphere(100.0, 1.0));
        bvh.insert(3, sphere(101.0, 1.0));
        bvh.check_invariants();

        let pairs = normalized(bvh.potential_contacts(16));
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_limit() {
        let mut bvh = Bvh::new();
        for i in 0..6u32 {
            bvh.insert(i, sphere(i as f32 * 0.1, 1.0));
        }
        assert_eq!(bvh.potential_contacts(3).len(), 3);
        assert_eq!(bvh.potential_contacts(100).len(), 15);
    }

    #[test]
    fn test_remove() {
        let mut bvh = Bvh::new();
        bvh.insert(0u32, sphere(0.0, 1.0));
        bvh.insert(1, sphere(1.5, 1.0));
        bvh.insert(2, sphere(3.0, 1.0));
        assert_eq!(bvh.len(), 3);

        assert!(bvh.remove(1));
        assert!(!bvh.remove(1));
        bvh.check_invariants();
        assert_eq!(bvh.len(), 2);
        assert!(bvh.potential_contacts(16).is_empty());

        assert!(bvh.remove(0));
        assert!(bvh.remove(2));
        assert!(bvh.is_empty());
    }

    #[test]
    fn test_remove_refits_root() {
        let mut bvh = Bvh::new();
        bvh.insert(0u32, sphere(0.0, 1.0));
        bvh.insert(1, sphere(50.0, 1.0));
        bvh.insert(2, sphere(2.0, 1.0));
        bvh.remove(1);
        bvh.check_invariants();
        let root = bvh.root_volume().unwrap();
        assert!(root.radius < 5.0);
    }

    #[test]
    fn test_update_with_margin() {
        let mut bvh = Bvh::with_margin(0.5);
        bvh.insert(0u32, sphere(0.0, 1.0));
        bvh.insert(1, sphere(5.0, 1.0));

        // Small motion stays inside the inflated volume
        assert!(!bvh.update(0, sphere(0.2, 1.0)));
        assert!(bvh.potential_contacts(16).is_empty());

        // Move body 1 onto body 0
        assert!(bvh.update(1, sphere(0.5, 1.0)));
        bvh.check_invariants();
        assert_eq!(normalized(bvh.potential_contacts(16)), vec![(0, 1)]);
    }

    #[test]
    fn test_aabb_volumes() {
        let mut bvh = Bvh::new();
        bvh.insert("a", Aabb::new(Vec3::ZERO, Vec3::ONE));
        bvh.insert("b", Aabb::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.5, 1.0, 1.0)));
        bvh.insert("c", Aabb::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 1.0, 1.0)));

        let pairs = bvh.potential_contacts(16);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0] == ("a", "b") || pairs[0] == ("b", "a"));
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            xs in proptest::collection::vec((-20.0f32..20.0, -20.0f32..20.0, 0.5f32..3.0), 1..24),
            removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let volumes: Vec<BoundingSphere> = xs
                .iter()
                .map(|&(x, y, r)| BoundingSphere::new(Vec3::new(x, y, 0.0), r))
                .collect();
            let mut bvh = Bvh::new();
            for (i, v) in volumes.iter().enumerate() {
                bvh.insert(i as u32, *v);
            }
            let mut alive: Vec<u32> = (0..volumes.len() as u32).collect();
            for index in removals {
                if alive.is_empty() {
                    break;
                }
                let victim = alive.remove(index.index(alive.len()));
                bvh.remove(victim);
            }
            bvh.check_invariants();

            // Every truly overlapping pair must be reported
            let pairs = normalized(bvh.potential_contacts(usize::MAX));
            for (ai, &a) in alive.iter().enumerate() {
                for &b in &alive[ai + 1..] {
                    let (lo, hi) = (a.min(b), a.max(b));
                    if volumes[a as usize].overlaps(&volumes[b as usize]) {
                        prop_assert!(pairs.binary_search(&(lo, hi)).is_ok());
                    }
                }
            }
            // And each pair only once
            let mut deduped = pairs.clone();
            deduped.dedup();
            prop_assert_eq!(deduped.len(), pairs.len());
        }
    }
}
