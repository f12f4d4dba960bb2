//! Broad phase: cheap culling of pairs before exact tests.

mod bvh;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingVolume;

pub use bvh::Bvh;

/// How candidate pairs are found each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BroadPhaseMode {
    /// Query a bounding-volume hierarchy
    #[default]
    BoundingVolumeHierarchy,
    /// Hand every pair to the narrow phase
    BruteForce,
}

/// Every unordered pair of items, up to `limit` pairs.
///
/// No culling is done; the narrow phase's own early-outs reject the pairs
/// that do not touch.
pub fn brute_force_pairs<T: Copy>(items: &[T], limit: usize) -> Vec<(T, T)> {
    let mut pairs = Vec::new();
    'outer: for (i, &a) in items.iter().enumerate() {
        for &b in &items[i + 1..] {
            if pairs.len() >= limit {
                break 'outer;
            }
            pairs.push((a, b));
        }
    }
    pairs
}

/// Pairs of items whose volumes overlap, by testing all of them.
pub fn overlapping_pairs<T: Copy, V: BoundingVolume>(items: &[(T, V)], limit: usize) -> Vec<(T, T)> {
    let mut pairs = Vec::new();
    'outer: for (i, (a, va)) in items.iter().enumerate() {
        for (b, vb) in &items[i + 1..] {
            if pairs.len() >= limit {
                break 'outer;
            }
            if va.overlaps(vb) {
                pairs.push((*a, *b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingSphere;
    use crate::math::Vec3;

    #[test]
    fn test_brute_force_pairs() {
        let pairs = brute_force_pairs(&[1, 2, 3], 10);
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(brute_force_pairs(&[1, 2, 3], 2).len(), 2);
        assert!(brute_force_pairs(&[1], 10).is_empty());
    }

    #[test]
    fn test_overlapping_pairs_agree_with_bvh() {
        let items: Vec<(u32, BoundingSphere)> = (0..8)
            .map(|i| (i, BoundingSphere::new(Vec3::new(i as f32 * 1.5, 0.0, 0.0), 1.0)))
            .collect();
        let mut expected = overlapping_pairs(&items, usize::MAX);
        expected.sort();

        let mut bvh = Bvh::new();
        for (item, volume) in &items {
            bvh.insert(*item, *volume);
        }
        let mut found: Vec<(u32, u32)> = bvh
            .potential_contacts(usize::MAX)
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        found.sort();
        assert_eq!(found, expected);
        assert_eq!(found.len(), 7);
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(BroadPhaseMode::default(), BroadPhaseMode::BoundingVolumeHierarchy);
    }
}
