//! Property-based tests for voxel storage
//!
//! Critical invariants:
//! - Dense indexing is a bijection onto `[0, volume)`
//! - `set` reports exactly the empty/non-empty flips
//! - Dense and sparse stores agree on every in-range read

use std::collections::HashSet;

use proptest::prelude::*;
use voxgrid_world::{SparseVolume, VoxelGrid, VoxelStore, MATERIAL_EMPTY};

proptest! {
    /// Property: every in-range coordinate maps to a distinct index and the
    /// indices cover the whole backing array.
    #[test]
    fn dense_index_is_bijective(
        sx in 1u32..12,
        sy in 1u32..12,
        sz in 1u32..12,
    ) {
        let grid = VoxelGrid::new(sx, sy, sz).unwrap();
        let mut seen = HashSet::new();
        for z in 0..sz as usize {
            for y in 0..sy as usize {
                for x in 0..sx as usize {
                    let idx = grid.index(x, y, z);
                    prop_assert!(idx < grid.volume(), "index {} past volume {}", idx, grid.volume());
                    prop_assert!(seen.insert(idx), "index {} produced twice", idx);
                }
            }
        }
        prop_assert_eq!(seen.len(), grid.volume());
    }

    /// Property: `set` returns true iff occupancy flips, for any write sequence.
    #[test]
    fn set_reports_occupancy_flips(
        writes in prop::collection::vec((0i32..6, 0i32..6, 0i32..6, 0u16..4), 1..200),
    ) {
        let mut grid = VoxelGrid::new(6, 6, 6).unwrap();
        for (x, y, z, material) in writes {
            let before = grid.get(x, y, z);
            let flipped = grid.set(x, y, z, material);
            prop_assert_eq!(flipped, (before == MATERIAL_EMPTY) != (material == MATERIAL_EMPTY));
            prop_assert_eq!(grid.get(x, y, z), material);
        }
    }

    /// Property: writing a solid material twice reports true then false.
    #[test]
    fn repeated_solid_write_flips_once(
        x in 0i32..8, y in 0i32..8, z in 0i32..8,
        material in 1u16..=255,
    ) {
        let mut grid = VoxelGrid::new(8, 8, 8).unwrap();
        prop_assert!(grid.set(x, y, z, material));
        prop_assert!(!grid.set(x, y, z, material));
    }

    /// Property: out-of-range reads are empty and writes are rejected.
    #[test]
    fn out_of_range_is_soft(
        x in -20i32..20, y in -20i32..20, z in -20i32..20,
    ) {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        let inside = (0..4).contains(&x) && (0..4).contains(&y) && (0..4).contains(&z);
        prop_assert_eq!(grid.set(x, y, z, 1), inside);
        prop_assert_eq!(grid.get(x, y, z) != MATERIAL_EMPTY, inside);
    }

    /// Property: the sparse volume behaves like a dense grid of the same size.
    #[test]
    fn sparse_matches_dense(
        writes in prop::collection::vec((0i32..70, 0i32..40, 0i32..40, 0u16..3), 0..150),
    ) {
        let mut dense = VoxelGrid::new(70, 40, 40).unwrap();
        let mut sparse = SparseVolume::new();
        for &(x, y, z, material) in &writes {
            let a = dense.set(x, y, z, material);
            let b = sparse.set(x, y, z, material);
            prop_assert_eq!(a, b, "flip mismatch at ({}, {}, {})", x, y, z);
        }
        for &(x, y, z, _) in &writes {
            prop_assert_eq!(dense.get(x, y, z), sparse.get(x, y, z));
        }
        prop_assert_eq!(dense.solid_count(), sparse.solid_count());
    }
}
