//! Seeded terrain fill for a voxel store.
//!
//! Z is up. Columns are filled from z = 0 to the column height; material and
//! auxiliary values come from the caller's RNG so the same seed always yields
//! the same world.

use glam::IVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::chunk::MaterialId;
use crate::grid::VoxelStore;
use crate::noise::{NoiseConfig, NoiseGenerator};
use crate::palette;

/// Height of the flat ground preset.
pub const GROUND_HEIGHT: i32 = 10;

/// Surface colours picked per voxel.
pub mod colours {
    pub const MOSS: u32 = 0x5f8f3a;
    pub const LOAM: u32 = 0x7a5a3c;
    pub const CLAY: u32 = 0xa77e4b;
    pub const SLATE: u32 = 0x6e6e73;
    pub const CHALK: u32 = 0xd8d2c4;
}

const PERLIN_COLOURS: [u32; 2] = [colours::MOSS, colours::LOAM];
const GROUND_COLOURS: [u32; 5] = [
    colours::MOSS,
    colours::LOAM,
    colours::CLAY,
    colours::SLATE,
    colours::CHALK,
];

/// Which fill to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    /// Noise-driven height field.
    #[default]
    Perlin,
    /// Flat slab [`GROUND_HEIGHT`] voxels thick.
    Ground,
    /// Leave the store untouched.
    Empty,
}

/// Counts from one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerrainSummary {
    pub columns: usize,
    pub solid_voxels: usize,
    pub max_height: i32,
}

/// Fills a store with terrain of a given kind.
pub struct TerrainGenerator {
    kind: TerrainKind,
    seed: u64,
    noise: NoiseGenerator,
}

impl TerrainGenerator {
    pub fn new(kind: TerrainKind, seed: u64) -> Self {
        Self {
            kind,
            seed,
            noise: NoiseGenerator::new(NoiseConfig::terrain(seed as u32)),
        }
    }

    /// Column height at `(x, y)` for a volume `size_z` voxels tall, in
    /// `[1, size_z]`.
    pub fn column_height(&self, x: i32, y: i32, size_z: i32) -> i32 {
        let raw = match self.kind {
            TerrainKind::Perlin => {
                let n = self.noise.sample_2d(x as f64, y as f64);
                ((size_z / 2) as f64 * (n + 0.5) * 0.5) as i32
            }
            TerrainKind::Ground => GROUND_HEIGHT,
            TerrainKind::Empty => return 0,
        };
        raw.clamp(1, size_z.max(1))
    }

    /// Generate with an RNG seeded from this generator's seed.
    pub fn generate<S: VoxelStore + ?Sized>(&self, store: &mut S, extent: IVec3) -> TerrainSummary {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.generate_with(store, extent, &mut rng)
    }

    /// Fill the box `[0, extent)` of `store`, drawing materials and aux values
    /// from `rng`.
    #[instrument(skip(self, store, rng), fields(kind = ?self.kind, seed = self.seed))]
    pub fn generate_with<S, R>(&self, store: &mut S, extent: IVec3, rng: &mut R) -> TerrainSummary
    where
        S: VoxelStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut summary = TerrainSummary::default();
        if self.kind == TerrainKind::Empty || extent.cmple(IVec3::ZERO).any() {
            return summary;
        }

        let table: &[u32] = match self.kind {
            TerrainKind::Perlin => &PERLIN_COLOURS,
            _ => &GROUND_COLOURS,
        };

        for x in 0..extent.x {
            for y in 0..extent.y {
                let height = self.column_height(x, y, extent.z);
                for z in 0..height {
                    let material = pick_material(table, rng);
                    let aux = rng.gen_range(1..=u8::MAX);
                    if store.set_with_aux(x, y, z, material, aux) {
                        summary.solid_voxels += 1;
                    }
                }
                summary.columns += 1;
                summary.max_height = summary.max_height.max(height);
            }
        }

        debug!(
            columns = summary.columns,
            solid = summary.solid_voxels,
            max_height = summary.max_height,
            "terrain generated"
        );
        summary
    }
}

fn pick_material<R: Rng + ?Sized>(table: &[u32], rng: &mut R) -> MaterialId {
    let rgb = table[rng.gen_range(0..table.len())];
    palette::encode_rgb24(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SparseVolume, VoxelGrid, DEFAULT_AUX, MATERIAL_EMPTY};

    #[test]
    fn ground_fills_ten_layers() {
        let mut grid = VoxelGrid::new(8, 8, 16).unwrap();
        let summary = TerrainGenerator::new(TerrainKind::Ground, 1).generate(&mut grid, IVec3::new(8, 8, 16));

        assert_eq!(summary.solid_voxels, 8 * 8 * 10);
        assert_eq!(summary.max_height, GROUND_HEIGHT);
        assert_ne!(grid.get(3, 3, 9), 0);
        assert_eq!(grid.get(3, 3, 10), 0);
    }

    #[test]
    fn ground_clamps_to_short_volumes() {
        let mut grid = VoxelGrid::new(2, 2, 4).unwrap();
        let summary = TerrainGenerator::new(TerrainKind::Ground, 1).generate(&mut grid, IVec3::new(2, 2, 4));
        assert_eq!(summary.solid_voxels, 2 * 2 * 4);
    }

    #[test]
    fn same_seed_same_world() {
        let extent = IVec3::new(24, 24, 32);
        let mut a = SparseVolume::new();
        let mut b = SparseVolume::new();
        TerrainGenerator::new(TerrainKind::Perlin, 99).generate(&mut a, extent);
        TerrainGenerator::new(TerrainKind::Perlin, 99).generate(&mut b, extent);

        for x in 0..extent.x {
            for y in 0..extent.y {
                for z in 0..extent.z {
                    assert_eq!(a.get(x, y, z), b.get(x, y, z), "diverged at ({x}, {y}, {z})");
                }
            }
        }
    }

    #[test]
    fn perlin_columns_are_at_least_one_tall() {
        let generator = TerrainGenerator::new(TerrainKind::Perlin, 7);
        for x in 0..32 {
            for y in 0..32 {
                let h = generator.column_height(x, y, 64);
                assert!((1..=64).contains(&h), "height {h} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn aux_values_span_the_byte_range() {
        let mut grid = VoxelGrid::with_aux(4, 4, 12).unwrap();
        TerrainGenerator::new(TerrainKind::Ground, 3).generate(&mut grid, IVec3::new(4, 4, 12));
        let mut aux = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..12 {
                    if grid.get(x, y, z) != MATERIAL_EMPTY {
                        aux.push(grid.aux(x, y, z));
                    }
                }
            }
        }
        assert!(!aux.is_empty());
        assert!(aux.iter().all(|&a| a >= 1));
        assert!(aux.iter().any(|&a| a > DEFAULT_AUX));
    }

    #[test]
    fn empty_kind_writes_nothing() {
        let mut volume = SparseVolume::new();
        let summary = TerrainGenerator::new(TerrainKind::Empty, 0).generate(&mut volume, IVec3::splat(32));
        assert_eq!(summary, TerrainSummary::default());
        assert!(volume.is_empty());
    }

    #[test]
    fn materials_decode_to_palette_colours() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        TerrainGenerator::new(TerrainKind::Ground, 5).generate(&mut grid, IVec3::new(4, 4, 4));
        assert!(palette::decode(grid.get(0, 0, 0)).is_some());
    }
}
