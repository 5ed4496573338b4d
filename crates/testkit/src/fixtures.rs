//! Deterministic voxel layouts shared by tests and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voxgrid_world::{MaterialId, VoxelStore};

/// Fill the half-open box `[min, max)` with `material`. Returns the number of
/// voxels whose occupancy flipped.
pub fn fill_box<S: VoxelStore + ?Sized>(
    store: &mut S,
    min: [i32; 3],
    max: [i32; 3],
    material: MaterialId,
) -> usize {
    let mut flipped = 0;
    for z in min[2]..max[2] {
        for y in min[1]..max[1] {
            for x in min[0]..max[0] {
                if store.set(x, y, z, material) {
                    flipped += 1;
                }
            }
        }
    }
    flipped
}

/// Alternate solid and empty voxels inside `[0, extent)`, the layout with no
/// mergeable faces.
pub fn checkerboard<S: VoxelStore + ?Sized>(store: &mut S, extent: [i32; 3], material: MaterialId) {
    for z in 0..extent[2] {
        for y in 0..extent[1] {
            for x in 0..extent[0] {
                if (x + y + z) % 2 == 0 {
                    store.set(x, y, z, material);
                }
            }
        }
    }
}

/// Scatter materials `1..=materials` over `[0, extent)` with the given fill
/// probability. Same seed, same layout.
pub fn scatter<S: VoxelStore + ?Sized>(
    store: &mut S,
    extent: [i32; 3],
    density: f64,
    materials: MaterialId,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);
    let materials = materials.max(1);
    for z in 0..extent[2] {
        for y in 0..extent[1] {
            for x in 0..extent[0] {
                if rng.gen_bool(density) {
                    store.set(x, y, z, rng.gen_range(1..=materials));
                }
            }
        }
    }
}
