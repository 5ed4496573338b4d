use std::collections::BTreeMap;

use glam::IVec3;

use crate::chunk::{
    ChunkPos, ChunkVoxels, LocalPos, MaterialId, CHUNK_SIZE, MATERIAL_EMPTY, MAX_EXTENT,
};
use crate::grid::VoxelStore;

/// Voxel volume without a fixed extent that allocates 32³ chunks on first
/// write. Coordinates run from zero up to [`MAX_EXTENT`].
/// Uses BTreeMap so chunk iteration order is deterministic.
#[derive(Debug, Default, Clone)]
pub struct SparseVolume {
    chunks: BTreeMap<ChunkPos, ChunkVoxels>,
}

impl SparseVolume {
    pub fn new() -> Self {
        Self {
            chunks: BTreeMap::new(),
        }
    }

    /// Number of allocated chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunk has been allocated.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Attempt to fetch a chunk immutably.
    pub fn chunk(&self, pos: ChunkPos) -> Option<&ChunkVoxels> {
        self.chunks.get(&pos)
    }

    /// Obtain mutable access to a chunk, creating it if necessary.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut ChunkVoxels {
        self.chunks.entry(pos).or_default()
    }

    /// Total non-empty voxels across all chunks.
    pub fn solid_count(&self) -> usize {
        self.chunks.values().map(ChunkVoxels::solid_count).sum()
    }
}

impl VoxelStore for SparseVolume {
    fn get(&self, x: i32, y: i32, z: i32) -> MaterialId {
        if !self.contains(x, y, z) {
            return MATERIAL_EMPTY;
        }
        self.chunks
            .get(&ChunkPos::containing(x, y, z))
            .map_or(MATERIAL_EMPTY, |chunk| {
                chunk.get(LocalPos::from_absolute(x, y, z))
            })
    }

    fn set(&mut self, x: i32, y: i32, z: i32, material: MaterialId) -> bool {
        if !self.contains(x, y, z) {
            return false;
        }
        let pos = ChunkPos::containing(x, y, z);
        let local = LocalPos::from_absolute(x, y, z);
        let previous = if material == MATERIAL_EMPTY {
            // Clearing never allocates.
            match self.chunks.get_mut(&pos) {
                Some(chunk) => chunk.replace(local, material),
                None => return false,
            }
        } else {
            self.ensure_chunk(pos).replace(local, material)
        };
        (previous == MATERIAL_EMPTY) != (material == MATERIAL_EMPTY)
    }

    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let range = 0..MAX_EXTENT;
        range.contains(&x) && range.contains(&y) && range.contains(&z)
    }

    fn extent(&self) -> Option<IVec3> {
        None
    }

    fn resident_chunks(&self) -> Vec<ChunkPos> {
        self.chunks.keys().copied().collect()
    }

    fn is_resident(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_allocate_chunks_lazily() {
        let mut volume = SparseVolume::new();
        assert!(volume.is_empty());

        assert!(volume.set(40, 1, 70, 5));
        assert_eq!(volume.len(), 1);
        assert!(volume.chunk(ChunkPos::new(1, 0, 2)).is_some());
        assert!(volume.is_resident(ChunkPos::new(1, 0, 2)));
        assert!(!volume.is_resident(ChunkPos::new(0, 0, 0)));
        assert_eq!(volume.get(40, 1, 70), 5);
        assert_eq!(volume.get(41, 1, 70), MATERIAL_EMPTY);
    }

    #[test]
    fn clearing_a_missing_chunk_is_a_noop() {
        let mut volume = SparseVolume::new();
        assert!(!volume.set(3, 3, 3, MATERIAL_EMPTY));
        assert!(volume.is_empty());
    }

    #[test]
    fn negative_coordinates_are_out_of_range() {
        let mut volume = SparseVolume::new();
        assert!(!volume.set(-1, 0, 0, 2));
        assert_eq!(volume.get(-1, 0, 0), MATERIAL_EMPTY);
        assert!(volume.is_empty());
    }

    #[test]
    fn coordinates_stop_short_of_i32_max() {
        let mut volume = SparseVolume::new();
        assert!(!volume.contains(i32::MAX, 0, 0));
        assert!(!volume.set(i32::MAX, 0, 0, 1));
        assert!(!volume.set(0, MAX_EXTENT, 0, 1));
        assert!(volume.is_empty());

        assert!(volume.set(MAX_EXTENT - 1, 0, 0, 1));
        assert_eq!(volume.get(MAX_EXTENT - 1, 0, 0), 1);
        let last = ChunkPos::containing(MAX_EXTENT - 1, 0, 0);
        assert_eq!(last.origin().x + CHUNK_SIZE as i32, MAX_EXTENT);
    }

    #[test]
    fn set_reports_only_occupancy_flips() {
        let mut volume = SparseVolume::new();
        assert!(volume.set(0, 0, 0, 1));
        assert!(!volume.set(0, 0, 0, 1));
        assert!(!volume.set(0, 0, 0, 2));
        assert_eq!(volume.get(0, 0, 0), 2);
        assert!(volume.set(0, 0, 0, MATERIAL_EMPTY));
    }

    #[test]
    fn resident_chunks_are_sorted() {
        let mut volume = SparseVolume::new();
        volume.set(64, 0, 0, 1);
        volume.set(0, 0, 0, 1);
        volume.set(0, 0, 32, 1);
        assert_eq!(
            volume.resident_chunks(),
            vec![
                ChunkPos::new(0, 0, 0),
                ChunkPos::new(0, 0, 1),
                ChunkPos::new(2, 0, 0)
            ]
        );
        assert_eq!(volume.solid_count(), 3);
    }
}
