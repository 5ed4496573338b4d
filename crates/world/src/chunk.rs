use std::fmt;

use glam::IVec3;

use crate::face::Face;

/// Chunk edge length in voxels.
pub const CHUNK_SIZE: usize = 32;
/// Shift converting an absolute coordinate into a chunk coordinate.
pub const CHUNK_SHIFT: u32 = 5;
/// Mask extracting the chunk-local part of an absolute coordinate.
pub const CHUNK_MASK: i32 = CHUNK_SIZE as i32 - 1;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;
/// Exclusive upper bound on absolute coordinates along every axis.
///
/// A whole number of chunks, so every chunk origin plus `CHUNK_SIZE` (the
/// far boundary plane a mesher reads) still fits in an `i32`.
pub const MAX_EXTENT: i32 = (i32::MAX >> CHUNK_SHIFT) << CHUNK_SHIFT;

/// Material identifier stored per voxel. Zero is empty.
pub type MaterialId = u16;

/// Reserved material for empty space.
pub const MATERIAL_EMPTY: MaterialId = 0;

/// Chunk-local position (X, Y, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Split an absolute, non-negative coordinate into its chunk-local part.
    pub fn from_absolute(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: (x & CHUNK_MASK) as usize,
            y: (y & CHUNK_MASK) as usize,
            z: (z & CHUNK_MASK) as usize,
        }
    }

    /// Convert to a linear index, X fastest then Y then Z.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE);
        debug_assert!(self.y < CHUNK_SIZE);
        debug_assert!(self.z < CHUNK_SIZE);
        self.x + self.y * CHUNK_SIZE + self.z * CHUNK_SIZE * CHUNK_SIZE
    }

    /// Component along `axis` (0 = X, 1 = Y, 2 = Z).
    pub fn axis(self, axis: usize) -> usize {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Chunk coordinate in chunk space.
///
/// Orders by x, then y, then z so BTreeMap iteration is deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk holding the absolute voxel coordinate.
    ///
    /// Callers only pass non-negative coordinates; the arithmetic shift floors
    /// regardless, so a negative input maps to a negative chunk rather than
    /// aliasing chunk zero.
    pub fn containing(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x >> CHUNK_SHIFT,
            y: y >> CHUNK_SHIFT,
            z: z >> CHUNK_SHIFT,
        }
    }

    /// Absolute coordinate of the chunk's (0, 0, 0) voxel.
    pub fn origin(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z) * CHUNK_SIZE as i32
    }

    /// Neighbouring chunk across `face`.
    pub fn neighbor(self, face: Face) -> Self {
        let offset = face.offset();
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
        }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Dense 32³ material array owned by one chunk of a sparse volume.
#[derive(Clone)]
pub struct ChunkVoxels {
    materials: Vec<MaterialId>,
    solid: usize,
}

impl ChunkVoxels {
    /// Allocate a chunk filled with empty space.
    pub fn new() -> Self {
        Self {
            materials: vec![MATERIAL_EMPTY; CHUNK_VOLUME],
            solid: 0,
        }
    }

    /// Fetch the material at a local position.
    pub fn get(&self, pos: LocalPos) -> MaterialId {
        self.materials[pos.index()]
    }

    /// Store a material and return the previous one.
    pub fn replace(&mut self, pos: LocalPos, material: MaterialId) -> MaterialId {
        let slot = &mut self.materials[pos.index()];
        let previous = std::mem::replace(slot, material);
        match (previous == MATERIAL_EMPTY, material == MATERIAL_EMPTY) {
            (true, false) => self.solid += 1,
            (false, true) => self.solid -= 1,
            _ => {}
        }
        previous
    }

    /// Number of non-empty voxels.
    pub fn solid_count(&self) -> usize {
        self.solid
    }

    /// True when every voxel is empty.
    pub fn is_empty(&self) -> bool {
        self.solid == 0
    }
}

impl Default for ChunkVoxels {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChunkVoxels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkVoxels")
            .field("solid", &self.solid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_pos_index() {
        let origin = LocalPos { x: 0, y: 0, z: 0 };
        assert_eq!(origin.index(), 0);

        let pos = LocalPos { x: 31, y: 0, z: 0 };
        assert_eq!(pos.index(), 31);

        let pos = LocalPos { x: 0, y: 1, z: 0 };
        assert_eq!(pos.index(), CHUNK_SIZE);

        let pos = LocalPos { x: 0, y: 0, z: 1 };
        assert_eq!(pos.index(), CHUNK_SIZE * CHUNK_SIZE);

        let last = LocalPos {
            x: 31,
            y: 31,
            z: 31,
        };
        assert_eq!(last.index(), CHUNK_VOLUME - 1);
    }

    #[test]
    fn chunk_containing_splits_absolute_coordinates() {
        assert_eq!(ChunkPos::containing(0, 0, 0), ChunkPos::new(0, 0, 0));
        assert_eq!(ChunkPos::containing(31, 32, 95), ChunkPos::new(0, 1, 2));

        let local = LocalPos::from_absolute(33, 64, 31);
        assert_eq!(local, LocalPos { x: 1, y: 0, z: 31 });
    }

    #[test]
    fn chunk_origin_and_neighbor() {
        let pos = ChunkPos::new(1, 2, 3);
        assert_eq!(pos.origin(), IVec3::new(32, 64, 96));
        assert_eq!(pos.neighbor(Face::XNeg), ChunkPos::new(0, 2, 3));
        assert_eq!(pos.neighbor(Face::ZPos), ChunkPos::new(1, 2, 4));
    }

    #[test]
    fn test_chunk_pos_display() {
        let pos = ChunkPos::new(5, 0, -3);
        assert_eq!(format!("{}", pos), "(5, 0, -3)");
    }

    #[test]
    fn test_chunk_pos_ordering() {
        let a = ChunkPos::new(0, 0, 0);
        let b = ChunkPos::new(0, 0, 1);
        let c = ChunkPos::new(1, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_chunk_pos_serialization() {
        let pos = ChunkPos::new(-5, 7, 10);
        let serialized = serde_json::to_string(&pos).unwrap();
        let deserialized: ChunkPos = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, pos);
    }

    #[test]
    fn chunk_voxels_tracks_solid_count() {
        let mut voxels = ChunkVoxels::new();
        assert!(voxels.is_empty());

        let pos = LocalPos { x: 1, y: 2, z: 3 };
        assert_eq!(voxels.replace(pos, 4), MATERIAL_EMPTY);
        assert_eq!(voxels.solid_count(), 1);
        assert_eq!(voxels.replace(pos, 9), 4);
        assert_eq!(voxels.solid_count(), 1);
        assert_eq!(voxels.get(pos), 9);
        voxels.replace(pos, MATERIAL_EMPTY);
        assert!(voxels.is_empty());
    }
}
