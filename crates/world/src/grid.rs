//! Dense voxel grid and the storage contract shared with the sparse volume.

use glam::IVec3;
use thiserror::Error;

use crate::chunk::{ChunkPos, MaterialId, CHUNK_SIZE, MATERIAL_EMPTY, MAX_EXTENT};
use crate::face::Face;

/// Auxiliary scalar written when the caller does not supply one.
pub const DEFAULT_AUX: u8 = 15;

/// Absolute-coordinate voxel access shared by every storage strategy.
///
/// Reads outside the stored range return [`MATERIAL_EMPTY`]; writes outside
/// it are ignored and report `false`. Neither ever errors.
pub trait VoxelStore {
    /// Material at an absolute coordinate.
    fn get(&self, x: i32, y: i32, z: i32) -> MaterialId;

    /// Store a material. Returns true iff the voxel flipped between empty and
    /// non-empty; a solid-to-solid material change is stored but reports false.
    fn set(&mut self, x: i32, y: i32, z: i32, material: MaterialId) -> bool;

    /// Like [`VoxelStore::set`], also recording the auxiliary scalar where the
    /// store keeps one.
    fn set_with_aux(&mut self, x: i32, y: i32, z: i32, material: MaterialId, aux: u8) -> bool {
        let _ = aux;
        self.set(x, y, z, material)
    }

    /// Whether the coordinate is addressable.
    fn contains(&self, x: i32, y: i32, z: i32) -> bool;

    /// Exclusive upper corner of the addressable range, `None` when unbounded.
    /// The lower corner is always the origin.
    fn extent(&self) -> Option<IVec3>;

    /// Chunks currently backed by storage, in ascending order.
    fn resident_chunks(&self) -> Vec<ChunkPos>;

    /// Whether the chunk at `pos` is backed by storage.
    fn is_resident(&self, pos: ChunkPos) -> bool {
        self.resident_chunks().contains(&pos)
    }

    /// True when the neighbour across `face` is empty or outside the store.
    fn is_empty_across(&self, x: i32, y: i32, z: i32, face: Face) -> bool {
        let adjacent = face.adjacent(IVec3::new(x, y, z));
        self.get(adjacent.x, adjacent.y, adjacent.z) == MATERIAL_EMPTY
    }
}

/// Errors raised when constructing a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Every dimension must be positive.
    #[error("grid dimensions must be positive, got {0}x{1}x{2}")]
    ZeroDimension(u32, u32, u32),
    /// Dimensions must stay within `MAX_EXTENT` and fit in memory.
    #[error("grid dimensions {0}x{1}x{2} are too large")]
    TooLarge(u32, u32, u32),
}

/// Fixed-size dense volume with one material per voxel and an optional
/// auxiliary byte ("brightness"/"health").
#[derive(Clone)]
pub struct VoxelGrid {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    materials: Vec<MaterialId>,
    aux: Option<Vec<u8>>,
}

impl VoxelGrid {
    /// Allocate an empty grid without auxiliary storage.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Result<Self, GridError> {
        Self::build(size_x, size_y, size_z, false)
    }

    /// Allocate an empty grid with a parallel auxiliary byte per voxel.
    pub fn with_aux(size_x: u32, size_y: u32, size_z: u32) -> Result<Self, GridError> {
        Self::build(size_x, size_y, size_z, true)
    }

    fn build(size_x: u32, size_y: u32, size_z: u32, with_aux: bool) -> Result<Self, GridError> {
        if size_x == 0 || size_y == 0 || size_z == 0 {
            return Err(GridError::ZeroDimension(size_x, size_y, size_z));
        }
        let limit = MAX_EXTENT as u32;
        if size_x > limit || size_y > limit || size_z > limit {
            return Err(GridError::TooLarge(size_x, size_y, size_z));
        }
        let volume = (size_x as usize)
            .checked_mul(size_y as usize)
            .and_then(|v| v.checked_mul(size_z as usize))
            .ok_or(GridError::TooLarge(size_x, size_y, size_z))?;

        Ok(Self {
            size_x: size_x as usize,
            size_y: size_y as usize,
            size_z: size_z as usize,
            materials: vec![MATERIAL_EMPTY; volume],
            aux: with_aux.then(|| vec![DEFAULT_AUX; volume]),
        })
    }

    /// Dimensions as `[x, y, z]`.
    pub fn size(&self) -> [usize; 3] {
        [self.size_x, self.size_y, self.size_z]
    }

    /// Total voxel count.
    pub fn volume(&self) -> usize {
        self.materials.len()
    }

    pub fn has_aux(&self) -> bool {
        self.aux.is_some()
    }

    /// Linear index of an in-range coordinate: `x + y*sx + z*sx*sy`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.size_x && y < self.size_y && z < self.size_z);
        x + y * self.size_x + z * self.size_x * self.size_y
    }

    #[inline]
    fn checked_index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.size_x || y >= self.size_y || z >= self.size_z {
            return None;
        }
        Some(self.index(x, y, z))
    }

    /// Auxiliary byte at a coordinate; [`DEFAULT_AUX`] when out of range or
    /// when the grid carries no auxiliary storage.
    pub fn aux(&self, x: i32, y: i32, z: i32) -> u8 {
        match (&self.aux, self.checked_index(x, y, z)) {
            (Some(aux), Some(idx)) => aux[idx],
            _ => DEFAULT_AUX,
        }
    }

    /// Number of non-empty voxels.
    pub fn solid_count(&self) -> usize {
        self.materials
            .iter()
            .filter(|&&m| m != MATERIAL_EMPTY)
            .count()
    }

    /// Chunk coordinates covering the grid; partial chunks at the far edges
    /// are included.
    pub fn chunk_dims(&self) -> [i32; 3] {
        let chunks = |size: usize| size.div_ceil(CHUNK_SIZE) as i32;
        [
            chunks(self.size_x),
            chunks(self.size_y),
            chunks(self.size_z),
        ]
    }
}

impl VoxelStore for VoxelGrid {
    fn get(&self, x: i32, y: i32, z: i32) -> MaterialId {
        self.checked_index(x, y, z)
            .map_or(MATERIAL_EMPTY, |idx| self.materials[idx])
    }

    fn set(&mut self, x: i32, y: i32, z: i32, material: MaterialId) -> bool {
        self.set_with_aux(x, y, z, material, DEFAULT_AUX)
    }

    fn set_with_aux(&mut self, x: i32, y: i32, z: i32, material: MaterialId, aux: u8) -> bool {
        let Some(idx) = self.checked_index(x, y, z) else {
            return false;
        };
        let previous = std::mem::replace(&mut self.materials[idx], material);
        if let Some(aux_data) = self.aux.as_mut() {
            aux_data[idx] = aux;
        }
        (previous == MATERIAL_EMPTY) != (material == MATERIAL_EMPTY)
    }

    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.checked_index(x, y, z).is_some()
    }

    fn extent(&self) -> Option<IVec3> {
        Some(IVec3::new(
            self.size_x as i32,
            self.size_y as i32,
            self.size_z as i32,
        ))
    }

    fn is_resident(&self, pos: ChunkPos) -> bool {
        let [cx, cy, cz] = self.chunk_dims();
        (0..cx).contains(&pos.x) && (0..cy).contains(&pos.y) && (0..cz).contains(&pos.z)
    }

    fn resident_chunks(&self) -> Vec<ChunkPos> {
        let [cx, cy, cz] = self.chunk_dims();
        let mut chunks = Vec::with_capacity((cx * cy * cz) as usize);
        for x in 0..cx {
            for y in 0..cy {
                for z in 0..cz {
                    chunks.push(ChunkPos::new(x, y, z));
                }
            }
        }
        chunks
    }
}

impl std::fmt::Debug for VoxelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelGrid")
            .field("size", &self.size())
            .field("has_aux", &self.has_aux())
            .finish()
    }
}
