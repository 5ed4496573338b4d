//! Bulk population of a voxel store from `(x, y, z, material)` triples.
//!
//! Unlike runtime edits, an import treats a bad coordinate as a caller bug and
//! stops at the first one.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::chunk::{ChunkPos, MaterialId};
use crate::grid::VoxelStore;
use crate::palette;

/// Errors raised while importing voxels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// Import coordinates must be non-negative.
    #[error("negative coordinate ({x}, {y}, {z}) in bulk import")]
    NegativeCoordinate { x: i32, y: i32, z: i32 },
    /// The target store cannot address the coordinate.
    #[error("coordinate ({x}, {y}, {z}) lies outside the volume")]
    OutOfBounds { x: i32, y: i32, z: i32 },
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Voxels written (including material-only overwrites).
    pub voxels_written: usize,
    /// Voxels whose empty/non-empty state flipped.
    pub occupancy_changes: usize,
    /// Chunks containing at least one written voxel.
    pub chunks_touched: BTreeSet<ChunkPos>,
}

/// Writes triples into a store, validating each coordinate.
pub struct Importer<'a, S: VoxelStore + ?Sized> {
    store: &'a mut S,
    summary: ImportSummary,
}

impl<'a, S: VoxelStore + ?Sized> Importer<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            summary: ImportSummary::default(),
        }
    }

    /// Write a single voxel.
    pub fn set(&mut self, x: i32, y: i32, z: i32, material: MaterialId) -> Result<(), ImportError> {
        if x < 0 || y < 0 || z < 0 {
            return Err(ImportError::NegativeCoordinate { x, y, z });
        }
        if !self.store.contains(x, y, z) {
            return Err(ImportError::OutOfBounds { x, y, z });
        }
        if self.store.set(x, y, z, material) {
            self.summary.occupancy_changes += 1;
        }
        self.summary.voxels_written += 1;
        self.summary.chunks_touched.insert(ChunkPos::containing(x, y, z));
        Ok(())
    }

    /// Write a voxel coloured by a packed `0xRRGGBB` value.
    pub fn set_rgb(&mut self, x: i32, y: i32, z: i32, rgb: u32) -> Result<(), ImportError> {
        self.set(x, y, z, palette::encode_rgb24(rgb))
    }

    /// Write every triple, stopping at the first invalid coordinate.
    pub fn extend<I>(&mut self, voxels: I) -> Result<(), ImportError>
    where
        I: IntoIterator<Item = (i32, i32, i32, MaterialId)>,
    {
        for (x, y, z, material) in voxels {
            self.set(x, y, z, material)?;
        }
        Ok(())
    }

    pub fn finish(self) -> ImportSummary {
        debug!(
            voxels = self.summary.voxels_written,
            chunks = self.summary.chunks_touched.len(),
            "import finished"
        );
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SparseVolume, VoxelGrid};

    #[test]
    fn negative_coordinates_fail_fast() {
        let mut volume = SparseVolume::new();
        let mut importer = Importer::new(&mut volume);
        let err = importer
            .extend([(1, 1, 1, 3), (0, -1, 0, 3), (2, 2, 2, 3)])
            .unwrap_err();
        assert_eq!(err, ImportError::NegativeCoordinate { x: 0, y: -1, z: 0 });

        // Triples before the bad one were applied, later ones were not.
        let summary = importer.finish();
        assert_eq!(summary.voxels_written, 1);
        assert_eq!(volume.get(1, 1, 1), 3);
        assert_eq!(volume.get(2, 2, 2), 0);
    }

    #[test]
    fn dense_bounds_are_enforced() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        let mut importer = Importer::new(&mut grid);
        assert_eq!(
            importer.set(4, 0, 0, 1),
            Err(ImportError::OutOfBounds { x: 4, y: 0, z: 0 })
        );
    }

    #[test]
    fn summary_tracks_chunks_and_flips() {
        let mut volume = SparseVolume::new();
        let mut importer = Importer::new(&mut volume);
        importer
            .extend([(0, 0, 0, 1), (0, 0, 0, 2), (40, 0, 0, 1)])
            .unwrap();
        importer.set_rgb(1, 0, 0, 0xff0000).unwrap();
        let summary = importer.finish();

        assert_eq!(summary.voxels_written, 4);
        assert_eq!(summary.occupancy_changes, 3);
        assert_eq!(
            summary.chunks_touched.into_iter().collect::<Vec<_>>(),
            vec![ChunkPos::new(0, 0, 0), ChunkPos::new(1, 0, 0)]
        );
        assert_eq!(volume.get(1, 0, 0), palette::encode(255, 0, 0));
    }
}
