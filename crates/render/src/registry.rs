//! Chunk registry: owns the voxel store and one mesh per resident chunk, and
//! keeps meshes in step with edits.
//!
//! Neighbours are never stored on a chunk. They are resolved by position each
//! time a chunk is meshed, so registering or dropping a chunk only requires
//! rebuilding the chunks around it.

use std::collections::{BTreeMap, BTreeSet};

use glam::{IVec3, Vec3};
use tracing::{debug, info};
use voxgrid_world::{
    cast_ray_with, ChunkPos, Face, ImportError, ImportSummary, Importer, LocalPos, MaterialId,
    PickConfig, RayCastError, RayHit, RayOutcome, VoxelStore, CHUNK_SIZE, MATERIAL_EMPTY,
};

use crate::buffer::{ChunkMesh, ChunkRenderer, DirtyFlags};
use crate::mesh::{mesh_chunk, MesherConfig, NeighborLinks};
use crate::stats::ChunkMeshStat;

/// A single voxel write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelEdit {
    /// Absolute X.
    pub x: i32,
    /// Absolute Y.
    pub y: i32,
    /// Absolute Z.
    pub z: i32,
    /// Material to store; [`MATERIAL_EMPTY`] clears.
    pub material: MaterialId,
}

impl VoxelEdit {
    /// Write `material` at `(x, y, z)`.
    pub fn new(x: i32, y: i32, z: i32, material: MaterialId) -> Self {
        Self { x, y, z, material }
    }

    /// Write `material` at `pos`.
    pub fn at(pos: IVec3, material: MaterialId) -> Self {
        Self::new(pos.x, pos.y, pos.z, material)
    }
}

/// What a batch of edits did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    /// Edits that changed a stored value.
    pub written: usize,
    /// Edits that flipped a voxel between empty and solid.
    pub occupancy_changes: usize,
    /// One entry per rebuilt chunk, in chunk order.
    pub rebuilt: Vec<ChunkMeshStat>,
}

/// Edit applied at the voxel a ray strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Fill the empty voxel in front of the struck face.
    Place(MaterialId),
    /// Clear the struck voxel.
    Remove,
}

/// Result of [`ChunkRegistry::edit_along_ray`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOutcome {
    /// Whether geometry appeared or disappeared.
    pub changed: bool,
    /// What the ray struck, if anything.
    pub hit: Option<RayHit>,
    /// Voxel the edit was aimed at.
    pub target: Option<IVec3>,
    /// Chunks rebuilt as a consequence.
    pub rebuilt: Vec<ChunkPos>,
}

/// Chunks whose mesh can depend on the voxel at `(x, y, z)`: its own chunk
/// plus each neighbour sharing a boundary plane with it.
pub fn affected_chunks(x: i32, y: i32, z: i32) -> Vec<ChunkPos> {
    let pos = ChunkPos::containing(x, y, z);
    let local = LocalPos::from_absolute(x, y, z);
    let mut chunks = vec![pos];
    for axis in 0..3 {
        match local.axis(axis) {
            0 => chunks.push(pos.neighbor(Face::from_axis(axis, false))),
            c if c == CHUNK_SIZE - 1 => chunks.push(pos.neighbor(Face::from_axis(axis, true))),
            _ => {}
        }
    }
    chunks.sort();
    chunks
}

/// Owns a voxel store and the meshes of its resident chunks.
pub struct ChunkRegistry<S: VoxelStore> {
    store: S,
    mesher: MesherConfig,
    picking: PickConfig,
    meshes: BTreeMap<ChunkPos, ChunkMesh>,
    pending_removals: Vec<ChunkPos>,
}

impl<S: VoxelStore> ChunkRegistry<S> {
    /// Register every resident chunk of `store` and mesh it.
    pub fn new(store: S, mesher: MesherConfig, picking: PickConfig) -> Self {
        let mut registry = Self {
            store,
            mesher,
            picking,
            meshes: BTreeMap::new(),
            pending_removals: Vec::new(),
        };
        for pos in registry.store.resident_chunks() {
            registry
                .meshes
                .insert(pos, ChunkMesh::new(pos, &registry.mesher));
        }
        let stats = registry.rebuild_all();
        info!(
            chunks = stats.len(),
            quads = stats.iter().map(|s| s.quads).sum::<usize>(),
            truncated = stats.iter().filter(|s| s.truncated).count(),
            "chunk registry built"
        );
        registry
    }

    /// Read access to the voxel store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mesh of the chunk at `pos`, if registered.
    pub fn mesh(&self, pos: ChunkPos) -> Option<&ChunkMesh> {
        self.meshes.get(&pos)
    }

    /// All meshes in chunk order.
    pub fn meshes(&self) -> impl Iterator<Item = &ChunkMesh> {
        self.meshes.values()
    }

    /// Registered chunk positions in order.
    pub fn chunk_positions(&self) -> Vec<ChunkPos> {
        self.meshes.keys().copied().collect()
    }

    /// Whether a mesh exists for `pos`.
    pub fn is_registered(&self, pos: ChunkPos) -> bool {
        self.meshes.contains_key(&pos)
    }

    /// Registered neighbours of `pos`.
    pub fn links(&self, pos: ChunkPos) -> NeighborLinks {
        Face::ALL
            .into_iter()
            .filter(|&face| self.meshes.contains_key(&pos.neighbor(face)))
            .fold(NeighborLinks::empty(), |links, face| {
                links | NeighborLinks::from_face(face)
            })
    }

    /// Material at an absolute coordinate.
    pub fn get_voxel(&self, x: i32, y: i32, z: i32) -> MaterialId {
        self.store.get(x, y, z)
    }

    /// Write one voxel and rebuild what it affects. Returns true iff the
    /// voxel flipped between empty and solid.
    pub fn set_voxel(&mut self, x: i32, y: i32, z: i32, material: MaterialId) -> bool {
        self.apply_edits([VoxelEdit::new(x, y, z, material)])
            .occupancy_changes
            > 0
    }

    /// Apply a batch of edits, then rebuild each affected chunk once.
    ///
    /// Out-of-range edits are skipped. Edits that store the value already
    /// present do not trigger rebuilds.
    pub fn apply_edits<I>(&mut self, edits: I) -> EditBatch
    where
        I: IntoIterator<Item = VoxelEdit>,
    {
        let mut batch = EditBatch::default();
        let mut affected = BTreeSet::new();

        for edit in edits {
            let VoxelEdit { x, y, z, material } = edit;
            if !self.store.contains(x, y, z) || self.store.get(x, y, z) == material {
                continue;
            }
            if self.store.set(x, y, z, material) {
                batch.occupancy_changes += 1;
            }
            batch.written += 1;
            affected.extend(affected_chunks(x, y, z));
        }

        batch.rebuilt = self.refresh(affected);
        batch
    }

    /// Bulk-load voxels through an [`Importer`] and rebuild the touched
    /// chunks and their neighbours.
    ///
    /// Stops at the first invalid coordinate; voxels written before it stay
    /// written and their chunks are still rebuilt.
    pub fn import_voxels<I>(&mut self, voxels: I) -> Result<ImportSummary, ImportError>
    where
        I: IntoIterator<Item = (i32, i32, i32, MaterialId)>,
    {
        let mut importer = Importer::new(&mut self.store);
        let result = importer.extend(voxels);
        let summary = importer.finish();

        let mut affected = BTreeSet::new();
        for &pos in &summary.chunks_touched {
            affected.insert(pos);
            affected.extend(Face::ALL.map(|face| pos.neighbor(face)));
        }
        let rebuilt = self.refresh(affected);
        info!(
            voxels = summary.voxels_written,
            chunks = rebuilt.len(),
            "voxels imported"
        );

        result.map(|()| summary)
    }

    /// Cast a pick ray. `origin` is in world units and is divided by the
    /// voxel scale; the max distance is in voxels.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Result<RayOutcome, RayCastError> {
        let scale = self.mesher.voxel_scale;
        let origin = if scale > 0.0 { origin / scale } else { origin };
        cast_ray_with(&self.store, origin, direction, &self.picking)
    }

    /// Pick along a ray and place or remove a voxel at the hit.
    pub fn edit_along_ray(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        action: EditAction,
    ) -> Result<EditOutcome, RayCastError> {
        let Some(hit) = self.pick(origin, direction)?.hit() else {
            return Ok(EditOutcome::default());
        };

        let (target, material) = match action {
            EditAction::Place(material) => (hit.place_target(), material),
            EditAction::Remove if hit.on_floor => {
                return Ok(EditOutcome {
                    hit: Some(hit),
                    ..EditOutcome::default()
                });
            }
            EditAction::Remove => (hit.voxel, MATERIAL_EMPTY),
        };

        // Placing never overwrites an occupied voxel, e.g. one containing the eye.
        if matches!(action, EditAction::Place(_))
            && self.store.get(target.x, target.y, target.z) != MATERIAL_EMPTY
        {
            return Ok(EditOutcome {
                hit: Some(hit),
                target: Some(target),
                ..EditOutcome::default()
            });
        }

        let batch = self.apply_edits([VoxelEdit::at(target, material)]);
        debug!(?action, ?target, changed = batch.occupancy_changes > 0, "ray edit");
        Ok(EditOutcome {
            changed: batch.occupancy_changes > 0,
            hit: Some(hit),
            target: Some(target),
            rebuilt: batch.rebuilt.iter().map(|stat| stat.position).collect(),
        })
    }

    /// Flag a chunk for the next [`ChunkRegistry::rebuild_dirty`].
    pub fn mark_dirty(&mut self, pos: ChunkPos) {
        if let Some(mesh) = self.meshes.get_mut(&pos) {
            mesh.mark_dirty();
        }
    }

    /// Rebuild one chunk's mesh.
    pub fn rebuild(&mut self, pos: ChunkPos) -> Option<ChunkMeshStat> {
        let links = self.links(pos);
        let mesh = self.meshes.get_mut(&pos)?;
        let store = &self.store;
        let outcome = mesh.rebuild_with(|writer| mesh_chunk(store, pos, links, writer));
        debug!(
            chunk = %pos,
            quads = outcome.quads,
            vertices = outcome.vertex_count,
            "chunk rebuilt"
        );
        Some(ChunkMeshStat::from_mesh(mesh))
    }

    /// Rebuild every registered chunk.
    pub fn rebuild_all(&mut self) -> Vec<ChunkMeshStat> {
        self.chunk_positions()
            .into_iter()
            .filter_map(|pos| self.rebuild(pos))
            .collect()
    }

    /// Rebuild chunks flagged with [`DirtyFlags::MESH`].
    pub fn rebuild_dirty(&mut self) -> Vec<ChunkMeshStat> {
        let dirty: Vec<_> = self
            .meshes
            .iter()
            .filter(|(_, mesh)| mesh.dirty_flags().contains(DirtyFlags::MESH))
            .map(|(&pos, _)| pos)
            .collect();
        dirty
            .into_iter()
            .filter_map(|pos| self.rebuild(pos))
            .collect()
    }

    /// Stop meshing a chunk. Its voxels stay in the store; neighbours are
    /// rebuilt so they emit the faces along the shared boundary again.
    pub fn unload(&mut self, pos: ChunkPos) -> bool {
        if self.meshes.remove(&pos).is_none() {
            return false;
        }
        self.pending_removals.push(pos);
        let neighbours: BTreeSet<_> = Face::ALL.iter().map(|&face| pos.neighbor(face)).collect();
        self.refresh(neighbours);
        true
    }

    /// Hand changed meshes to the renderer. Returns how many were uploaded.
    pub fn flush<R: ChunkRenderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        for pos in self.pending_removals.drain(..) {
            renderer.remove(pos);
        }
        let mut uploaded = 0;
        for (&pos, mesh) in self.meshes.iter_mut() {
            if mesh.dirty_flags().contains(DirtyFlags::UPLOAD) {
                renderer.upload(pos, mesh);
                mesh.mark_uploaded();
                uploaded += 1;
            }
        }
        uploaded
    }

    /// Register newly resident chunks among `candidates`, then rebuild every
    /// registered candidate.
    fn refresh(&mut self, mut candidates: BTreeSet<ChunkPos>) -> Vec<ChunkMeshStat> {
        let fresh: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|&pos| !self.meshes.contains_key(&pos) && self.store.is_resident(pos))
            .collect();
        for pos in fresh {
            debug!(chunk = %pos, "chunk registered");
            self.meshes.insert(pos, ChunkMesh::new(pos, &self.mesher));
            for face in Face::ALL {
                let neighbour = pos.neighbor(face);
                if self.meshes.contains_key(&neighbour) {
                    candidates.insert(neighbour);
                }
            }
        }

        candidates
            .into_iter()
            .filter_map(|pos| self.rebuild(pos))
            .collect()
    }
}

impl<S: VoxelStore> std::fmt::Debug for ChunkRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkRegistry")
            .field("chunks", &self.meshes.len())
            .field("mesher", &self.mesher)
            .field("picking", &self.picking)
            .finish()
    }
}
