use tracing::warn;
use voxgrid_world::{ChunkPos, CHUNK_SIZE};

use crate::mesh::{MeshHash, MeshOutcome, MeshVertex, MesherConfig, VertexWriter};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Pending work for a chunk mesh.
    pub struct DirtyFlags: u8 {
        /// Voxels changed; the mesh must be rebuilt.
        const MESH = 0b0000_0001;
        /// The mesh changed since the renderer last received it.
        const UPLOAD = 0b0000_0010;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

/// Consumer of finished chunk meshes.
///
/// Implementations only read the mesh; the registry never reads anything back.
pub trait ChunkRenderer {
    /// Create or replace the drawable for `pos`.
    fn upload(&mut self, pos: ChunkPos, mesh: &ChunkMesh);
    /// Drop the drawable for `pos`.
    fn remove(&mut self, pos: ChunkPos);
}

/// Vertex buffer owned by one chunk.
pub struct ChunkMesh {
    position: ChunkPos,
    vertices: Vec<MeshVertex>,
    capacity: usize,
    voxel_scale: f32,
    outcome: MeshOutcome,
    hash: MeshHash,
    dirty: DirtyFlags,
}

impl ChunkMesh {
    /// An unbuilt mesh for the chunk at `position`.
    pub fn new(position: ChunkPos, config: &MesherConfig) -> Self {
        Self {
            position,
            vertices: Vec::new(),
            capacity: config.vertex_capacity(),
            voxel_scale: config.voxel_scale,
            outcome: MeshOutcome::default(),
            hash: MeshHash::of(&[]),
            dirty: DirtyFlags::MESH,
        }
    }

    /// Chunk this mesh belongs to.
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Written vertices, front-packed.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Number of written vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Maximum vertices this buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Result of the last rebuild.
    pub fn outcome(&self) -> MeshOutcome {
        self.outcome
    }

    /// Hash of the written range.
    pub fn hash(&self) -> MeshHash {
        self.hash
    }

    /// Static chunk-local bounding box `(min, max)`.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        ([0.0; 3], [CHUNK_SIZE as f32 * self.voxel_scale; 3])
    }

    /// Current dirty flags.
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    /// Flag the mesh for rebuild.
    pub fn mark_dirty(&mut self) {
        self.dirty.insert(DirtyFlags::MESH);
    }

    /// Record that the renderer has the current contents.
    pub fn mark_uploaded(&mut self) {
        self.dirty.remove(DirtyFlags::UPLOAD);
    }

    /// Rewrite the buffer through a scoped writer.
    ///
    /// The buffer is exclusively borrowed for the duration of `build`. The
    /// hash and outcome are refreshed afterwards and the mesh is queued for
    /// upload.
    pub fn rebuild_with<F>(&mut self, build: F) -> MeshOutcome
    where
        F: FnOnce(&mut VertexWriter<'_>),
    {
        let outcome = {
            let mut writer = VertexWriter::new(&mut self.vertices, self.capacity, self.voxel_scale);
            build(&mut writer);
            writer.finish()
        };

        if outcome.truncated {
            warn!(
                chunk = %self.position,
                quads = outcome.quads,
                capacity = self.capacity,
                "chunk vertex buffer full, remaining faces dropped"
            );
        }

        self.hash = MeshHash::of(&self.vertices);
        self.outcome = outcome;
        self.dirty.remove(DirtyFlags::MESH);
        self.dirty.insert(DirtyFlags::UPLOAD);
        outcome
    }
}

impl std::fmt::Debug for ChunkMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkMesh")
            .field("position", &self.position)
            .field("vertices", &self.vertices.len())
            .field("capacity", &self.capacity)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use voxgrid_world::Face;

    use super::*;
    use crate::mesh::Quad;

    fn quad(material: u16) -> Quad {
        Quad {
            material,
            face: Face::ZPos,
            plane: 1,
            u: 0,
            v: 0,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn new_mesh_needs_a_build() {
        let mesh = ChunkMesh::new(ChunkPos::new(0, 0, 0), &MesherConfig::default());
        assert_eq!(mesh.dirty_flags(), DirtyFlags::MESH);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.capacity(), 42_000);
    }

    #[test]
    fn rebuild_swaps_mesh_flag_for_upload() {
        let mut mesh = ChunkMesh::new(ChunkPos::new(0, 0, 0), &MesherConfig::default());
        let empty_hash = mesh.hash();

        let outcome = mesh.rebuild_with(|writer| {
            let _ = writer.push_quad(&quad(3));
        });
        assert_eq!(outcome.vertex_count, 6);
        assert_eq!(mesh.vertices().len(), 6);
        assert_eq!(mesh.dirty_flags(), DirtyFlags::UPLOAD);
        assert_ne!(mesh.hash(), empty_hash);

        mesh.mark_uploaded();
        assert!(mesh.dirty_flags().is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut mesh = ChunkMesh::new(ChunkPos::new(0, 0, 0), &MesherConfig::default());
        mesh.rebuild_with(|writer| {
            let _ = writer.push_quad(&quad(1));
            let _ = writer.push_quad(&quad(2));
        });
        mesh.rebuild_with(|writer| {
            let _ = writer.push_quad(&quad(1));
        });
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.outcome().quads, 1);
    }

    #[test]
    fn truncation_is_reported() {
        let config = MesherConfig {
            max_faces_per_chunk: 1,
            ..MesherConfig::default()
        };
        let mut mesh = ChunkMesh::new(ChunkPos::new(0, 0, 0), &config);
        let outcome = mesh.rebuild_with(|writer| {
            let _ = writer.push_quad(&quad(1));
            let _ = writer.push_quad(&quad(2));
        });
        assert!(outcome.truncated);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.vertices.capacity() >= 6);
    }

    #[test]
    fn bounds_follow_voxel_scale() {
        let config = MesherConfig {
            voxel_scale: 16.0,
            ..MesherConfig::default()
        };
        let mesh = ChunkMesh::new(ChunkPos::new(2, 0, 0), &config);
        assert_eq!(mesh.bounds(), ([0.0; 3], [512.0; 3]));
    }
}
