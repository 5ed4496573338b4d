#![warn(missing_docs)]
//! Greedy surface meshing for chunked voxel volumes.
//!
//! Each resident chunk owns a fixed-capacity vertex buffer that is rebuilt
//! from its voxels and those of its registered neighbours. Finished meshes are
//! handed to a [`ChunkRenderer`] implementation; nothing here talks to a GPU.

mod buffer;
mod greedy;
mod mesh;
mod registry;
mod stats;

pub use buffer::{ChunkMesh, ChunkRenderer, DirtyFlags};
pub use greedy::{GreedyRects, MergedRect, SliceMask, SLICE_SIZE};
pub use mesh::{
    chunk_quads, material_colour, mesh_chunk, slice_axes, MeshHash, MeshOutcome, MeshVertex,
    MesherConfig, NeighborLinks, Quad, VertexWriter, DEFAULT_MAX_FACES, VERTICES_PER_QUAD,
};
pub use registry::{
    affected_chunks, ChunkRegistry, EditAction, EditBatch, EditOutcome, VoxelEdit,
};
pub use stats::{stats_to_metrics, write_metrics_to_file, ChunkMeshStat};
