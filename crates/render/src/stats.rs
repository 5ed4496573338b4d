use std::path::Path;

use anyhow::{Context, Result};
use voxgrid_testkit::{ChunkMeshMetric, MeshMetricSink};
use voxgrid_world::ChunkPos;

use crate::buffer::ChunkMesh;
use crate::mesh::MeshHash;

/// Mesh stats for one chunk rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMeshStat {
    /// Chunk position this mesh belongs to.
    pub position: ChunkPos,
    /// Quads written.
    pub quads: usize,
    /// Vertices written.
    pub vertices: usize,
    /// Whether faces were dropped for lack of buffer space.
    pub truncated: bool,
    /// Mesh hash for determinism comparisons.
    pub hash: MeshHash,
}

impl ChunkMeshStat {
    /// Snapshot a mesh after its latest rebuild.
    pub fn from_mesh(mesh: &ChunkMesh) -> Self {
        let outcome = mesh.outcome();
        Self {
            position: mesh.position(),
            quads: outcome.quads,
            vertices: outcome.vertex_count,
            truncated: outcome.truncated,
            hash: mesh.hash(),
        }
    }
}

impl From<&ChunkMeshStat> for ChunkMeshMetric {
    fn from(stat: &ChunkMeshStat) -> Self {
        ChunkMeshMetric {
            chunk: [stat.position.x, stat.position.y, stat.position.z],
            quads: stat.quads,
            triangles: stat.vertices / 3,
            truncated: stat.truncated,
            hash: stat.hash.to_hex(),
        }
    }
}

/// Convert stats into serializable metrics.
pub fn stats_to_metrics(stats: &[ChunkMeshStat]) -> Vec<ChunkMeshMetric> {
    stats.iter().map(ChunkMeshMetric::from).collect()
}

/// Write metrics to disk using the testkit sink.
pub fn write_metrics_to_file<P: AsRef<Path>>(stats: &[ChunkMeshStat], path: P) -> Result<()> {
    let path = path.as_ref();
    let metrics = stats_to_metrics(stats);
    let mut sink = MeshMetricSink::create(path)
        .with_context(|| format!("failed to create metrics file {}", path.display()))?;
    sink.write(&metrics)?;
    Ok(())
}
