#![warn(missing_docs)]
//! Test and CI surfaces: mesh metric records and their JSON sink.

mod fixtures;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use fixtures::*;

/// Mesh metric snapshot for a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeshMetric {
    /// Chunk coordinates [x, y, z].
    pub chunk: [i32; 3],
    /// Quad count for the chunk mesh.
    pub quads: usize,
    /// Triangle count for the chunk mesh.
    pub triangles: usize,
    /// Whether the vertex buffer ran out of space.
    pub truncated: bool,
    /// Mesh hash (hex string) for deterministic comparisons.
    pub hash: String,
}

/// Writes chunk mesh metrics to JSON for CI artifacts.
pub struct MeshMetricSink {
    file: File,
}

impl MeshMetricSink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Persist the provided metrics as pretty JSON.
    pub fn write(&mut self, metrics: &[ChunkMeshMetric]) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Read metrics previously written by [`MeshMetricSink`].
pub fn read_metrics<P: AsRef<Path>>(path: P) -> Result<Vec<ChunkMeshMetric>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
