//! voxgrid - chunked voxel volume with greedy meshing and ray picking
//!
//! Builds a world from a TOML config (generated terrain and/or an imported
//! voxel list), meshes every chunk, optionally edits along a pick ray and
//! writes per-chunk mesh metrics.

mod config;
mod voxel_list;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AppConfig, StorageKind};
use glam::{IVec3, Vec3};
use std::path::PathBuf;
use tracing::{info, warn};
use voxel_list::VoxelList;
use voxgrid_render::{
    write_metrics_to_file, ChunkMesh, ChunkMeshStat, ChunkRegistry, ChunkRenderer, EditAction,
};
use voxgrid_world::{
    ChunkPos, MaterialId, RayOutcome, SparseVolume, TerrainGenerator, VoxelGrid, VoxelStore,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chunked voxel volume with greedy meshing and ray picking", long_about = None)]
struct Args {
    /// TOML config; missing or invalid files fall back to defaults
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Fail instead of falling back to defaults when the config is unusable
    #[arg(long)]
    strict_config: bool,

    /// Voxel list (`x y z id|#rrggbb` per line) imported after terrain generation
    #[arg(long)]
    import: Option<PathBuf>,

    /// Write per-chunk mesh metrics JSON here
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Pick ray origin in world units, e.g. `--eye 10,10,40`
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    eye: Option<Vec3>,

    /// Pick ray direction, e.g. `--dir 0,0,-1`
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    dir: Option<Vec3>,

    /// Place this material in front of the picked face
    #[arg(long, conflicts_with = "remove")]
    place: Option<MaterialId>,

    /// Clear the picked voxel
    #[arg(long)]
    remove: bool,

    /// Print the resolved config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Stands in for a GPU renderer: tallies what would be uploaded.
#[derive(Debug, Default)]
struct SummaryRenderer {
    uploads: usize,
    removals: usize,
    vertices: usize,
}

impl ChunkRenderer for SummaryRenderer {
    fn upload(&mut self, _pos: ChunkPos, mesh: &ChunkMesh) {
        self.uploads += 1;
        self.vertices += mesh.vertex_count();
    }

    fn remove(&mut self, _pos: ChunkPos) {
        self.removals += 1;
    }
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting voxgrid v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = if args.strict_config {
        AppConfig::from_path(&args.config)
            .with_context(|| format!("failed to load config {}", args.config.display()))?
    } else {
        AppConfig::load_from_path(&args.config)
    };

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let [sx, sy, sz] = config.world.size;
    match config.world.storage {
        StorageKind::Dense => {
            let grid = if config.world.with_aux {
                VoxelGrid::with_aux(sx, sy, sz)?
            } else {
                VoxelGrid::new(sx, sy, sz)?
            };
            run(grid, &config, &args)
        }
        StorageKind::Sparse => {
            if config.world.with_aux {
                warn!("with_aux has no effect on sparse storage");
            }
            run(SparseVolume::new(), &config, &args)
        }
    }
}

fn run<S: VoxelStore>(mut store: S, config: &AppConfig, args: &Args) -> Result<()> {
    let [sx, sy, sz] = config.world.size;
    let extent = IVec3::new(sx as i32, sy as i32, sz as i32);
    let terrain = TerrainGenerator::new(config.world.terrain, config.world.seed)
        .generate(&mut store, extent);
    info!(
        kind = ?config.world.terrain,
        seed = config.world.seed,
        solid = terrain.solid_voxels,
        max_height = terrain.max_height,
        "terrain generated"
    );

    let mut registry = ChunkRegistry::new(store, config.mesher, config.picking);

    if let Some(path) = &args.import {
        let list = VoxelList::from_path(path)?;
        info!(voxels = list.len(), "importing {}", path.display());
        let summary = registry
            .import_voxels(list.voxels)
            .with_context(|| format!("failed to import {}", path.display()))?;
        info!(
            voxels = summary.voxels_written,
            chunks = summary.chunks_touched.len(),
            "import complete"
        );
    }

    let action = match (args.place, args.remove) {
        (Some(material), _) => Some(EditAction::Place(material)),
        (None, true) => Some(EditAction::Remove),
        (None, false) => None,
    };
    match (args.eye, args.dir) {
        (Some(eye), Some(dir)) => pick(&mut registry, eye, dir, action)?,
        (None, None) => {
            if action.is_some() {
                warn!("--place/--remove need --eye and --dir; skipping edit");
            }
        }
        _ => anyhow::bail!("--eye and --dir must be set together"),
    }

    let mut renderer = SummaryRenderer::default();
    registry.flush(&mut renderer);
    let stats: Vec<ChunkMeshStat> = registry.meshes().map(ChunkMeshStat::from_mesh).collect();
    info!(
        chunks = stats.len(),
        uploads = renderer.uploads,
        removals = renderer.removals,
        vertices = renderer.vertices,
        quads = stats.iter().map(|s| s.quads).sum::<usize>(),
        truncated = stats.iter().filter(|s| s.truncated).count(),
        "meshing complete"
    );

    if let Some(path) = &args.metrics {
        write_metrics_to_file(&stats, path)?;
        info!("Mesh metrics written to {}", path.display());
    }
    Ok(())
}

fn pick<S: VoxelStore>(
    registry: &mut ChunkRegistry<S>,
    eye: Vec3,
    dir: Vec3,
    action: Option<EditAction>,
) -> Result<()> {
    let Some(action) = action else {
        match registry.pick(eye, dir)? {
            RayOutcome::Hit(hit) => info!(
                voxel = ?hit.voxel,
                face = ?hit.face,
                distance = hit.distance,
                material = hit.material,
                on_floor = hit.on_floor,
                "pick hit"
            ),
            RayOutcome::Miss { distance } => info!(distance, "pick missed"),
        }
        return Ok(());
    };

    let outcome = registry.edit_along_ray(eye, dir, action)?;
    info!(
        ?action,
        changed = outcome.changed,
        target = ?outcome.target,
        rebuilt = outcome.rebuilt.len(),
        "edit applied"
    );
    Ok(())
}

/// Parses `x,y,z` into a vector.
fn parse_vec3(value: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!(
            "expected three comma-separated components, got {}",
            parts.len()
        ));
    };
    let component = |s: &str| match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("bad component {s:?}")),
    };
    Ok(Vec3::new(component(*x)?, component(*y)?, component(*z)?))
}
