use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::warn;
use voxgrid_render::MesherConfig;
use voxgrid_world::{PickConfig, TerrainKind};

pub const DEFAULT_CONFIG_PATH: &str = "config/voxgrid.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("world size must be positive on every axis, got {0:?}")]
    EmptyWorld([u32; 3]),
    #[error("voxel_scale must be positive and finite, got {0}")]
    VoxelScale(f32),
}

/// Backing store for the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Dense,
    Sparse,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Extent in voxels, `[x, y, z]`. Z is up.
    pub size: [u32; 3],
    pub storage: StorageKind,
    pub seed: u64,
    pub terrain: TerrainKind,
    /// Keep a per-voxel aux byte (dense storage only).
    pub with_aux: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: [128, 128, 64],
            storage: StorageKind::Dense,
            seed: 0,
            terrain: TerrainKind::Perlin,
            with_aux: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub mesher: MesherConfig,
    pub picking: PickConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file, reporting every failure.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound
                    && path == Path::new(DEFAULT_CONFIG_PATH) =>
            {
                warn!("Config not found at {}. Using defaults", path.display());
                AppConfig::default()
            }
            Err(err) => {
                warn!("Failed to load {}: {err}. Using defaults", path.display());
                AppConfig::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.size.contains(&0) {
            return Err(ConfigError::EmptyWorld(self.world.size));
        }
        let scale = self.mesher.voxel_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::VoxelScale(scale));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
