use anyhow::{bail, Context, Result};
use std::{fs, path::Path};
use voxgrid_world::{palette, MaterialId};

/// Voxels read from a plain-text list.
///
/// One voxel per line: `x y z value`, where `value` is a material id or a
/// `#rrggbb` colour that is palette-encoded on load. Blank lines and lines
/// starting with `//` are skipped.
#[derive(Debug, Default)]
pub struct VoxelList {
    pub voxels: Vec<(i32, i32, i32, MaterialId)>,
}

impl VoxelList {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read voxel list {}", path.display()))?;
        Self::from_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_str(contents: &str) -> Result<Self> {
        let mut voxels = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let voxel = parse_line(line).with_context(|| format!("line {}", number + 1))?;
            voxels.push(voxel);
        }
        Ok(Self { voxels })
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }
}

fn parse_line(line: &str) -> Result<(i32, i32, i32, MaterialId)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [x, y, z, value] = fields.as_slice() else {
        bail!("expected `x y z value`, got {} fields", fields.len());
    };
    let coord = |s: &str| {
        s.parse::<i32>()
            .with_context(|| format!("bad coordinate {s:?}"))
    };
    Ok((coord(*x)?, coord(*y)?, coord(*z)?, parse_value(value)?))
}

fn parse_value(value: &str) -> Result<MaterialId> {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 {
            bail!("colour {value:?} must be #rrggbb");
        }
        let rgb = u32::from_str_radix(hex, 16).with_context(|| format!("bad colour {value:?}"))?;
        return Ok(palette::encode_rgb24(rgb));
    }
    value
        .parse::<MaterialId>()
        .with_context(|| format!("bad material {value:?}"))
}
