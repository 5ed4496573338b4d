//! Voxel picking using DDA (Digital Differential Analyzer) traversal.
//!
//! The ray advances exactly one voxel boundary per step. Positions are in
//! voxel units; the voxel at integer coordinate `c` spans `[c, c + 1)`.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::{MaterialId, MATERIAL_EMPTY};
use crate::face::Face;
use crate::grid::VoxelStore;

/// Default pick reach in voxel units.
pub const DEFAULT_MAX_DISTANCE: f32 = 10_000.0;

/// Picking settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    /// Maximum travel length of a pick ray.
    pub max_distance: f32,
    /// Report a hit on the z = 0 plane when the ray leaves the volume
    /// without striking anything.
    pub floor_fallback: bool,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            floor_fallback: false,
        }
    }
}

/// Errors raised for rays that cannot be traversed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RayCastError {
    #[error("ray direction has zero length or is not finite")]
    DegenerateDirection,
    #[error("ray origin is not finite")]
    NonFiniteOrigin,
    #[error("unbounded volumes need a finite max distance")]
    UnboundedDistance,
}

/// The first solid voxel struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Voxel that was hit.
    pub voxel: IVec3,
    /// Face of `voxel` the ray entered through.
    pub face: Face,
    /// Distance travelled from the origin.
    pub distance: f32,
    /// Material of the hit voxel ([`MATERIAL_EMPTY`] for floor hits).
    pub material: MaterialId,
    /// True when this is the virtual floor below the volume.
    pub on_floor: bool,
}

impl RayHit {
    /// Voxel a "place" edit should fill: one step out along the hit face.
    pub fn place_target(&self) -> IVec3 {
        self.face.adjacent(self.voxel)
    }
}

/// Outcome of a successful traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayOutcome {
    Hit(RayHit),
    /// Nothing was struck; `distance` is how far the ray travelled, capped at
    /// the max distance.
    Miss { distance: f32 },
}

impl RayOutcome {
    pub fn hit(self) -> Option<RayHit> {
        match self {
            RayOutcome::Hit(hit) => Some(hit),
            RayOutcome::Miss { .. } => None,
        }
    }
}

/// Cast a ray with default settings and the given reach.
pub fn cast_ray<S: VoxelStore + ?Sized>(
    store: &S,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Result<RayOutcome, RayCastError> {
    let config = PickConfig {
        max_distance,
        ..PickConfig::default()
    };
    cast_ray_with(store, origin, direction, &config)
}

/// Cast a ray through `store`.
///
/// The voxel containing the origin is not tested. `direction` need not be
/// normalized. Ties between axes step the lowest axis (X before Y before Z).
pub fn cast_ray_with<S: VoxelStore + ?Sized>(
    store: &S,
    origin: Vec3,
    direction: Vec3,
    config: &PickConfig,
) -> Result<RayOutcome, RayCastError> {
    if !origin.is_finite() {
        return Err(RayCastError::NonFiniteOrigin);
    }
    let length = direction.length();
    if !(length.is_finite() && length > 0.0) {
        return Err(RayCastError::DegenerateDirection);
    }
    let dir = direction / length;
    let max_distance = config.max_distance.max(0.0);
    let extent = store.extent();
    if extent.is_none() && !max_distance.is_finite() {
        return Err(RayCastError::UnboundedDistance);
    }

    let negative = dir.cmplt(Vec3::ZERO);
    let step = Vec3::select(negative, Vec3::NEG_ONE, Vec3::ONE);
    let edge = Vec3::select(negative, Vec3::ZERO, Vec3::ONE);

    let mut pos = origin;
    let mut distance = 0.0f32;
    loop {
        let to_edge = pos.floor() - pos + edge;

        let mut axis = 0;
        let mut best = f32::INFINITY;
        for i in 0..3 {
            // Sitting exactly on a boundary: the next one is a full voxel away.
            let gap = if to_edge[i] == 0.0 { step[i] } else { to_edge[i] };
            let len = (gap / dir[i]).abs();
            if len < best {
                best = len;
                axis = i;
            }
        }

        distance += best;
        pos = origin + dir * distance;
        pos[axis] = (pos[axis] + 0.5 * step[axis]).floor();
        let voxel = pos.floor().as_ivec3();

        if has_exited(voxel, step, extent) {
            if config.floor_fallback {
                if let Some(hit) = floor_hit(store, origin, dir, max_distance, extent) {
                    return Ok(RayOutcome::Hit(hit));
                }
            }
            return Ok(RayOutcome::Miss {
                distance: distance.min(max_distance),
            });
        }

        if distance > max_distance {
            return Ok(RayOutcome::Miss {
                distance: max_distance,
            });
        }

        let material = store.get(voxel.x, voxel.y, voxel.z);
        if material != MATERIAL_EMPTY {
            return Ok(RayOutcome::Hit(RayHit {
                voxel,
                face: Face::from_axis(axis, dir[axis] < 0.0),
                distance,
                material,
                on_floor: false,
            }));
        }
    }
}

/// True once the ray is outside the volume and moving further away from it.
fn has_exited(voxel: IVec3, step: Vec3, extent: Option<IVec3>) -> bool {
    (0..3).any(|i| {
        let below = voxel[i] < 0 && step[i] < 0.0;
        let above = extent.is_some_and(|e| voxel[i] >= e[i] && step[i] > 0.0);
        below || above
    })
}

fn floor_hit<S: VoxelStore + ?Sized>(
    store: &S,
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    extent: Option<IVec3>,
) -> Option<RayHit> {
    if dir.z >= 0.0 || origin.z < 0.0 {
        return None;
    }
    let t = -origin.z / dir.z;
    if t > max_distance {
        return None;
    }
    let point = origin + dir * t;
    let x = point.x.floor() as i32;
    let y = point.y.floor() as i32;
    if x < 0 || y < 0 {
        return None;
    }
    if let Some(e) = extent {
        if x >= e.x || y >= e.y {
            return None;
        }
    }
    if store.get(x, y, 0) != MATERIAL_EMPTY {
        return None;
    }
    Some(RayHit {
        voxel: IVec3::new(x, y, -1),
        face: Face::ZPos,
        distance: t,
        material: MATERIAL_EMPTY,
        on_floor: true,
    })
}
