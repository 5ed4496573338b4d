use std::ops::ControlFlow;

use bitflags::bitflags;
use blake3::Hasher;
use glam::IVec3;
use serde::{Deserialize, Serialize};
use voxgrid_world::{palette, ChunkPos, Face, MaterialId, VoxelStore, CHUNK_SIZE, MATERIAL_EMPTY};

use crate::greedy::{MergedRect, SliceMask};

/// Default face budget per chunk.
pub const DEFAULT_MAX_FACES: usize = 7000;
/// Two triangles, no index buffer.
pub const VERTICES_PER_QUAD: usize = 6;

/// Scan axes in meshing order (Z, then Y, then X).
const SCAN_ORDER: [usize; 3] = [2, 1, 0];

/// Colour for materials outside the palette.
const FALLBACK_COLOUR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Hash of a chunk's written vertex range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Hash a vertex slice.
    pub fn of(vertices: &[MeshVertex]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(vertices));
        Self(*hasher.finalize().as_bytes())
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Vertex layout handed to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local coordinates, scaled by the voxel scale.
    pub position: [f32; 3],
    /// Face normal (unit length).
    pub normal: [f32; 3],
    /// Linear RGBA decoded from the material's palette id.
    pub color: [f32; 4],
}

/// Mesher settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    /// Faces a single chunk may emit before meshing stops.
    pub max_faces_per_chunk: usize,
    /// World units per voxel edge.
    pub voxel_scale: f32,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            max_faces_per_chunk: DEFAULT_MAX_FACES,
            voxel_scale: 1.0,
        }
    }
}

impl MesherConfig {
    /// Size of each chunk's vertex buffer.
    pub fn vertex_capacity(&self) -> usize {
        self.max_faces_per_chunk.saturating_mul(VERTICES_PER_QUAD)
    }
}

bitflags! {
    /// Which neighbouring chunks are registered, one bit per [`Face`] index.
    ///
    /// A linked negative neighbour supplies the voxels behind plane 0; a
    /// linked positive neighbour owns plane 32.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NeighborLinks: u8 {
        /// +Z neighbour.
        const Z_POS = 1 << 0;
        /// -Z neighbour.
        const Z_NEG = 1 << 1;
        /// -X neighbour.
        const X_NEG = 1 << 2;
        /// +Y neighbour.
        const Y_POS = 1 << 3;
        /// +X neighbour.
        const X_POS = 1 << 4;
        /// -Y neighbour.
        const Y_NEG = 1 << 5;
    }
}

impl NeighborLinks {
    /// Flag for the neighbour across `face`.
    pub fn from_face(face: Face) -> Self {
        Self::from_bits_truncate(1 << face.index())
    }

    /// Whether the neighbour across `face` is linked.
    pub fn linked(self, face: Face) -> bool {
        self.contains(Self::from_face(face))
    }
}

/// One merged, axis-aligned face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    /// Material shown on the face.
    pub material: MaterialId,
    /// Outward direction.
    pub face: Face,
    /// Plane index along the face's axis, in `0..=32`.
    pub plane: usize,
    /// First covered cell along the slice's first axis.
    pub u: usize,
    /// First covered cell along the slice's second axis.
    pub v: usize,
    /// Cells covered along `u`.
    pub width: usize,
    /// Cells covered along `v`.
    pub height: usize,
}

impl Quad {
    fn from_rect(axis: usize, plane: usize, rect: MergedRect) -> Self {
        Self {
            material: rect.material(),
            face: Face::from_axis(axis, rect.is_positive()),
            plane,
            u: rect.u,
            v: rect.v,
            width: rect.width,
            height: rect.height,
        }
    }

    /// Chunk-local centre: the plane on the face axis, the midpoint of the
    /// covered cells on the other two.
    pub fn center(&self) -> [f32; 3] {
        let axis = self.face.axis();
        let (u_axis, v_axis) = slice_axes(axis);
        let mut center = [0.0; 3];
        center[axis] = self.plane as f32;
        center[u_axis] = self.u as f32 + (self.width - 1) as f32 * 0.5;
        center[v_axis] = self.v as f32 + (self.height - 1) as f32 * 0.5;
        center
    }

    /// Corner positions `(u0,v0), (u1,v0), (u1,v1), (u0,v1)`, scaled.
    pub fn corners(&self, scale: f32) -> [[f32; 3]; 4] {
        let axis = self.face.axis();
        let (u_axis, v_axis) = slice_axes(axis);
        let plane = self.plane as f32 * scale;
        let u0 = self.u as f32;
        let v0 = self.v as f32;
        let u1 = u0 + self.width as f32;
        let v1 = v0 + self.height as f32;

        [(u0, v0), (u1, v0), (u1, v1), (u0, v1)].map(|(u, v)| {
            let mut corner = [0.0; 3];
            corner[axis] = plane;
            corner[u_axis] = u * scale;
            corner[v_axis] = v * scale;
            corner
        })
    }

    /// Corner order for the two counter-clockwise triangles facing outward.
    pub fn triangle_order(&self) -> [usize; 6] {
        // The (u, v) basis is right-handed for X and Z slices, left-handed for Y.
        if (self.face.axis() != 1) == self.face.is_positive() {
            [0, 1, 2, 0, 2, 3]
        } else {
            [0, 2, 1, 0, 3, 2]
        }
    }
}

/// Slice axes `(u, v)` for a scan axis.
pub fn slice_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

/// Vertex colour for a material.
pub fn material_colour(material: MaterialId) -> [f32; 4] {
    palette::decode(material).map_or(FALLBACK_COLOUR, |[r, g, b]| [r, g, b, 1.0])
}

/// Result of one chunk rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshOutcome {
    /// Quads written.
    pub quads: usize,
    /// Vertices written, front-packed.
    pub vertex_count: usize,
    /// True when quads were dropped because the buffer was full.
    pub truncated: bool,
}

/// Capacity-bounded sink for quad vertices.
///
/// The output is sized to the full capacity on the first quad and never grows
/// past it. Once a quad does not fit, every later quad is refused as well.
pub struct VertexWriter<'a> {
    out: &'a mut Vec<MeshVertex>,
    capacity: usize,
    voxel_scale: f32,
    quads: usize,
    truncated: bool,
}

impl<'a> VertexWriter<'a> {
    /// Start writing into `out`, discarding its previous contents.
    pub fn new(out: &'a mut Vec<MeshVertex>, capacity: usize, voxel_scale: f32) -> Self {
        out.clear();
        Self {
            out,
            capacity,
            voxel_scale,
            quads: 0,
            truncated: false,
        }
    }

    /// Append a quad's six vertices, or break if they would exceed capacity.
    pub fn push_quad(&mut self, quad: &Quad) -> ControlFlow<()> {
        if self.truncated || self.out.len() + VERTICES_PER_QUAD > self.capacity {
            self.truncated = true;
            return ControlFlow::Break(());
        }
        if self.out.capacity() < self.capacity {
            self.out.reserve_exact(self.capacity - self.out.len());
        }

        let corners = quad.corners(self.voxel_scale);
        let normal = quad.face.normal().to_array();
        let color = material_colour(quad.material);
        for idx in quad.triangle_order() {
            self.out.push(MeshVertex {
                position: corners[idx],
                normal,
                color,
            });
        }
        self.quads += 1;
        ControlFlow::Continue(())
    }

    /// Summarize what was written.
    pub fn finish(self) -> MeshOutcome {
        MeshOutcome {
            quads: self.quads,
            vertex_count: self.out.len(),
            truncated: self.truncated,
        }
    }
}

/// Mesh the chunk at `pos` into `writer`.
pub fn mesh_chunk<S: VoxelStore + ?Sized>(
    store: &S,
    pos: ChunkPos,
    links: NeighborLinks,
    writer: &mut VertexWriter<'_>,
) {
    let _ = for_each_quad(store, pos, links, |quad| writer.push_quad(&quad));
}

/// Every quad of the chunk at `pos`, without a capacity limit.
pub fn chunk_quads<S: VoxelStore + ?Sized>(
    store: &S,
    pos: ChunkPos,
    links: NeighborLinks,
) -> Vec<Quad> {
    let mut quads = Vec::new();
    let _ = for_each_quad(store, pos, links, |quad| {
        quads.push(quad);
        ControlFlow::Continue(())
    });
    quads
}

fn for_each_quad<S, F>(store: &S, pos: ChunkPos, links: NeighborLinks, mut emit: F) -> ControlFlow<()>
where
    S: VoxelStore + ?Sized,
    F: FnMut(Quad) -> ControlFlow<()>,
{
    let origin = pos.origin();
    let mut mask = SliceMask::new();

    for axis in SCAN_ORDER {
        let back_linked = links.linked(Face::from_axis(axis, false));
        let front_linked = links.linked(Face::from_axis(axis, true));

        for plane in 0..=CHUNK_SIZE {
            if plane == CHUNK_SIZE && front_linked {
                continue;
            }
            if !fill_slice(store, origin, axis, plane, back_linked, &mut mask) {
                continue;
            }
            for rect in mask.drain_rects() {
                emit(Quad::from_rect(axis, plane, rect))?;
            }
        }
    }
    ControlFlow::Continue(())
}

/// Overwrite `mask` with the faces on `plane`. Returns false when there are none.
fn fill_slice<S: VoxelStore + ?Sized>(
    store: &S,
    origin: IVec3,
    axis: usize,
    plane: usize,
    back_linked: bool,
    mask: &mut SliceMask,
) -> bool {
    let (u_axis, v_axis) = slice_axes(axis);
    let mut any = false;

    for v in 0..CHUNK_SIZE {
        for u in 0..CHUNK_SIZE {
            let mut p = origin;
            p[u_axis] += u as i32;
            p[v_axis] += v as i32;
            p[axis] += plane as i32;

            let front = if plane < CHUNK_SIZE {
                store.get(p.x, p.y, p.z)
            } else {
                MATERIAL_EMPTY
            };
            let back = if plane == 0 && !back_linked {
                MATERIAL_EMPTY
            } else {
                p[axis] -= 1;
                store.get(p.x, p.y, p.z)
            };

            let value = face_value(front, back);
            any |= value != 0;
            mask.set(u, v, value);
        }
    }
    any
}

/// Signed mask value for a plane with `front` ahead and `back` behind.
#[inline]
fn face_value(front: MaterialId, back: MaterialId) -> i32 {
    match (front == MATERIAL_EMPTY, back == MATERIAL_EMPTY) {
        (true, false) => back as i32,
        (false, true) => -(front as i32),
        _ => 0,
    }
}
