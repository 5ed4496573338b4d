//! Slice mask and greedy rectangle merging.

use std::fmt;
use std::iter::FusedIterator;

use voxgrid_world::{MaterialId, CHUNK_SIZE};

/// Edge length of a slice mask.
pub const SLICE_SIZE: usize = CHUNK_SIZE;
const SLICE_AREA: usize = SLICE_SIZE * SLICE_SIZE;

/// 32×32 buffer of signed face indicators for one plane of a chunk.
///
/// A cell holds 0 (no face), `+m` for a face of material `m` whose normal
/// points along the positive scan axis, or `-m` for one pointing the other way.
/// Cells are addressed `(u, v)`; rows run along `u`.
#[derive(Clone, PartialEq, Eq)]
pub struct SliceMask {
    cells: [i32; SLICE_AREA],
}

impl SliceMask {
    /// An all-zero mask.
    pub fn new() -> Self {
        Self {
            cells: [0; SLICE_AREA],
        }
    }

    #[inline]
    fn index(u: usize, v: usize) -> usize {
        debug_assert!(u < SLICE_SIZE && v < SLICE_SIZE);
        v * SLICE_SIZE + u
    }

    /// Value at `(u, v)`.
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> i32 {
        self.cells[Self::index(u, v)]
    }

    /// Overwrite the value at `(u, v)`.
    #[inline]
    pub fn set(&mut self, u: usize, v: usize, value: i32) {
        self.cells[Self::index(u, v)] = value;
    }

    /// True when no cell holds a face.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Number of cells holding a face.
    pub fn face_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Merge the mask into rectangles, consuming it.
    ///
    /// Rows are scanned in increasing `v`, cells in increasing `u`. From each
    /// unconsumed cell the run is widened along `u` first, then whole rows are
    /// added along `v` while every cell in the span matches. Consumed cells
    /// are zeroed, so the mask is empty once the iterator is exhausted.
    pub fn drain_rects(&mut self) -> GreedyRects<'_> {
        GreedyRects {
            cells: &mut self.cells,
            cursor: 0,
        }
    }
}

impl Default for SliceMask {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SliceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceMask")
            .field("faces", &self.face_count())
            .finish()
    }
}

/// Maximal rectangle of one signed mask value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRect {
    /// Signed mask value shared by every covered cell.
    pub value: i32,
    /// First covered column.
    pub u: usize,
    /// First covered row.
    pub v: usize,
    /// Columns covered (at least 1).
    pub width: usize,
    /// Rows covered (at least 1).
    pub height: usize,
}

impl MergedRect {
    /// Midpoint of the covered cells, `(start + end) / 2` per axis.
    pub fn center(&self) -> (f32, f32) {
        (
            self.u as f32 + (self.width - 1) as f32 * 0.5,
            self.v as f32 + (self.height - 1) as f32 * 0.5,
        )
    }

    /// Material id without the direction sign.
    pub fn material(&self) -> MaterialId {
        self.value.unsigned_abs() as MaterialId
    }

    /// True for faces pointing along the positive scan axis.
    pub fn is_positive(&self) -> bool {
        self.value > 0
    }
}

/// Single-pass iterator over the rectangles of a [`SliceMask`].
///
/// Each rectangle is produced exactly once. Dropping the iterator early leaves
/// the unvisited cells in the mask.
pub struct GreedyRects<'a> {
    cells: &'a mut [i32; SLICE_AREA],
    cursor: usize,
}

impl Iterator for GreedyRects<'_> {
    type Item = MergedRect;

    fn next(&mut self) -> Option<MergedRect> {
        let cells = &mut *self.cells;
        while self.cursor < SLICE_AREA {
            let start = self.cursor;
            let value = cells[start];
            if value == 0 {
                self.cursor += 1;
                continue;
            }

            let u = start % SLICE_SIZE;
            let v = start / SLICE_SIZE;

            cells[start] = 0;
            let mut width = 1;
            while u + width < SLICE_SIZE && cells[start + width] == value {
                cells[start + width] = 0;
                width += 1;
            }

            let mut height = 1;
            while v + height < SLICE_SIZE {
                let row = (v + height) * SLICE_SIZE + u;
                let span = &mut cells[row..row + width];
                if span.iter().any(|&c| c != value) {
                    break;
                }
                span.fill(0);
                height += 1;
            }

            self.cursor = start + width;
            return Some(MergedRect {
                value,
                u,
                v,
                width,
                height,
            });
        }
        None
    }
}

impl FusedIterator for GreedyRects<'_> {}
