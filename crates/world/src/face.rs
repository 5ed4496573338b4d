//! The six axis-aligned voxel faces.
//!
//! The discriminant order (+Z, -Z, -X, +Y, +X, -Y) is shared by the mesher,
//! the ray caster and the edit path; face indices are stable across the crate.

use glam::{IVec3, Vec3};

/// Axis-aligned face of a voxel, named by its outward normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Face {
    ZPos = 0,
    ZNeg = 1,
    XNeg = 2,
    YPos = 3,
    XPos = 4,
    YNeg = 5,
}

const OFFSETS: [[i32; 3]; 6] = [
    [0, 0, 1],
    [0, 0, -1],
    [-1, 0, 0],
    [0, 1, 0],
    [1, 0, 0],
    [0, -1, 0],
];

impl Face {
    /// All faces in index order.
    pub const ALL: [Face; 6] = [
        Face::ZPos,
        Face::ZNeg,
        Face::XNeg,
        Face::YPos,
        Face::XPos,
        Face::YNeg,
    ];

    /// Stable face index in `0..6`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Face> {
        Self::ALL.get(index).copied()
    }

    /// Face on `axis` (0 = X, 1 = Y, 2 = Z) whose normal has the given sign.
    pub fn from_axis(axis: usize, positive: bool) -> Face {
        match (axis, positive) {
            (0, true) => Face::XPos,
            (0, false) => Face::XNeg,
            (1, true) => Face::YPos,
            (1, false) => Face::YNeg,
            (_, true) => Face::ZPos,
            (_, false) => Face::ZNeg,
        }
    }

    /// Axis the normal lies on (0 = X, 1 = Y, 2 = Z).
    pub fn axis(self) -> usize {
        match self {
            Face::XNeg | Face::XPos => 0,
            Face::YNeg | Face::YPos => 1,
            Face::ZNeg | Face::ZPos => 2,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Face::XPos | Face::YPos | Face::ZPos)
    }

    pub fn opposite(self) -> Face {
        Face::from_axis(self.axis(), !self.is_positive())
    }

    /// Unit step to the voxel across this face.
    #[inline]
    pub fn offset(self) -> IVec3 {
        IVec3::from_array(OFFSETS[self.index()])
    }

    /// Outward unit normal.
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    /// Position of the voxel sharing this face with `pos`.
    #[inline]
    pub fn adjacent(self, pos: IVec3) -> IVec3 {
        pos + self.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for (i, face) in Face::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(Face::from_index(i), Some(*face));
        }
        assert_eq!(Face::from_index(6), None);
    }

    #[test]
    fn canonical_offset_table() {
        assert_eq!(Face::ZPos.offset(), IVec3::Z);
        assert_eq!(Face::ZNeg.offset(), IVec3::NEG_Z);
        assert_eq!(Face::XNeg.offset(), IVec3::NEG_X);
        assert_eq!(Face::YPos.offset(), IVec3::Y);
        assert_eq!(Face::XPos.offset(), IVec3::X);
        assert_eq!(Face::YNeg.offset(), IVec3::NEG_Y);
    }

    #[test]
    fn axis_sign_and_opposite_agree_with_offset() {
        for face in Face::ALL {
            let offset = face.offset();
            assert_eq!(offset[face.axis()].abs(), 1);
            assert_eq!(offset[face.axis()] > 0, face.is_positive());
            assert_eq!(face.opposite().offset(), -offset);
            assert_eq!(Face::from_axis(face.axis(), face.is_positive()), face);
        }
    }

    #[test]
    fn adjacent_steps_one_voxel() {
        let pos = IVec3::new(4, 5, 6);
        assert_eq!(Face::XNeg.adjacent(pos), IVec3::new(3, 5, 6));
        assert_eq!(Face::YPos.adjacent(pos), IVec3::new(4, 6, 6));
    }
}
