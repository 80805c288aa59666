//! The six faces of the cubesphere and their fixed face-to-world transforms.

use terra_math::{DMat4, DVec3, face_transform, quarter_turns_about_x, quarter_turns_about_y};

/// The six faces of the cube that forms the cubesphere.
///
/// Each variant corresponds to a face whose outward normal points along the
/// named axis. The discriminant is the face index used in chunk keys and in
/// leaf ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +Y face
    PosY = 0,
    /// −Y face
    NegY = 1,
    /// +X face
    PosX = 2,
    /// −X face
    NegX = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

impl CubeFace {
    /// All six faces in index order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Face index (0–5).
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Self::index). Returns `None` for indices above 5.
    #[must_use]
    pub fn from_index(index: usize) -> Option<CubeFace> {
        Self::ALL.get(index).copied()
    }

    /// The opposite face (e.g., `PosX` → `NegX`).
    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::PosX => CubeFace::NegX,
            CubeFace::NegX => CubeFace::PosX,
            CubeFace::PosY => CubeFace::NegY,
            CubeFace::NegY => CubeFace::PosY,
            CubeFace::PosZ => CubeFace::NegZ,
            CubeFace::NegZ => CubeFace::PosZ,
        }
    }

    /// Outward-pointing unit normal for this face.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// Rotation taking the face-local frame (face plane spanned by x and y,
    /// outward along +z) onto this face.
    #[must_use]
    pub fn rotation(self) -> DMat4 {
        match self {
            CubeFace::PosY => quarter_turns_about_x(-1),
            CubeFace::NegY => quarter_turns_about_x(1),
            CubeFace::PosX => quarter_turns_about_y(1),
            CubeFace::NegX => quarter_turns_about_y(-1),
            CubeFace::PosZ => DMat4::IDENTITY,
            CubeFace::NegZ => quarter_turns_about_y(2),
        }
    }

    /// Face-to-world transform for a planet of the given radius: rotate onto
    /// the face, then translate `radius` along the face normal.
    ///
    /// The transform is relative to the planet center; the planet origin is
    /// applied separately.
    #[must_use]
    pub fn local_to_world(self, radius: f64) -> DMat4 {
        face_transform(self.rotation(), self.normal() * radius)
    }

    /// World direction of increasing face-local x.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        self.rotation().transform_vector3(DVec3::X)
    }

    /// World direction of increasing face-local y.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        self.rotation().transform_vector3(DVec3::Y)
    }
}
