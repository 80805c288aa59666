//! Geometric identity of a quadtree leaf.
//!
//! The ephemeral quadtree is rebuilt every frame, so chunks are matched
//! across frames by the geometry of the node that produced them rather than
//! by node identity.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use terra_math::DVec2;

use crate::CubeFace;

/// Composite `(face, center.x, center.y, size)` key.
///
/// Equality and hashing are bit-exact on the float fields, so two keys are
/// equal only when they describe the same node. Quadtree subdivision halves
/// sizes and offsets exactly, so a node reached twice always produces the
/// same bits.
#[derive(Clone, Copy, Debug)]
pub struct ChunkKey {
    face: CubeFace,
    center: DVec2,
    size: f64,
}

/// `-0.0` and `0.0` describe the same node.
fn canonical(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

impl ChunkKey {
    pub fn new(face: CubeFace, center: DVec2, size: f64) -> Self {
        Self {
            face,
            center: DVec2::new(canonical(center.x), canonical(center.y)),
            size: canonical(size),
        }
    }

    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Node center in face-local coordinates.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Full edge length of the node.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    fn bits(&self) -> (u8, u64, u64, u64) {
        (
            self.face as u8,
            self.center.x.to_bits(),
            self.center.y.to_bits(),
            self.size.to_bits(),
        )
    }
}

impl PartialEq for ChunkKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for ChunkKey {}

impl Hash for ChunkKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl Ord for ChunkKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.face
            .cmp(&other.face)
            .then(self.size.total_cmp(&other.size))
            .then(self.center.y.total_cmp(&other.center.y))
            .then(self.center.x.total_cmp(&other.center.x))
    }
}

impl PartialOrd for ChunkKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f{} ({:.2}, {:.2}) [{:.2}]",
            self.face.index(),
            self.center.x,
            self.center.y,
            self.size
        )
    }
}
