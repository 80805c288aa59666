//! Cube-sphere LOD structure: the six cube faces with their fixed
//! face-to-world transforms, the per-face quadtree that is rebuilt from the
//! viewpoint every frame, and the identity key that lets chunks survive
//! across rebuilds.

mod cube_face;
mod cubic;
mod error;
mod key;
mod quadtree;

pub use cube_face::CubeFace;
pub use cubic::CubicQuadtree;
pub use error::LodError;
pub use key::ChunkKey;
pub use quadtree::{NodeId, QuadNode, Quadtree};
