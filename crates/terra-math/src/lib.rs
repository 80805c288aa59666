//! f64 vector, transform and bounding-box primitives shared by every Terra crate.
//!
//! Vectors and matrices are re-exported from `glam`; this crate adds the
//! face-local 2D box used by the quadtree, a 3D AABB for chunk bounds, and
//! exact quarter-turn rotations for the cube face transforms.

mod aabb;
mod bounds;
mod transform;

pub use aabb::Aabb3;
pub use bounds::Box2;
pub use glam::{DMat4, DVec2, DVec3, DVec4};
pub use transform::{face_transform, quarter_turns_about_x, quarter_turns_about_y};
