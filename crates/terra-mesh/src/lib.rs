//! Chunk mesh synthesis: a displaced sphere-patch grid with an outer skirt
//! ring, plus the packed vertex format used for GPU upload.

pub mod build;
pub mod chunk_mesh;
pub mod error;
pub mod generator;
pub mod packed;
pub mod params;

pub use build::{MeshStats, build_chunk_mesh};
pub use chunk_mesh::ChunkMesh;
pub use error::MeshError;
pub use generator::{ColorFn, ColorGenerator, Generators, HeightFn, HeightGenerator, Rgba};
pub use packed::{PackedChunkMesh, TERRAIN_VERTEX_STRIDE, TerrainVertex};
pub use params::{ChunkParams, MAX_RESOLUTION};
