//! Error types for chunk lifecycle and planet updates.

use terra_cubesphere::{ChunkKey, LodError};
use terra_mesh::MeshError;

use crate::ChunkState;

/// Rejected chunk table operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("chunk table is full ({capacity} chunks)")]
    CapacityExceeded { capacity: usize },

    #[error("chunk {0} is already resident")]
    DuplicateKey(ChunkKey),
}

/// A mesh could not be made GPU-resident.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("cannot upload an empty mesh")]
    EmptyMesh,

    #[error("upload of {requested} bytes exceeds the remaining budget of {available} bytes")]
    OutOfMemory { requested: u64, available: u64 },

    #[error("graphics backend error: {0}")]
    Backend(String),
}

/// A chunk's mesh generation did not produce a mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("mesh generation panicked: {0}")]
    Panicked(String),

    #[error("chunk is {0:?}, expected Pending")]
    NotPending(ChunkState),
}

/// Errors surfaced by [`Planet`](crate::Planet).
#[derive(Debug, thiserror::Error)]
pub enum PlanetError {
    #[error("invalid LOD parameters: {0}")]
    Lod(#[from] LodError),

    #[error("invalid chunk parameters: {0}")]
    Mesh(#[from] MeshError),

    #[error("viewpoint must be finite, got {0}")]
    InvalidViewpoint(terra_math::DVec3),

    #[error("planet origin must be finite, got {0}")]
    InvalidOrigin(terra_math::DVec3),

    #[error("max_chunks must be at least 6 (one root per cube face), got {0}")]
    InvalidMaxChunks(usize),

    #[error("queue budget must be > 0 when worker threads are enabled")]
    InvalidQueueBudget,

    #[error("failed to spawn mesh worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
