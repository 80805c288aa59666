//! Planet orchestration: rebuilds the cube-sphere quadtree from the
//! viewpoint every update, diffs the leaf set against the resident chunk
//! table, recycles retired chunks through a pool, generates meshes inline
//! or on worker threads, and uploads finished meshes through a
//! [`MeshUploader`].

pub mod chunk;
pub mod error;
pub mod params;
pub mod planet;
pub mod pool;
pub mod table;
pub mod upload;
pub mod worker;

pub use chunk::{Chunk, ChunkHandle, ChunkId, ChunkState};
pub use error::{GenerationError, PlanetError, TableError, UploadError};
pub use params::{DEFAULT_SPLIT_THRESHOLD, PlanetParams};
pub use planet::{Planet, RenderableChunk, UpdateReport};
pub use pool::ChunkPool;
pub use table::{ChunkTable, TableDiff};
pub use upload::{HeadlessUploader, MeshHandle, MeshUploader};
pub use worker::{GenerationOutcome, MeshWorkerPool};
