//! GPU residency for terrain chunks: pooled `wgpu` buffers, the terrain
//! vertex layout and a [`MeshUploader`](terra_planet::MeshUploader) that
//! plugs into a planet.

pub mod buffer_pool;
pub mod device;
pub mod gpu_mesh;
pub mod uploader;
pub mod vertex_format;

pub use buffer_pool::{BufferKind, GpuBufferPool, PooledBuffer};
pub use device::{RenderError, request_headless_device, request_headless_device_blocking};
pub use gpu_mesh::GpuChunkMesh;
pub use uploader::WgpuUploader;
pub use vertex_format::{TERRAIN_VERTEX_ATTRIBUTES, TERRAIN_VERTEX_LAYOUT};
