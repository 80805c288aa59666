//! The seam between CPU mesh generation and GPU residency.
//!
//! Only the thread that owns the planet calls into the uploader, and only
//! from inside [`Planet::update`](crate::Planet::update) and teardown, so
//! implementations may hold thread-affine graphics resources.

use rustc_hash::FxHashMap;
use terra_cubesphere::ChunkKey;
use terra_mesh::{ChunkMesh, TERRAIN_VERTEX_STRIDE};

use crate::UploadError;

/// Opaque handle to an uploaded mesh, issued by a [`MeshUploader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(u64);

impl MeshHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Makes chunk meshes GPU-resident and releases them again.
pub trait MeshUploader {
    /// Upload `mesh` and return a handle that stays valid until released.
    fn upload(&mut self, key: &ChunkKey, mesh: &ChunkMesh) -> Result<MeshHandle, UploadError>;

    /// Release a handle returned by [`upload`](Self::upload). Each handle is
    /// released exactly once.
    fn release(&mut self, handle: MeshHandle);
}

impl<U: MeshUploader + ?Sized> MeshUploader for &mut U {
    fn upload(&mut self, key: &ChunkKey, mesh: &ChunkMesh) -> Result<MeshHandle, UploadError> {
        (**self).upload(key, mesh)
    }

    fn release(&mut self, handle: MeshHandle) {
        (**self).release(handle);
    }
}

/// Bytes a mesh occupies once packed for the GPU.
pub fn packed_size(mesh: &ChunkMesh) -> u64 {
    mesh.vertex_count() as u64 * TERRAIN_VERTEX_STRIDE + mesh.indices.len() as u64 * 4
}

/// CPU-only uploader that tracks what would be resident on a GPU.
///
/// Used by headless runs and tests to verify that every upload is matched
/// by exactly one release.
#[derive(Debug, Default)]
pub struct HeadlessUploader {
    live: FxHashMap<MeshHandle, u64>,
    next_handle: u64,
    live_bytes: u64,
    byte_budget: Option<u64>,
    uploads: u64,
    releases: u64,
    double_releases: u64,
}

impl HeadlessUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject uploads that would push resident bytes above `budget`.
    pub fn with_byte_budget(budget: u64) -> Self {
        Self {
            byte_budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn set_byte_budget(&mut self, budget: Option<u64>) {
        self.byte_budget = budget;
    }

    /// Handles uploaded and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    pub fn is_live(&self, handle: MeshHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    pub fn release_count(&self) -> u64 {
        self.releases
    }

    /// Releases of handles that were not live. Always zero for a correct caller.
    pub fn double_release_count(&self) -> u64 {
        self.double_releases
    }
}

impl MeshUploader for HeadlessUploader {
    fn upload(&mut self, _key: &ChunkKey, mesh: &ChunkMesh) -> Result<MeshHandle, UploadError> {
        if mesh.is_empty() {
            return Err(UploadError::EmptyMesh);
        }
        let bytes = packed_size(mesh);
        if let Some(budget) = self.byte_budget {
            let available = budget.saturating_sub(self.live_bytes);
            if bytes > available {
                return Err(UploadError::OutOfMemory {
                    requested: bytes,
                    available,
                });
            }
        }
        self.next_handle += 1;
        let handle = MeshHandle(self.next_handle);
        self.live.insert(handle, bytes);
        self.live_bytes += bytes;
        self.uploads += 1;
        Ok(handle)
    }

    fn release(&mut self, handle: MeshHandle) {
        match self.live.remove(&handle) {
            Some(bytes) => {
                self.live_bytes -= bytes;
                self.releases += 1;
            }
            None => {
                tracing::error!(handle = handle.raw(), "released a mesh handle that is not live");
                self.double_releases += 1;
            }
        }
    }
}
