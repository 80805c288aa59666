//! [`MeshUploader`] backed by a `wgpu` device.

use rustc_hash::FxHashMap;
use terra_cubesphere::ChunkKey;
use terra_mesh::{ChunkMesh, PackedChunkMesh};
use terra_planet::{MeshHandle, MeshUploader, UploadError};

use crate::{GpuBufferPool, GpuChunkMesh};

/// Packs chunk meshes to f32 and uploads them into pooled GPU buffers.
///
/// Must stay on the thread that owns the device's submission queue.
pub struct WgpuUploader {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pool: GpuBufferPool,
    meshes: FxHashMap<MeshHandle, GpuChunkMesh>,
    /// Reused packing buffer.
    scratch: PackedChunkMesh,
    next_handle: u64,
    /// Cap on live buffer bytes.
    byte_budget: Option<u64>,
}

impl WgpuUploader {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            pool: GpuBufferPool::new(),
            meshes: FxHashMap::default(),
            scratch: PackedChunkMesh::new(),
            next_handle: 0,
            byte_budget: None,
        }
    }

    pub fn with_byte_budget(mut self, budget: u64) -> Self {
        self.byte_budget = Some(budget);
        self
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&GpuChunkMesh> {
        self.meshes.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn pool(&self) -> &GpuBufferPool {
        &self.pool
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Bind and draw one chunk. Returns `false` for an unknown handle.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, handle: MeshHandle) -> bool {
        let Some(mesh) = self.meshes.get(&handle) else {
            return false;
        };
        mesh.bind(render_pass);
        mesh.draw(render_pass);
        true
    }

    /// Free pooled buffers no chunk is using.
    pub fn trim(&mut self) {
        self.pool.trim();
    }
}

impl MeshUploader for WgpuUploader {
    fn upload(&mut self, key: &ChunkKey, mesh: &ChunkMesh) -> Result<MeshHandle, UploadError> {
        if mesh.is_empty() {
            return Err(UploadError::EmptyMesh);
        }
        self.scratch.repack(mesh);

        if let Some(budget) = self.byte_budget {
            let available = budget.saturating_sub(self.pool.gpu_memory_in_use());
            let requested = self.scratch.byte_size();
            if requested > available {
                return Err(UploadError::OutOfMemory {
                    requested,
                    available,
                });
            }
        }

        let gpu = GpuChunkMesh::upload(&self.device, &self.queue, &mut self.pool, &self.scratch);
        self.next_handle += 1;
        let handle = MeshHandle::new(self.next_handle);
        log::trace!("Uploaded chunk {key} as mesh {}", handle.raw());
        self.meshes.insert(handle, gpu);
        Ok(handle)
    }

    fn release(&mut self, handle: MeshHandle) {
        match self.meshes.remove(&handle) {
            Some(mesh) => mesh.release(&mut self.pool),
            None => log::error!("Released unknown mesh handle {}", handle.raw()),
        }
    }
}
