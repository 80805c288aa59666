//! A terrain chunk's vertex and index buffers on the GPU.

use terra_mesh::PackedChunkMesh;

use crate::{BufferKind, GpuBufferPool, PooledBuffer};

pub struct GpuChunkMesh {
    vertex_buffer: PooledBuffer,
    index_buffer: PooledBuffer,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl GpuChunkMesh {
    /// Write `mesh` into buffers taken from `pool`.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pool: &mut GpuBufferPool,
        mesh: &PackedChunkMesh,
    ) -> Self {
        let vertex_bytes = mesh.vertex_bytes();
        let index_bytes = mesh.index_bytes();

        let vertex_buffer = pool.acquire(device, BufferKind::Vertex, vertex_bytes.len() as u64);
        let index_buffer = pool.acquire(device, BufferKind::Index, index_bytes.len() as u64);
        queue.write_buffer(&vertex_buffer.buffer, 0, vertex_bytes);
        queue.write_buffer(&index_buffer.buffer, 0, index_bytes);

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            vertex_count: mesh.vertices.len() as u32,
        }
    }

    /// Overwrite in place when `mesh` fits the current buffers, otherwise
    /// swap in larger ones. Returns `true` if the buffers were kept.
    pub fn reupload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pool: &mut GpuBufferPool,
        mesh: &PackedChunkMesh,
    ) -> bool {
        let vertex_bytes = mesh.vertex_bytes();
        let index_bytes = mesh.index_bytes();
        let fits = vertex_bytes.len() as u64 <= self.vertex_buffer.size()
            && index_bytes.len() as u64 <= self.index_buffer.size();

        if fits {
            queue.write_buffer(&self.vertex_buffer.buffer, 0, vertex_bytes);
            queue.write_buffer(&self.index_buffer.buffer, 0, index_bytes);
            self.vertex_count = mesh.vertices.len() as u32;
            self.index_count = mesh.indices.len() as u32;
            return true;
        }

        let fresh = Self::upload(device, queue, pool, mesh);
        std::mem::replace(self, fresh).release(pool);
        false
    }

    /// Hand both buffers back to `pool`.
    pub fn release(self, pool: &mut GpuBufferPool) {
        pool.release(self.vertex_buffer);
        pool.release(self.index_buffer);
    }

    /// Allocated bytes, which may exceed the mesh size.
    pub fn total_gpu_bytes(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size()
    }

    pub fn bind<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.buffer.slice(..));
        render_pass.set_index_buffer(
            self.index_buffer.buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
    }

    /// Indexed draw over the whole mesh, skirt included.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
