//! Power-of-two bucketed pool of `wgpu` buffers for chunk meshes.
//!
//! Chunks at every LOD share one resolution, so their meshes land in a
//! handful of size classes and released buffers are reused almost
//! immediately. Requests above the largest class get an exact-size buffer
//! that is destroyed on release instead of pooled.

/// 4 KB, 8 KB, ... 1 MB.
const SIZE_CLASSES: [u64; 9] = [
    4 << 10,
    8 << 10,
    16 << 10,
    32 << 10,
    64 << 10,
    128 << 10,
    256 << 10,
    512 << 10,
    1 << 20,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl BufferKind {
    fn usage(self) -> wgpu::BufferUsages {
        match self {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        }
    }

    fn label(self) -> &'static str {
        match self {
            BufferKind::Vertex => "pooled_terrain_vertex_buffer",
            BufferKind::Index => "pooled_terrain_index_buffer",
        }
    }
}

/// A buffer checked out of a [`GpuBufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    pub buffer: wgpu::Buffer,
    kind: BufferKind,
    /// `None` for oversized buffers that bypass the pool.
    class: Option<usize>,
    size: u64,
}

impl PooledBuffer {
    /// Allocated size, at least the requested size.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn size_class(&self) -> Option<usize> {
        self.class
    }
}

/// Free vertex and index buffers bucketed by size class.
#[derive(Default)]
pub struct GpuBufferPool {
    vertex_pool: [Vec<wgpu::Buffer>; SIZE_CLASSES.len()],
    index_pool: [Vec<wgpu::Buffer>; SIZE_CLASSES.len()],
    /// In use plus pooled.
    total_allocated: u64,
    in_use: u64,
}

impl GpuBufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest class holding `min_size` bytes, or `None` if it exceeds
    /// the largest class.
    pub fn size_class_for(min_size: u64) -> Option<usize> {
        SIZE_CLASSES.iter().position(|&s| s >= min_size)
    }

    pub fn class_size(class: usize) -> u64 {
        SIZE_CLASSES[class.min(SIZE_CLASSES.len() - 1)]
    }

    /// A buffer of at least `min_size` bytes, reused from the pool when one
    /// of the right class is free.
    pub fn acquire(&mut self, device: &wgpu::Device, kind: BufferKind, min_size: u64) -> PooledBuffer {
        let class = Self::size_class_for(min_size);
        let size = match class {
            Some(class) => SIZE_CLASSES[class],
            None => min_size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
        };

        if let Some(class) = class
            && let Some(buffer) = self.bucket(kind, class).pop()
        {
            self.in_use += size;
            return PooledBuffer {
                buffer,
                kind,
                class: Some(class),
                size,
            };
        }

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(kind.label()),
            size,
            usage: kind.usage(),
            mapped_at_creation: false,
        });
        self.total_allocated += size;
        self.in_use += size;
        PooledBuffer {
            buffer,
            kind,
            class,
            size,
        }
    }

    /// Return a buffer. Oversized buffers are destroyed.
    pub fn release(&mut self, buffer: PooledBuffer) {
        self.in_use = self.in_use.saturating_sub(buffer.size);
        match buffer.class {
            Some(class) => self.bucket(buffer.kind, class).push(buffer.buffer),
            None => {
                buffer.buffer.destroy();
                self.total_allocated = self.total_allocated.saturating_sub(buffer.size);
            }
        }
    }

    fn bucket(&mut self, kind: BufferKind, class: usize) -> &mut Vec<wgpu::Buffer> {
        match kind {
            BufferKind::Vertex => &mut self.vertex_pool[class],
            BufferKind::Index => &mut self.index_pool[class],
        }
    }

    /// Bytes held by live chunk meshes.
    pub fn gpu_memory_in_use(&self) -> u64 {
        self.in_use
    }

    /// Bytes allocated, free pooled buffers included.
    pub fn gpu_memory_allocated(&self) -> u64 {
        self.total_allocated
    }

    pub fn free_buffer_count(&self, kind: BufferKind) -> usize {
        let pool = match kind {
            BufferKind::Vertex => &self.vertex_pool,
            BufferKind::Index => &self.index_pool,
        };
        pool.iter().map(Vec::len).sum()
    }

    /// Destroy every free buffer.
    pub fn trim(&mut self) {
        for (class, &size) in SIZE_CLASSES.iter().enumerate() {
            for buffer in self.vertex_pool[class]
                .drain(..)
                .chain(self.index_pool[class].drain(..))
            {
                buffer.destroy();
                self.total_allocated = self.total_allocated.saturating_sub(size);
            }
        }
    }
}
