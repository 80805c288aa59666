//! CPU-side chunk mesh buffers.

use terra_math::{Aabb3, DVec3};

use crate::{ChunkParams, Rgba};

/// Vertex and index buffers of one chunk, in face-local space.
///
/// Buffers keep their capacity across [`clear`](Self::clear) so a pooled
/// chunk can be regenerated without reallocating.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Displaced positions relative to the chunk's face frame.
    pub positions: Vec<DVec3>,
    /// Unit vertex normals.
    pub normals: Vec<DVec3>,
    pub colors: Vec<Rgba>,
    /// Triangle list, counter-clockwise seen from outside.
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop contents, keep allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World-space position of vertex `index` (planet origin applied).
    pub fn world_position(&self, index: usize, params: &ChunkParams) -> Option<DVec3> {
        let p = self.positions.get(index)?;
        Some(params.model_matrix().transform_point3(*p))
    }

    /// World-space bounds of every vertex, skirt included.
    pub fn world_bounds(&self, params: &ChunkParams) -> Option<Aabb3> {
        let model = params.model_matrix();
        Aabb3::from_points(self.positions.iter().map(|p| model.transform_point3(*p)))
    }

    /// Bytes held by the CPU buffers (length, not capacity).
    pub fn byte_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<DVec3>()
            + self.normals.len() * std::mem::size_of::<DVec3>()
            + self.colors.len() * std::mem::size_of::<Rgba>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }
}
