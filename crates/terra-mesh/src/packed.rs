//! GPU-ready vertex format for terrain chunks.
//!
//! [`ChunkMesh`] keeps f64 for generation; uploads convert to f32 here. The
//! positions are relative to the chunk's face frame, so they stay within a
//! planet radius of zero and f32 is adequate.

use crate::ChunkMesh;

/// Interleaved vertex, 40 bytes.
///
/// Layout:
///   - `[0..12]`  position `[f32; 3]`
///   - `[12..24]` normal `[f32; 3]`
///   - `[24..40]` color `[f32; 4]`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 40]);

/// Byte stride of [`TerrainVertex`].
pub const TERRAIN_VERTEX_STRIDE: u64 = std::mem::size_of::<TerrainVertex>() as u64;

/// Vertex and index data ready for upload.
#[derive(Clone, Debug, Default)]
pub struct PackedChunkMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl PackedChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a generated mesh, narrowing to f32.
    pub fn from_mesh(mesh: &ChunkMesh) -> Self {
        let mut packed = Self::new();
        packed.repack(mesh);
        packed
    }

    /// Overwrite with `mesh`, reusing this mesh's allocations.
    pub fn repack(&mut self, mesh: &ChunkMesh) {
        self.vertices.clear();
        self.vertices.extend(
            mesh.positions
                .iter()
                .zip(&mesh.normals)
                .zip(&mesh.colors)
                .map(|((p, n), c)| TerrainVertex {
                    position: p.as_vec3().to_array(),
                    normal: n.as_vec3().to_array(),
                    color: c.0,
                }),
        );
        self.indices.clear();
        self.indices.extend_from_slice(&mesh.indices);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the vertex data as a byte slice for GPU upload (zero-copy).
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as a byte slice for GPU upload (zero-copy).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Total upload size in bytes.
    pub fn byte_size(&self) -> u64 {
        (self.vertex_bytes().len() + self.index_bytes().len()) as u64
    }
}
