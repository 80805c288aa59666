//! Geometry of one chunk: where it sits on its face and how finely it is
//! sampled.

use terra_cubesphere::{ChunkKey, CubeFace};
use terra_math::{DMat4, DVec2, DVec3};

use crate::MeshError;

/// Upper bound on grid cells per edge. Keeps `(R+3)²` well inside `u32`.
pub const MAX_RESOLUTION: u32 = 4096;

/// Scalar description of a chunk mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkParams {
    pub face: CubeFace,
    /// Chunk center in face-local coordinates.
    pub center: DVec2,
    /// Edge length (the quadtree node size).
    pub width: f64,
    /// Interior grid cells per edge, excluding the skirt ring.
    pub resolution: u32,
    pub radius: f64,
    /// Planet center in world space.
    pub origin: DVec3,
    /// Flip the displacement and skirt direction (viewed from inside).
    pub inverted: bool,
}

impl ChunkParams {
    /// Params for the chunk covering the node identified by `key`.
    pub fn for_key(key: &ChunkKey, resolution: u32, radius: f64, origin: DVec3, inverted: bool) -> Self {
        Self {
            face: key.face(),
            center: key.center(),
            width: key.size(),
            resolution,
            radius,
            origin,
            inverted,
        }
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if self.resolution < 1 || self.resolution > MAX_RESOLUTION {
            return Err(MeshError::InvalidResolution(self.resolution));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(MeshError::InvalidWidth(self.width));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MeshError::InvalidRadius(self.radius));
        }
        Ok(())
    }

    /// Face-to-world transform relative to the planet center.
    #[must_use]
    pub fn local_to_world(&self) -> DMat4 {
        self.face.local_to_world(self.radius)
    }

    /// Full model matrix: planet origin applied after the face transform.
    #[must_use]
    pub fn model_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.origin) * self.local_to_world()
    }

    /// How far skirt vertices hang below their proxies.
    #[must_use]
    pub fn skirt_size(&self) -> f64 {
        self.width.min(self.radius / 5.0)
    }

    /// +1 for a normal planet, −1 when inverted.
    #[must_use]
    pub fn displacement_sign(&self) -> f64 {
        if self.inverted { -1.0 } else { 1.0 }
    }

    /// Direction skirts are pushed: always away from the viewer.
    #[must_use]
    pub fn skirt_sign(&self) -> f64 {
        -self.displacement_sign()
    }

    /// Vertices per edge including the skirt ring.
    #[must_use]
    pub fn grid_width(&self) -> usize {
        self.resolution as usize + 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.grid_width() * self.grid_width()
    }

    /// Triangles over the extended grid, skirt included.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        let cells = self.resolution as usize + 2;
        cells * cells * 2
    }

    /// Triangles of the visible interior only.
    #[must_use]
    pub fn surface_triangle_count(&self) -> usize {
        let r = self.resolution as usize;
        r * r * 2
    }

    /// Outward unit direction of grid point `(i, j)`, with `i, j` in
    /// `-1..=resolution + 1`, in face-local space.
    #[must_use]
    pub fn grid_direction(&self, i: i64, j: i64) -> DVec3 {
        let r = self.resolution as f64;
        let half = self.width / 2.0;
        let xp = self.width * i as f64 / r - half;
        let yp = self.width * j as f64 / r - half;
        DVec3::new(self.center.x + xp, self.center.y + yp, self.radius).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChunkParams {
        ChunkParams {
            face: CubeFace::PosZ,
            center: DVec2::ZERO,
            width: 250.0,
            resolution: 16,
            radius: 1000.0,
            origin: DVec3::ZERO,
            inverted: false,
        }
    }

    #[test]
    fn test_validate_rejects_degenerate_chunks() {
        assert!(params().validate().is_ok());
        let zero_res = ChunkParams {
            resolution: 0,
            ..params()
        };
        assert_eq!(zero_res.validate(), Err(MeshError::InvalidResolution(0)));
        let zero_width = ChunkParams {
            width: 0.0,
            ..params()
        };
        assert_eq!(zero_width.validate(), Err(MeshError::InvalidWidth(0.0)));
        let bad_radius = ChunkParams {
            radius: f64::NAN,
            ..params()
        };
        assert!(matches!(bad_radius.validate(), Err(MeshError::InvalidRadius(_))));
    }

    #[test]
    fn test_skirt_size_clamps_to_fifth_of_radius() {
        assert_eq!(params().skirt_size(), 200.0);
        let small = ChunkParams {
            width: 50.0,
            ..params()
        };
        assert_eq!(small.skirt_size(), 50.0);
        let huge = ChunkParams {
            width: 10_000.0,
            ..params()
        };
        assert_eq!(huge.skirt_size(), 1000.0 / 5.0);
    }

    #[test]
    fn test_counts() {
        let p = params();
        assert_eq!(p.grid_width(), 19);
        assert_eq!(p.vertex_count(), 361);
        assert_eq!(p.triangle_count(), 648);
        assert_eq!(p.surface_triangle_count(), 512);
    }

    #[test]
    fn test_grid_direction_at_center_is_plus_z() {
        assert_eq!(params().grid_direction(8, 8), DVec3::Z);
    }

    #[test]
    fn test_signs() {
        let p = params();
        assert_eq!((p.displacement_sign(), p.skirt_sign()), (1.0, -1.0));
        let inv = ChunkParams {
            inverted: true,
            ..p
        };
        assert_eq!((inv.displacement_sign(), inv.skirt_sign()), (-1.0, 1.0));
    }
}
