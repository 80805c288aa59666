//! Procedural height and color generators for planets.
//!
//! [`MoonTerrain`] is a cratered lunar surface; [`AltitudeColorRamp`] tints
//! vertices by height. Both sample on the sphere direction, so they are
//! continuous across cube-face seams.

pub mod color;
pub mod crater;
pub mod error;
pub mod moon;

pub use color::AltitudeColorRamp;
pub use crater::{CraterField, crater_profile};
pub use error::TerrainError;
pub use moon::{MoonTerrain, MoonTerrainParams};

#[cfg(test)]
mod tests {
    use super::*;
    use terra_cubesphere::{ChunkKey, CubeFace};
    use terra_math::{DVec2, DVec3};
    use terra_mesh::{ChunkMesh, ChunkParams, Generators, build_chunk_mesh};

    #[test]
    fn test_moon_generators_mesh_cleanly() {
        let radius = 1737.0;
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        let ramp = AltitudeColorRamp::lunar(radius * terrain.params().amplitude).unwrap();
        let generators = Generators::new().with_height(terrain).with_color(ramp);

        let key = ChunkKey::new(CubeFace::PosY, DVec2::new(-434.25, 434.25), 868.5);
        let params = ChunkParams::for_key(&key, 16, radius, DVec3::ZERO, false);
        let mut mesh = ChunkMesh::new();
        let stats = build_chunk_mesh(&params, &generators, &mut mesh).unwrap();

        assert_eq!(stats.substituted_heights, 0);
        assert_eq!(stats.substituted_colors, 0);
        assert!(mesh.positions.iter().all(|p| p.is_finite()));
        let bound = radius * 0.003 * MoonTerrain::relief_bound();
        let radii: Vec<f64> = (0..mesh.vertex_count())
            .filter_map(|i| mesh.world_position(i, &params))
            .map(|p| p.length())
            .collect();
        // Interior surface stays within the relief band.
        let center = radii[radii.len() / 2];
        assert!((center - radius).abs() <= bound);
    }
}
