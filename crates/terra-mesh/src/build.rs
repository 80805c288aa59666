//! Chunk mesh synthesis.
//!
//! The grid is sampled one ring beyond the chunk on every side. After
//! normals are accumulated, that outer ring is pulled back onto the chunk
//! edge and pushed below the surface, forming a skirt that hides cracks
//! against neighbors at a different LOD.
//!
//! Grid coordinates `(i, j)` run over `-1..=R+1`; buffers use the shifted
//! index `gi = i + 1`, stored row-major as `gi * (R + 3) + gj`.

use terra_math::DVec3;

use crate::{ChunkMesh, ChunkParams, Generators, MeshError};

/// Counters from one mesh build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub vertices: usize,
    pub triangles: usize,
    /// Vertices whose height generator result was non-finite and replaced by 0.
    pub substituted_heights: usize,
    /// Vertices whose color generator result was non-finite and replaced by white.
    pub substituted_colors: usize,
}

/// Rebuild `mesh` in place for the chunk described by `params`.
///
/// On success the mesh holds `(R+3)²` vertices and `(R+2)²·2` triangles.
/// Generator failures are repaired per vertex and reported in the returned
/// stats; only invalid params are an error.
pub fn build_chunk_mesh(
    params: &ChunkParams,
    generators: &Generators,
    mesh: &mut ChunkMesh,
) -> Result<MeshStats, MeshError> {
    params.validate()?;

    let grid = params.grid_width();
    let vertex_count = params.vertex_count();
    let r = i64::from(params.resolution);
    let local_to_world = params.local_to_world();
    let sign = params.displacement_sign();

    mesh.clear();
    mesh.positions.reserve(vertex_count);
    mesh.colors.reserve(vertex_count);
    mesh.indices.reserve(params.triangle_count() * 3);
    let mut ups = Vec::with_capacity(vertex_count);
    let mut stats = MeshStats::default();

    for i in -1..=r + 1 {
        for j in -1..=r + 1 {
            let up = params.grid_direction(i, j);
            let mut p = up * params.radius;
            p.z -= params.radius;
            let world = local_to_world.transform_point3(p);

            let height = generators
                .sample_height(world, params.radius)
                .unwrap_or_else(|| {
                    stats.substituted_heights += 1;
                    0.0
                });
            let color = generators.sample_color(world, height).unwrap_or_else(|| {
                stats.substituted_colors += 1;
                crate::Rgba::WHITE
            });

            mesh.positions.push(p + up * height * sign);
            mesh.colors.push(color);
            ups.push(up);
        }
    }

    let index = |gi: usize, gj: usize| -> u32 {
        debug_assert!(gi < grid && gj < grid, "grid index ({gi}, {gj}) outside {grid}");
        (gi * grid + gj) as u32
    };
    for gi in 0..grid - 1 {
        for gj in 0..grid - 1 {
            mesh.indices.extend_from_slice(&[
                index(gi, gj),
                index(gi + 1, gj + 1),
                index(gi, gj + 1),
                index(gi + 1, gj),
                index(gi + 1, gj + 1),
                index(gi, gj),
            ]);
        }
    }
    if let Some(&bad) = mesh.indices.iter().find(|&&ix| ix as usize >= vertex_count) {
        return Err(MeshError::IndexOutOfRange {
            index: bad,
            vertex_count,
        });
    }

    mesh.normals.resize(vertex_count, DVec3::ZERO);
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (v0, v1, v2) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
        // Edges from the second vertex. Edges from v0 flip the result on
        // half of the faces.
        let face_normal = (v2 - v1).cross(v0 - v1);
        mesh.normals[a] += face_normal;
        mesh.normals[b] += face_normal;
        mesh.normals[c] += face_normal;
    }

    let skirt = params.skirt_sign() * params.skirt_size();
    let last = grid - 1;
    for gi in 0..grid {
        for gj in 0..grid {
            if gi != 0 && gi != last && gj != 0 && gj != last {
                continue;
            }
            // Edge vertices take the neighbor one ring in; corners take the
            // diagonal, which is the chunk's own corner vertex.
            let proxy = index(gi.clamp(1, last - 1), gj.clamp(1, last - 1)) as usize;
            let target = index(gi, gj) as usize;
            mesh.positions[target] = mesh.positions[proxy] + ups[proxy] * skirt;
            mesh.normals[target] = mesh.normals[proxy];
        }
    }

    for n in &mut mesh.normals {
        *n = n.normalize_or_zero();
    }

    stats.vertices = mesh.vertex_count();
    stats.triangles = mesh.triangle_count();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorFn, HeightFn, Rgba};
    use terra_cubesphere::CubeFace;
    use terra_math::{DVec2, DVec3};

    fn params(face: CubeFace, center: DVec2, width: f64, resolution: u32) -> ChunkParams {
        ChunkParams {
            face,
            center,
            width,
            resolution,
            radius: 1000.0,
            origin: DVec3::ZERO,
            inverted: false,
        }
    }

    fn build(p: &ChunkParams, generators: &Generators) -> ChunkMesh {
        let mut mesh = ChunkMesh::new();
        build_chunk_mesh(p, generators, &mut mesh).unwrap();
        mesh
    }

    fn wavy() -> Generators {
        Generators::new().with_height(HeightFn(|w: DVec3, _: f64| {
            20.0 * (w.x / 37.0).sin() * (w.y / 53.0).cos()
        }))
    }

    fn is_skirt(gi: usize, gj: usize, grid: usize) -> bool {
        gi == 0 || gj == 0 || gi == grid - 1 || gj == grid - 1
    }

    #[test]
    fn test_grid_sizing() {
        for r in [1, 2, 3, 7, 16, 33] {
            let p = params(CubeFace::PosX, DVec2::new(100.0, -300.0), 125.0, r);
            let mut mesh = ChunkMesh::new();
            let stats = build_chunk_mesh(&p, &Generators::new(), &mut mesh).unwrap();
            let r = r as usize;
            assert_eq!(mesh.vertex_count(), (r + 3) * (r + 3));
            assert_eq!(mesh.triangle_count(), (r + 2) * (r + 2) * 2);
            assert_eq!(mesh.normals.len(), mesh.vertex_count());
            assert_eq!(mesh.colors.len(), mesh.vertex_count());
            assert_eq!(stats.vertices, mesh.vertex_count());
            assert_eq!(stats.triangles, mesh.triangle_count());
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut mesh = ChunkMesh::new();
        let zero_res = params(CubeFace::PosZ, DVec2::ZERO, 100.0, 0);
        assert_eq!(
            build_chunk_mesh(&zero_res, &Generators::new(), &mut mesh),
            Err(MeshError::InvalidResolution(0))
        );
        let zero_width = params(CubeFace::PosZ, DVec2::ZERO, 0.0, 4);
        assert!(build_chunk_mesh(&zero_width, &Generators::new(), &mut mesh).is_err());
    }

    #[test]
    fn test_flat_chunk_normals_match_up_on_every_face() {
        for face in CubeFace::ALL {
            for center in [DVec2::ZERO, DVec2::new(875.0, -875.0)] {
                let p = params(face, center, 250.0, 16);
                let mesh = build(&p, &Generators::new());
                let grid = p.grid_width();
                for gi in 1..grid - 1 {
                    for gj in 1..grid - 1 {
                        let up = p.grid_direction(gi as i64 - 1, gj as i64 - 1);
                        let n = mesh.normals[gi * grid + gj];
                        // Only sphere curvature across one cell separates
                        // the accumulated normal from `up` (under 1e-4 here).
                        assert!(
                            (n - up).length() < 1e-3,
                            "normal {n:?} vs up {up:?} at ({gi}, {gj}) on {face:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_world_normals_point_away_from_planet() {
        for face in CubeFace::ALL {
            let p = params(face, DVec2::new(-300.0, 600.0), 250.0, 8);
            let mesh = build(&p, &Generators::new());
            let rotation = p.model_matrix();
            let center = p.grid_width() / 2;
            let ix = center * p.grid_width() + center;
            let world_n = rotation.transform_vector3(mesh.normals[ix]);
            let world_p = mesh.world_position(ix, &p).unwrap();
            assert!(world_n.dot(world_p.normalize()) > 0.999, "inward normal on {face:?}");
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let p = params(CubeFace::NegY, DVec2::new(50.0, 50.0), 100.0, 12);
        let mesh = build(&p, &wavy());
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_skirt_vertices_hang_from_proxy_exactly() {
        for inverted in [false, true] {
            let p = ChunkParams {
                inverted,
                ..params(CubeFace::PosY, DVec2::new(-125.0, 375.0), 250.0, 6)
            };
            let mesh = build(&p, &wavy());
            let grid = p.grid_width();
            let offset = p.skirt_sign() * p.skirt_size();
            for gi in 0..grid {
                for gj in 0..grid {
                    if !is_skirt(gi, gj, grid) {
                        continue;
                    }
                    let (pi, pj) = (gi.clamp(1, grid - 2), gj.clamp(1, grid - 2));
                    let proxy = pi * grid + pj;
                    let up = p.grid_direction(pi as i64 - 1, pj as i64 - 1);
                    let expected = mesh.positions[proxy] + up * offset;
                    assert_eq!(mesh.positions[gi * grid + gj], expected, "skirt ({gi}, {gj})");
                    assert_eq!(mesh.normals[gi * grid + gj], mesh.normals[proxy]);
                }
            }
        }
    }

    #[test]
    fn test_edge_skirt_proxy_shares_row() {
        let p = params(CubeFace::PosZ, DVec2::ZERO, 200.0, 4);
        let mesh = build(&p, &Generators::new());
        let grid = p.grid_width();
        for gj in 1..grid - 1 {
            let skirt = mesh.positions[gj];
            let proxy = mesh.positions[grid + gj];
            let up = p.grid_direction(0, gj as i64 - 1);
            assert_eq!(skirt, proxy + up * (-p.skirt_size()));
        }
    }

    #[test]
    fn test_skirt_clamp_for_huge_chunk() {
        let p = params(CubeFace::PosZ, DVec2::ZERO, 10_000.0, 2);
        assert_eq!(p.skirt_size(), 200.0);
        let mesh = build(&p, &Generators::new());
        let grid = p.grid_width();
        let proxy = mesh.positions[grid + 1];
        let skirt = mesh.positions[1];
        assert!(((proxy - skirt).length() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_skirt_sits_below_surface() {
        let p = params(CubeFace::NegZ, DVec2::new(400.0, 0.0), 100.0, 8);
        let mesh = build(&p, &Generators::new());
        let grid = p.grid_width();
        let model = p.model_matrix();
        for gi in 0..grid {
            for gj in 0..grid {
                let r = model.transform_point3(mesh.positions[gi * grid + gj]).length();
                if is_skirt(gi, gj, grid) {
                    assert!((r - 900.0).abs() < 1e-6, "skirt radius {r}");
                } else {
                    assert!((r - 1000.0).abs() < 1e-6, "surface radius {r}");
                }
            }
        }
    }

    #[test]
    fn test_inverted_displaces_inward() {
        let raise = Generators::new().with_height(HeightFn(|_: DVec3, _: f64| 10.0));
        let p = ChunkParams {
            inverted: true,
            ..params(CubeFace::PosX, DVec2::ZERO, 100.0, 4)
        };
        let mesh = build(&p, &raise);
        let grid = p.grid_width();
        let center = (grid / 2) * grid + grid / 2;
        let r = mesh.world_position(center, &p).unwrap().length();
        assert!((r - 990.0).abs() < 1e-9);
        let skirt_r = mesh.world_position(0, &p).unwrap().length();
        assert!(skirt_r > r, "inverted skirt should hang outward");
    }

    #[test]
    fn test_generators_see_face_world_positions() {
        let outward_on_neg_x =
            Generators::new().with_height(HeightFn(|w: DVec3, _: f64| if w.x < 0.0 { 5.0 } else { -5.0 }));
        let p = params(CubeFace::NegX, DVec2::new(200.0, 200.0), 100.0, 4);
        let mesh = build(&p, &outward_on_neg_x);
        let grid = p.grid_width();
        for gi in 1..grid - 1 {
            for gj in 1..grid - 1 {
                let r = mesh.world_position(gi * grid + gj, &p).unwrap().length();
                assert!((r - 1005.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_invalid_generator_output_is_substituted() {
        let flaky = Generators::new()
            .with_height(HeightFn(|w: DVec3, _: f64| if w.x > 0.0 { f64::NAN } else { 3.0 }))
            .with_color(ColorFn(|_: DVec3, h: f64| {
                if h > 1.0 { Rgba::new(f32::NAN, 0.0, 0.0, 1.0) } else { Rgba::gray(0.5) }
            }));
        let p = params(CubeFace::PosZ, DVec2::ZERO, 100.0, 8);
        let mut mesh = ChunkMesh::new();
        let stats = build_chunk_mesh(&p, &flaky, &mut mesh).unwrap();
        assert!(stats.substituted_heights > 0);
        assert!(stats.substituted_colors > 0);
        assert_eq!(stats.substituted_heights + stats.substituted_colors, p.vertex_count());
        assert!(mesh.positions.iter().all(|v| v.is_finite()));
        assert!(mesh.normals.iter().all(|v| v.is_finite()));
        assert!(mesh.colors.iter().all(Rgba::is_finite));
    }

    #[test]
    fn test_rebuild_reuses_buffers() {
        let p = params(CubeFace::PosY, DVec2::new(-500.0, 500.0), 1000.0, 16);
        let mut mesh = ChunkMesh::new();
        build_chunk_mesh(&p, &wavy(), &mut mesh).unwrap();
        let first = mesh.clone();
        let capacity = mesh.positions.capacity();
        let smaller = ChunkParams {
            resolution: 4,
            ..p
        };
        build_chunk_mesh(&smaller, &wavy(), &mut mesh).unwrap();
        build_chunk_mesh(&p, &wavy(), &mut mesh).unwrap();
        assert_eq!(mesh.positions.capacity(), capacity);
        assert_eq!(mesh.positions, first.positions);
        assert_eq!(mesh.normals, first.normals);
        assert_eq!(mesh.indices, first.indices);
    }

    #[test]
    fn test_finer_skirt_covers_coarser_edge() {
        // Coarse covers x ∈ [-500, 0], y ∈ [0, 500]; fine covers
        // x ∈ [0, 250], y ∈ [250, 500]. They share x = 0 for y ∈ [250, 500].
        let coarse = params(CubeFace::PosZ, DVec2::new(-250.0, 250.0), 500.0, 8);
        let fine = params(CubeFace::PosZ, DVec2::new(125.0, 375.0), 250.0, 8);
        let generators = wavy();
        let coarse_mesh = build(&coarse, &generators);
        let fine_mesh = build(&fine, &generators);
        let grid = coarse.grid_width();

        // Coarse right edge (gi = R + 1) restricted to the shared span.
        let coarse_edge_min = (1..grid - 1)
            .map(|gj| (grid - 2) * grid + gj)
            .filter_map(|ix| coarse_mesh.world_position(ix, &coarse))
            .filter(|w| w.y / w.z >= 0.25 - 1e-12)
            .map(|w| w.length())
            .fold(f64::INFINITY, f64::min);
        // Fine left skirt (gi = 0).
        let fine_skirt: Vec<DVec3> = (0..grid)
            .filter_map(|gj| fine_mesh.world_position(gj, &fine))
            .collect();
        let fine_skirt_max = fine_skirt.iter().map(|w| w.length()).fold(0.0, f64::max);

        assert!(coarse_edge_min.is_finite());
        assert!(
            fine_skirt_max < coarse_edge_min,
            "skirt top {fine_skirt_max} above coarse edge {coarse_edge_min}"
        );
        // The skirt hangs directly below the shared edge.
        for w in &fine_skirt {
            assert!(w.x.abs() < 1e-9, "skirt drifted off the shared edge: {w:?}");
        }
    }
}
