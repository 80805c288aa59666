//! Lunar reference terrain.
//!
//! Layers, all sampled on the unit direction scaled by `frequency`:
//! a low-frequency maria mask splitting dark lowland plains from highlands,
//! four octaves of craters, wrinkle ridges inside the maria, and fine
//! roughness that differs between the two terrain types. The raw sum lies
//! roughly in `[-1.5, 1.5]` and is scaled by `radius × amplitude`.

use noise::{Fbm, MultiFractal, NoiseFn, Simplex};
use terra_math::DVec3;
use terra_mesh::HeightGenerator;

use crate::CraterField;

#[derive(Clone, Debug, PartialEq)]
pub struct MoonTerrainParams {
    pub seed: u32,
    /// Feature scale: larger values pack more features onto the sphere.
    pub frequency: f64,
    /// Peak relief as a fraction of the radius.
    pub amplitude: f64,
    /// Fraction of crater cells that hold a crater, in `[0, 1]`.
    pub crater_density: f64,
}

impl Default for MoonTerrainParams {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: 12.0,
            amplitude: 0.003,
            crater_density: 1.0,
        }
    }
}

/// Crater octave: cell scale, intensity, weight in the final sum.
const CRATER_OCTAVES: [(f64, f64, f64); 4] = [
    (0.15, 1.8, 1.0),
    (0.5, 1.2, 0.8),
    (2.0, 0.8, 0.6),
    (8.0, 0.4, 0.3),
];

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn get(noise: &impl NoiseFn<f64, 3>, p: DVec3) -> f64 {
    noise.get([p.x, p.y, p.z])
}

pub struct MoonTerrain {
    params: MoonTerrainParams,
    maria: Fbm<Simplex>,
    ridges: Simplex,
    highland_roughness: Fbm<Simplex>,
    maria_roughness: Fbm<Simplex>,
    regolith: Fbm<Simplex>,
    craters: [CraterField; 4],
}

impl MoonTerrain {
    pub fn new(params: MoonTerrainParams) -> Self {
        let seed = params.seed;
        let fbm = |offset: u32, octaves: usize, persistence: f64, lacunarity: f64, frequency: f64| {
            Fbm::<Simplex>::new(seed.wrapping_add(offset))
                .set_octaves(octaves)
                .set_persistence(persistence)
                .set_lacunarity(lacunarity)
                .set_frequency(frequency)
        };
        let craters = CRATER_OCTAVES.map(|(scale, intensity, _)| {
            // Distinct but reproducible seed per octave.
            let octave_seed = u64::from(seed) ^ scale.to_bits();
            CraterField::new(octave_seed, scale, intensity, params.crater_density)
        });

        Self {
            maria: fbm(1, 3, 0.5, 2.0, 0.08),
            ridges: Simplex::new(seed.wrapping_add(2)),
            highland_roughness: fbm(3, 3, 0.6, 2.0, 5.0),
            maria_roughness: fbm(4, 2, 0.3, 2.0, 15.0),
            regolith: fbm(5, 2, 0.2, 2.5, 30.0),
            craters,
            params,
        }
    }

    pub fn params(&self) -> &MoonTerrainParams {
        &self.params
    }

    /// 0 in highlands, 1 in maria.
    pub fn maria_amount(&self, direction: DVec3) -> f64 {
        self.maria_at(direction * self.params.frequency)
    }

    fn maria_at(&self, p: DVec3) -> f64 {
        let large = get(&self.maria, p);
        smoothstep(((large + 0.3) / 0.6).clamp(0.0, 1.0))
    }

    /// Compressional ridges: sharpened inverted absolute noise.
    fn wrinkle_ridges(&self, p: DVec3) -> f64 {
        let n1 = get(&self.ridges, p * 0.3).abs();
        let n2 = get(&self.ridges, p * 0.5 + DVec3::splat(100.0)).abs();
        let ridges = (1.0 - n1) * 0.6 + (1.0 - n2) * 0.4;
        ridges.clamp(0.0, 1.0).powf(2.5) * 0.15
    }

    /// Unscaled relief at a unit `direction`.
    pub fn sample(&self, direction: DVec3) -> f64 {
        let p = direction * self.params.frequency;
        let maria = self.maria_at(p);
        let highland = 1.0 - maria;

        let base = highland * 0.3 - maria * 0.3;

        let mut craters = 0.0;
        for (i, (field, &(_, _, weight))) in self.craters.iter().zip(&CRATER_OCTAVES).enumerate() {
            // Small craters are denser in the older highlands.
            let bias = match i {
                2 => 0.5 + highland * 0.5,
                3 => 0.3 + highland * 0.7,
                _ => 1.0,
            };
            craters += field.sample(p) * bias * weight;
        }

        let ridges = self.wrinkle_ridges(p) * maria;
        let highland_roughness = get(&self.highland_roughness, p) * 0.2 * highland;
        let maria_roughness = get(&self.maria_roughness, p) * 0.02 * maria;
        let regolith = get(&self.regolith, p) * 0.01;

        base + craters + ridges + highland_roughness + maria_roughness + regolith
    }

    /// Largest relief magnitude this terrain can produce, as a fraction of
    /// `radius × amplitude`.
    pub fn relief_bound() -> f64 {
        let craters: f64 = CRATER_OCTAVES
            .iter()
            .map(|&(_, intensity, weight)| 0.165 * intensity * weight)
            .sum();
        // base, ridges, noise layers (simplex fBm stays within ±2).
        0.3 + craters + 0.15 + 2.0 * (0.2 + 0.02 + 0.01)
    }
}

impl HeightGenerator for MoonTerrain {
    fn height(&self, world_position: DVec3, radius: f64) -> f64 {
        let direction = world_position.normalize_or_zero();
        radius * self.params.amplitude * self.sample(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fibonacci sphere: `count` evenly spread unit directions.
    fn directions(count: usize) -> Vec<DVec3> {
        let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        (0..count)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f64;
                DVec3::new(r * theta.cos(), y, r * theta.sin())
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_height() {
        let a = MoonTerrain::new(MoonTerrainParams::default());
        let b = MoonTerrain::new(MoonTerrainParams::default());
        for d in directions(32) {
            assert_eq!(a.sample(d), b.sample(d));
        }
    }

    #[test]
    fn test_seed_changes_terrain() {
        let a = MoonTerrain::new(MoonTerrainParams::default());
        let b = MoonTerrain::new(MoonTerrainParams {
            seed: 99,
            ..Default::default()
        });
        assert!(directions(64).into_iter().any(|d| a.sample(d) != b.sample(d)));
    }

    #[test]
    fn test_relief_within_bound() {
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        let bound = MoonTerrain::relief_bound();
        for d in directions(500) {
            let h = terrain.sample(d);
            assert!(h.is_finite());
            assert!(h.abs() <= bound, "relief {h} exceeds {bound}");
        }
    }

    #[test]
    fn test_height_scales_with_radius_and_amplitude() {
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        let d = DVec3::new(0.2, 0.9, -0.4).normalize();
        let raw = terrain.sample(d);
        let h = terrain.height(d * 1737.0, 1737.0);
        assert!((h - 1737.0 * 0.003 * raw).abs() < 1e-9);
    }

    #[test]
    fn test_height_depends_only_on_direction() {
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        let d = DVec3::new(-0.6, 0.1, 0.79).normalize();
        let near = terrain.height(d * 10.0, 500.0);
        let far = terrain.height(d * 500.0, 500.0);
        assert!((near - far).abs() < 1e-9);
    }

    #[test]
    fn test_maria_amount_in_unit_range() {
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        for d in directions(200) {
            let m = terrain.maria_amount(d);
            assert!((0.0..=1.0).contains(&m));
        }
    }

    #[test]
    fn test_no_craters_at_zero_density() {
        let cratered = MoonTerrain::new(MoonTerrainParams::default());
        let smooth = MoonTerrain::new(MoonTerrainParams {
            crater_density: 0.0,
            ..Default::default()
        });
        for (i, field) in smooth.craters.iter().enumerate() {
            assert_eq!(field.sample(DVec3::new(0.5, 0.5, 0.5) * i as f64), 0.0);
        }
        assert!(directions(64).into_iter().any(|d| cratered.sample(d) != smooth.sample(d)));
    }

    #[test]
    fn test_continuous_across_face_edge() {
        let terrain = MoonTerrain::new(MoonTerrainParams::default());
        // Straddles the +X / +Y cube edge.
        let a = DVec3::new(1.0, 1.0 - 1e-9, 0.3).normalize();
        let b = DVec3::new(1.0 - 1e-9, 1.0, 0.3).normalize();
        assert!((terrain.sample(a) - terrain.sample(b)).abs() < 1e-3);
    }
}
