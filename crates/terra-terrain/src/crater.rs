//! Impact craters scattered by 3D cellular noise.
//!
//! Space is cut into unit cells (after scaling); each cell may hold one
//! crater whose center, radius and presence are derived from a hash of the
//! cell coordinates. Sampling on a sphere intersects those crater balls, so
//! the field has no seams between cube faces.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use terra_math::DVec3;

/// Height multiplier at `distance` crater radii from a crater's center.
///
/// Parabolic bowl out to 0.95, a raised rim peaking at 1.0, then a thin
/// ejecta apron fading out at 1.2.
pub fn crater_profile(distance: f64) -> f64 {
    if distance < 0.95 {
        let n = distance / 0.95;
        -(1.0 - n * n)
    } else if distance < 1.05 {
        let rim = (distance - 0.95) / 0.1;
        (rim * PI).sin() * 0.3
    } else if distance < 1.2 {
        (1.0 - (distance - 1.05) / 0.15) * 0.1
    } else {
        0.0
    }
}

/// Hash a cell coordinate with the field seed.
fn cell_hash(seed: u64, cell: (i64, i64, i64)) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    cell.hash(&mut hasher);
    hasher.finish()
}

/// `lane`-th 12-bit slice of `hash` as a value in `[0, 1]`.
fn unit(hash: u64, lane: u32) -> f64 {
    ((hash >> (lane * 12)) & 0xFFF) as f64 / 4095.0
}

/// One octave of craters.
#[derive(Clone, Debug, PartialEq)]
pub struct CraterField {
    seed: u64,
    /// Cells per unit of input space.
    scale: f64,
    intensity: f64,
    /// Fraction of cells holding a crater.
    density: f64,
}

impl CraterField {
    pub fn new(seed: u64, scale: f64, intensity: f64, density: f64) -> Self {
        Self {
            seed,
            scale,
            intensity,
            density: density.clamp(0.0, 1.0),
        }
    }

    /// Relief at `point`: negative in bowls, positive on rims.
    pub fn sample(&self, point: DVec3) -> f64 {
        let q = point * self.scale;
        let base = q.floor();

        let mut nearest = f64::INFINITY;
        let mut crater_size = 0.0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let cell = base + DVec3::new(f64::from(dx), f64::from(dy), f64::from(dz));
                    let hash = cell_hash(self.seed, (cell.x as i64, cell.y as i64, cell.z as i64));
                    if unit(hash, 4) >= self.density {
                        continue;
                    }
                    let site = cell + DVec3::new(unit(hash, 0), unit(hash, 1), unit(hash, 2));
                    let distance = q.distance(site);
                    if distance < nearest {
                        nearest = distance;
                        crater_size = 0.3 + unit(hash, 3) * 0.4;
                    }
                }
            }
        }
        if !nearest.is_finite() {
            return 0.0;
        }

        // Larger craters are proportionally shallower.
        let depth_ratio = 0.18 - crater_size * 0.05;
        crater_profile(nearest / crater_size) * depth_ratio * self.intensity
    }
}
