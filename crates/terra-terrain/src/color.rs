//! Vertex coloring by height.

use terra_math::DVec3;
use terra_mesh::{ColorGenerator, Rgba};

use crate::TerrainError;

/// Piecewise-linear color ramp over normalized height.
///
/// Heights are divided by `scale` before lookup; outside the first and last
/// stop the end colors are held.
#[derive(Clone, Debug, PartialEq)]
pub struct AltitudeColorRamp {
    stops: Vec<(f64, Rgba)>,
    scale: f64,
}

impl AltitudeColorRamp {
    pub fn new(stops: Vec<(f64, Rgba)>, scale: f64) -> Result<Self, TerrainError> {
        if stops.is_empty() {
            return Err(TerrainError::EmptyRamp);
        }
        for (index, pair) in stops.windows(2).enumerate() {
            if !(pair[0].0.is_finite() && pair[1].0.is_finite() && pair[0].0 < pair[1].0) {
                return Err(TerrainError::UnsortedRamp { index: index + 1 });
            }
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TerrainError::InvalidScale(scale));
        }
        Ok(Self { stops, scale })
    }

    /// Dark basaltic maria in the lowlands, bright anorthosite highlands.
    ///
    /// `relief` is the height of a normalized sample of 1, usually
    /// `radius × amplitude`.
    pub fn lunar(relief: f64) -> Result<Self, TerrainError> {
        Self::new(
            vec![
                (-1.5, Rgba::gray(0.16)),
                (-0.3, Rgba::new(0.27, 0.26, 0.25, 1.0)),
                (0.3, Rgba::new(0.55, 0.54, 0.52, 1.0)),
                (1.5, Rgba::gray(0.78)),
            ],
            relief,
        )
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Color at normalized height `t`.
    pub fn color_at(&self, t: f64) -> Rgba {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if !(t > first.0) {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        let upper = self.stops.partition_point(|&(h, _)| h <= t);
        let (h0, c0) = self.stops[upper - 1];
        let (h1, c1) = self.stops[upper];
        let f = ((t - h0) / (h1 - h0)) as f32;
        Rgba(std::array::from_fn(|i| c0.0[i] + (c1.0[i] - c0.0[i]) * f))
    }
}

impl ColorGenerator for AltitudeColorRamp {
    fn color(&self, _world_position: DVec3, height: f64) -> Rgba {
        self.color_at(height / self.scale)
    }
}
