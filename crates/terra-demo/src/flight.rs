//! Scripted camera path for the fly-through.

use terra_config::{FlightConfig, PlanetConfig};
use terra_math::DVec3;

/// Straight line through the planet center: descend toward the surface over
/// `frames` frames, then climb back out over as many again.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightPath {
    origin: DVec3,
    direction: DVec3,
    radius: f64,
    start_factor: f64,
    end_factor: f64,
    frames: u32,
}

impl FlightPath {
    pub fn new(
        origin: DVec3,
        direction: DVec3,
        radius: f64,
        start_factor: f64,
        end_factor: f64,
        frames: u32,
    ) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(DVec3::Z),
            radius,
            start_factor,
            end_factor,
            frames: frames.max(1),
        }
    }

    pub fn from_config(flight: &FlightConfig, planet: &PlanetConfig) -> Self {
        Self::new(
            DVec3::from_array(planet.origin),
            DVec3::from_array(flight.direction),
            planet.radius_m,
            flight.start_altitude_factor,
            flight.end_altitude_factor,
            flight.frames,
        )
    }

    /// Frames in the round trip, counting both ends.
    pub fn total_frames(&self) -> u32 {
        self.frames * 2 + 1
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Distance from the center in radii at `frame`.
    ///
    /// Altitude shrinks geometrically when both ends are above the surface,
    /// so the approach slows as detail grows.
    pub fn distance_factor(&self, frame: u32) -> f64 {
        let frame = frame.min(self.frames * 2);
        let leg = if frame <= self.frames { frame } else { self.frames * 2 - frame };
        let t = f64::from(leg) / f64::from(self.frames);

        let start = self.start_factor - 1.0;
        let end = self.end_factor - 1.0;
        if start > 0.0 && end > 0.0 {
            1.0 + start * (end / start).powf(t)
        } else {
            self.start_factor + (self.end_factor - self.start_factor) * t
        }
    }

    pub fn viewpoint(&self, frame: u32) -> DVec3 {
        self.origin + self.direction * (self.radius * self.distance_factor(frame))
    }
}
