//! Height and color generator contracts.
//!
//! Generators are called once per vertex, possibly from mesh worker threads,
//! so they must be `Send + Sync` and deterministic for a given input.

use std::fmt;
use std::sync::Arc;

use terra_math::DVec3;

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Opaque gray of the given intensity.
    pub const fn gray(v: f32) -> Self {
        Self([v, v, v, 1.0])
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Components clamped into `[0, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self(self.0.map(|c| c.clamp(0.0, 1.0)))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Terrain height above the idealized sphere.
pub trait HeightGenerator: Send + Sync {
    /// `world_position` is the vertex on the undisplaced sphere, relative to
    /// the planet center.
    fn height(&self, world_position: DVec3, radius: f64) -> f64;
}

/// Vertex color for a displaced surface point.
pub trait ColorGenerator: Send + Sync {
    fn color(&self, world_position: DVec3, height: f64) -> Rgba;
}

/// Adapts a closure into a [`HeightGenerator`].
pub struct HeightFn<F>(pub F);

impl<F> HeightGenerator for HeightFn<F>
where
    F: Fn(DVec3, f64) -> f64 + Send + Sync,
{
    fn height(&self, world_position: DVec3, radius: f64) -> f64 {
        (self.0)(world_position, radius)
    }
}

/// Adapts a closure into a [`ColorGenerator`].
pub struct ColorFn<F>(pub F);

impl<F> ColorGenerator for ColorFn<F>
where
    F: Fn(DVec3, f64) -> Rgba + Send + Sync,
{
    fn color(&self, world_position: DVec3, height: f64) -> Rgba {
        (self.0)(world_position, height)
    }
}

/// The pair of optional generators a planet meshes with.
///
/// A missing height generator yields a perfect sphere; a missing color
/// generator yields opaque white.
#[derive(Clone, Default)]
pub struct Generators {
    pub height: Option<Arc<dyn HeightGenerator>>,
    pub color: Option<Arc<dyn ColorGenerator>>,
}

impl Generators {
    /// No generators: flat white sphere.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_height(mut self, generator: impl HeightGenerator + 'static) -> Self {
        self.height = Some(Arc::new(generator));
        self
    }

    pub fn with_color(mut self, generator: impl ColorGenerator + 'static) -> Self {
        self.color = Some(Arc::new(generator));
        self
    }

    /// Height at `world_position`, or `None` if the generator returned a
    /// non-finite value. Absent generator → `Some(0.0)`.
    pub fn sample_height(&self, world_position: DVec3, radius: f64) -> Option<f64> {
        match &self.height {
            Some(generator) => {
                let h = generator.height(world_position, radius);
                h.is_finite().then_some(h)
            }
            None => Some(0.0),
        }
    }

    /// Color at `world_position`, clamped into `[0, 1]`, or `None` if any
    /// component was non-finite. Absent generator → `Some(WHITE)`.
    pub fn sample_color(&self, world_position: DVec3, height: f64) -> Option<Rgba> {
        match &self.color {
            Some(generator) => {
                let c = generator.color(world_position, height);
                c.is_finite().then(|| c.clamped())
            }
            None => Some(Rgba::WHITE),
        }
    }
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generators")
            .field("height", &self.height.is_some())
            .field("color", &self.color.is_some())
            .finish()
    }
}
