//! Fixed parameters of a planet.

use terra_cubesphere::CubicQuadtree;
use terra_math::DVec3;
use terra_mesh::{MAX_RESOLUTION, MeshError};

use crate::PlanetError;

/// Split when the viewpoint is closer than `1.25 × half_size` to a node.
pub const DEFAULT_SPLIT_THRESHOLD: f64 = 1.25;

/// Ratio of radius to finest node size above which `f32` vertex positions
/// start to visibly jitter.
pub(crate) const PRECISION_WARNING_RATIO: f64 = 50_000.0;

/// The six face roots must always fit.
const MIN_MAX_CHUNKS: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct PlanetParams {
    pub radius: f64,
    /// Nodes at or below this half-extent never split.
    pub min_node_size: f64,
    /// Interior grid cells per chunk edge.
    pub resolution: u32,
    /// Planet center in world space.
    pub origin: DVec3,
    pub split_threshold: f64,
    /// Viewed from inside: heights and skirts point toward the center.
    pub inverted: bool,
    /// Mesh worker threads; 0 generates inline during `update`.
    pub worker_threads: usize,
    /// Maximum chunks queued or generating on workers at once.
    pub queue_budget: usize,
    /// Resident chunk cap. Past it, the farthest detail is drawn one or more
    /// levels coarser.
    pub max_chunks: Option<usize>,
    /// Retired chunks kept for reuse.
    pub pool_capacity: usize,
}

impl PlanetParams {
    pub fn new(
        radius: f64,
        min_node_size: f64,
        resolution: u32,
        origin: DVec3,
        split_threshold: f64,
    ) -> Self {
        Self {
            radius,
            min_node_size,
            resolution,
            origin,
            split_threshold,
            ..Self::default()
        }
    }

    /// Generate on `threads` background workers (0 = inline).
    pub fn with_workers(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: Option<usize>) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Reject parameters that would split forever or mesh nothing.
    pub fn validate(&self) -> Result<(), PlanetError> {
        CubicQuadtree::new(self.radius, self.min_node_size, self.split_threshold, self.origin)?;
        if self.resolution < 1 || self.resolution > MAX_RESOLUTION {
            return Err(MeshError::InvalidResolution(self.resolution).into());
        }
        if !self.origin.is_finite() {
            return Err(PlanetError::InvalidOrigin(self.origin));
        }
        if let Some(max) = self.max_chunks
            && max < MIN_MAX_CHUNKS
        {
            return Err(PlanetError::InvalidMaxChunks(max));
        }
        if self.worker_threads > 0 && self.queue_budget == 0 {
            return Err(PlanetError::InvalidQueueBudget);
        }
        Ok(())
    }

    /// Radius over finest node size.
    #[must_use]
    pub fn precision_ratio(&self) -> f64 {
        self.radius / self.min_node_size
    }

    /// Leaf count if every face were refined down to the finest level.
    #[must_use]
    pub fn estimated_max_chunks(&self) -> f64 {
        let levels = self.precision_ratio().log2().floor().max(0.0);
        6.0 * 4f64.powf(levels)
    }

    /// Triangles drawn per chunk, skirt excluded.
    #[must_use]
    pub fn triangles_per_chunk(&self) -> usize {
        let r = self.resolution as usize;
        r * r * 2
    }
}

impl Default for PlanetParams {
    fn default() -> Self {
        Self {
            radius: 1000.0,
            min_node_size: 50.0,
            resolution: 16,
            origin: DVec3::ZERO,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            inverted: false,
            worker_threads: 0,
            queue_budget: 64,
            max_chunks: None,
            pool_capacity: 256,
        }
    }
}
