//! Mesh generation errors.

use crate::params::MAX_RESOLUTION;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("resolution must be in 1..={MAX_RESOLUTION}, got {0}")]
    InvalidResolution(u32),

    #[error("chunk width must be finite and > 0, got {0}")]
    InvalidWidth(f64),

    #[error("planet radius must be finite and > 0, got {0}")]
    InvalidRadius(f64),

    /// A triangle referenced a vertex outside the grid. Indicates a grid
    /// sizing bug, never bad input.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}
