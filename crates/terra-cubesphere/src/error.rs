//! LOD configuration errors.

/// Rejected quadtree parameters.
///
/// Every variant describes a configuration that would either split forever
/// or produce a degenerate tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    /// The split threshold must be finite and positive.
    #[error("split threshold must be finite and > 0, got {0}")]
    InvalidSplitThreshold(f64),

    /// The face half-extent (planet radius) must be finite and positive.
    #[error("face size must be finite and > 0, got {0}")]
    InvalidSize(f64),

    /// The finest node size must be positive and smaller than the face size.
    #[error("min node size must be in (0, {size}), got {min_node_size}")]
    InvalidMinNodeSize { min_node_size: f64, size: f64 },
}

/// Shared validation for [`Quadtree::new`](crate::Quadtree::new) and
/// [`CubicQuadtree::new`](crate::CubicQuadtree::new).
pub(crate) fn validate(size: f64, min_node_size: f64, split_threshold: f64) -> Result<(), LodError> {
    if !(split_threshold.is_finite() && split_threshold > 0.0) {
        return Err(LodError::InvalidSplitThreshold(split_threshold));
    }
    if !(size.is_finite() && size > 0.0) {
        return Err(LodError::InvalidSize(size));
    }
    if !(min_node_size > 0.0 && min_node_size < size) {
        return Err(LodError::InvalidMinNodeSize {
            min_node_size,
            size,
        });
    }
    Ok(())
}
