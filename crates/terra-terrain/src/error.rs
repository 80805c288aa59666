/// Rejected terrain generator settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    #[error("a color ramp needs at least one stop")]
    EmptyRamp,

    #[error("color ramp stops must be finite and strictly increasing (stop {index})")]
    UnsortedRamp { index: usize },

    #[error("height scale must be finite and > 0, got {0}")]
    InvalidScale(f64),
}
