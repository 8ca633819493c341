/// Failures of the pure detection functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectError {
    /// The two frames do not share a width and height.
    #[error("frame dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    /// Sensitivity outside [0, 1], negative minimum box area, or a bad kernel size.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
