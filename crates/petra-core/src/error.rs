//! Error types for volume construction and geometry handling.

use thiserror::Error;

/// Errors raised when building or combining volumes.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("non-positive spacing {value} on axis {axis}")]
    NonPositiveSpacing { axis: usize, value: f64 },

    #[error("direction matrix is singular and cannot be inverted")]
    SingularDirection,

    #[error("voxel grid mismatch: expected {expected:?}, got {actual:?}")]
    GridMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("empty volume: every axis must have at least one voxel, got {dims:?}")]
    EmptyVolume { dims: [usize; 3] },
}
