//! Registration error types.

use petra_core::error::VolumeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("sampling fraction must lie in (0, 1], got {0}")]
    InvalidSamplingFraction(f64),

    #[error("mutual information needs at least 2 histogram bins, got {0}")]
    TooFewBins(usize),

    #[error("iteration budget must be positive")]
    NoIterations,

    #[error("learning rate must be finite and positive, got {0}")]
    InvalidLearningRate(f64),

    #[error("unknown registration mode {0:?}, expected \"rigid\" or \"affine\"")]
    InvalidMode(String),

    #[error("loss became non-finite at iteration {iteration}")]
    NonFiniteLoss { iteration: usize },
}
