//! Quantification error types.

use petra_core::error::VolumeError;
use petra_registration::RegistrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuantError {
    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("failed to read calibration table from {path}: {source}")]
    CalibrationIo {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed calibration table: {0}")]
    CalibrationFormat(#[from] serde_yaml::Error),
}
