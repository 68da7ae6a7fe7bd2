//! Intensity-based registration of one volume onto another.
//!
//! The driver samples a random subset of fixed-volume voxels each
//! iteration, maps them through the current transform, interpolates the
//! moving volume and scores the pairing with negative mutual information.
//! Gradients of the score with respect to the transform parameters drive
//! plain gradient descent.

pub mod engine;
pub mod error;
pub mod metric;
pub mod optimizer;
pub mod registration;
pub mod sampling;

pub use engine::{
    EstimatedTransform, RegistrationConfig, RegistrationEngine, RegistrationMode,
    RegistrationOutcome, TransformParameters,
};
pub use error::RegistrationError;
pub use metric::MutualInformationMetric;
pub use registration::{optimize, OptimizationReport, StageOptions};
pub use sampling::VoxelSampler;
