//! Tracer-uptake quantification over registered PET volumes.
//!
//! Takes a registered PET volume plus target and reference masks, computes
//! NaN-aware region means, forms the SUVR ratio and maps it onto a
//! standardized scale (Centiloid or CenTauR) through a tracer calibration
//! table. [`pipeline`] wires these steps together with the registration
//! engine for a complete subject run.

pub mod calibration;
pub mod error;
pub mod pipeline;
pub mod quantify;
pub mod stats;

pub use calibration::{CalibrationEntry, CalibrationTable, TracerMode};
pub use error::QuantError;
pub use pipeline::{PipelineConfig, PipelineOutput, QuantificationPipeline};
pub use quantify::{quantify, QuantificationResult};
pub use stats::{region_mean, RegionStats};
