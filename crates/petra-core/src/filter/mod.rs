//! Volume filters.

pub mod resample;

pub use resample::ResampleVolumeFilter;
