//! Storage adapters around the quantification core.
//!
//! Volumes travel as NIfTI-1 files; estimated transforms are persisted as
//! JSON sidecars next to the registered output for audit and replay.

pub mod nifti_io;
pub mod transform_io;

pub use nifti_io::{read_mask, read_volume, write_volume};
pub use transform_io::{load_transform, save_transform};
