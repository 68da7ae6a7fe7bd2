pub mod error;
pub mod spatial;
pub mod volume;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use error::VolumeError;
pub use spatial::{Point, Vector, Spacing, Direction};
pub use volume::{Volume, Mask};
