//! Volumetric image model: voxel data plus physical-space geometry.

pub mod grid;
pub mod mask;
pub mod volume;

pub use grid::index_grid;
pub use mask::Mask;
pub use volume::Volume;
