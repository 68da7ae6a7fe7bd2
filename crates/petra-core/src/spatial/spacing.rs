//! Spacing type for physical distances between voxel centres.

use super::Vector;

/// Physical distance between adjacent voxels along each axis, in mm.
///
/// A type alias to Vector for semantic clarity.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Uniform spacing along every axis.
    pub fn uniform(value: f64) -> Self {
        Self::new([value; D])
    }
}
