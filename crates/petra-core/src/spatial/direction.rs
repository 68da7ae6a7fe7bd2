//! Direction type for volume axis orientation.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};
use super::Vector;

/// Direction cosine matrix of a volume's axes.
///
/// Column `j` is the unit vector, in world space, along which voxel index
/// `j` increases. All orientation handling (including any RAS/LPS
/// conversions done by collaborators) is derived from this matrix; no axis
/// order is ever assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Identity orientation (axis-aligned volume).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build from an nalgebra matrix.
    pub fn from_matrix(m: SMatrix<f64, D, D>) -> Self {
        Self(m)
    }

    /// Inverse, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Access the underlying nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

// determinant wants concrete-dimension trait bounds, so it is provided
// per dimension rather than on the generic impl
impl Direction<2> {
    /// Matrix determinant.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }
}

impl Direction<3> {
    /// Matrix determinant.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul for Direction<D> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, rhs: Vector<D>) -> Self::Output {
        Vector(self.0 * rhs.0)
    }
}
