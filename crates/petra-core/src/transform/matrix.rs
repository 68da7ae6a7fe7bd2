//! Plain numeric affine transform, the output of registration.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use super::trait_::SpatialTransform;
use crate::spatial::{Point, Point3, Vector, Vector3};

/// A fixed affine mapping `p' = M (p - c) + c + t` in f64.
///
/// This is the frozen form of an estimated transform: it carries no
/// parameters to optimize and can be applied on any backend, or to single
/// points on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixTransform {
    matrix: SMatrix<f64, 3, 3>,
    translation: Vector3,
    center: Point3,
}

impl MatrixTransform {
    pub fn new(matrix: SMatrix<f64, 3, 3>, translation: Vector3, center: Point3) -> Self {
        Self {
            matrix,
            translation,
            center,
        }
    }

    pub fn identity() -> Self {
        Self::new(SMatrix::identity(), Vector3::zeros(), Point3::origin())
    }

    pub fn matrix(&self) -> &SMatrix<f64, 3, 3> {
        &self.matrix
    }

    pub fn translation(&self) -> Vector3 {
        self.translation
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Apply the transform to a single world point.
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let centered = (p - self.center).0;
        Point(nalgebra::Point3::from(
            self.matrix * centered + self.center.0.coords + self.translation.0,
        ))
    }

    /// Inverse mapping, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        let inv = self.matrix.try_inverse()?;
        Some(Self {
            matrix: inv,
            translation: Vector(-(inv * self.translation.0)),
            center: self.center,
        })
    }
}

impl<B: Backend> SpatialTransform<B> for MatrixTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        // transpose of M, row-major
        let mut mt = Vec::with_capacity(9);
        for i in 0..3 {
            for j in 0..3 {
                mt.push(self.matrix[(j, i)] as f32);
            }
        }
        let m_t = Tensor::<B, 2>::from_data(TensorData::new(mt, [3, 3]), &device);

        let center_vals: Vec<f32> = self.center.coords().iter().map(|&v| v as f32).collect();
        let center = Tensor::<B, 2>::from_data(TensorData::new(center_vals, [1, 3]), &device);

        let shift_vals: Vec<f32> = (0..3)
            .map(|i| (self.center[i] + self.translation[i]) as f32)
            .collect();
        let shift = Tensor::<B, 2>::from_data(TensorData::new(shift_vals, [1, 3]), &device);

        (points - center).matmul(m_t) + shift
    }
}
