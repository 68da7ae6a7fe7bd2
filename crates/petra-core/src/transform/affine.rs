//! Affine transform with a learnable 3x3 matrix and translation.

use burn::module::{Module, Param};
use burn::tensor::{backend::Backend, Tensor, TensorData};

use super::rigid::RigidTransform;
use super::trait_::SpatialTransform;

/// 3D affine transform about a fixed centre.
///
/// A point maps as `p' = M (p - c) + c + t`. The full matrix is optimized,
/// covering rotation, scaling and shear.
#[derive(Module, Debug)]
pub struct AffineTransform<B: Backend> {
    pub matrix: Param<Tensor<B, 2>>,
    pub translation: Param<Tensor<B, 1>>,
    pub center: Tensor<B, 1>,
}

impl<B: Backend> AffineTransform<B> {
    /// Identity matrix with the given translation and centre.
    pub fn init(translation: [f32; 3], center: [f32; 3], device: &B::Device) -> Self {
        Self {
            matrix: Param::from_tensor(identity_matrix(device)),
            translation: Param::from_tensor(Tensor::from_data(
                TensorData::new(translation.to_vec(), [3]),
                device,
            )),
            center: Tensor::from_data(TensorData::new(center.to_vec(), [3]), device),
        }
    }

    /// Seed an affine transform from a converged rigid stage.
    ///
    /// The rigid rotation and translation become the starting point, cut
    /// loose from the rigid stage's autodiff graph.
    pub fn from_rigid(rigid: &RigidTransform<B>) -> Self {
        Self {
            matrix: Param::from_tensor(rigid.rotation_matrix().detach()),
            translation: Param::from_tensor(rigid.translation.val().detach()),
            center: rigid.center.clone().detach(),
        }
    }
}

fn identity_matrix<B: Backend>(device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(
        TensorData::new(
            vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            [3, 3],
        ),
        device,
    )
}

impl<B: Backend> SpatialTransform<B> for AffineTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let center = self.center.clone().reshape([1, 3]);
        let translation = self.translation.val().reshape([1, 3]);
        let matrix = self.matrix.val();

        let centered = points - center.clone();
        centered.matmul(matrix.transpose()) + center + translation
    }
}
