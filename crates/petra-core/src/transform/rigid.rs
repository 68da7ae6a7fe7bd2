//! Rigid (Euler) transform with learnable rotation angles and translation.

use burn::module::{Module, Param};
use burn::tensor::{backend::Backend, Tensor, TensorData};

use super::trait_::SpatialTransform;

/// 3D rigid transform about a fixed centre of rotation.
///
/// Parameters are three Euler angles (radians, applied as `Rz * Ry * Rx`)
/// and a translation vector. The centre is part of the transform but is not
/// optimized. A point maps as
///
/// ```text
/// p' = R (p - c) + c + t
/// ```
#[derive(Module, Debug)]
pub struct RigidTransform<B: Backend> {
    pub angles: Param<Tensor<B, 1>>,
    pub translation: Param<Tensor<B, 1>>,
    pub center: Tensor<B, 1>,
}

impl<B: Backend> RigidTransform<B> {
    /// Identity rotation and zero translation about the world origin.
    pub fn identity(device: &B::Device) -> Self {
        Self::init([0.0; 3], [0.0; 3], device)
    }

    /// Identity rotation with the given translation and centre.
    pub fn init(translation: [f32; 3], center: [f32; 3], device: &B::Device) -> Self {
        Self {
            angles: Param::from_tensor(Tensor::zeros([3], device)),
            translation: Param::from_tensor(Tensor::from_data(
                TensorData::new(translation.to_vec(), [3]),
                device,
            )),
            center: Tensor::from_data(TensorData::new(center.to_vec(), [3]), device),
        }
    }

    /// The 3x3 rotation matrix `Rz * Ry * Rx` built from the current angles.
    ///
    /// Differentiable with respect to the angle parameters.
    pub fn rotation_matrix(&self) -> Tensor<B, 2> {
        let angles = self.angles.val();
        let ax = angles.clone().slice([0..1]);
        let ay = angles.clone().slice([1..2]);
        let az = angles.slice([2..3]);

        let (ca, sa) = (ax.clone().cos(), ax.sin());
        let (cb, sb) = (ay.clone().cos(), ay.sin());
        let (cg, sg) = (az.clone().cos(), az.sin());

        let r00 = cb.clone() * cg.clone();
        let r01 = sa.clone() * sb.clone() * cg.clone() - ca.clone() * sg.clone();
        let r02 = ca.clone() * sb.clone() * cg.clone() + sa.clone() * sg.clone();

        let r10 = cb.clone() * sg.clone();
        let r11 = sa.clone() * sb.clone() * sg.clone() + ca.clone() * cg.clone();
        let r12 = ca.clone() * sb.clone() * sg - sa.clone() * cg;

        let r20 = -sb;
        let r21 = sa * cb.clone();
        let r22 = ca * cb;

        let row0 = Tensor::cat(vec![r00, r01, r02], 0).reshape([1, 3]);
        let row1 = Tensor::cat(vec![r10, r11, r12], 0).reshape([1, 3]);
        let row2 = Tensor::cat(vec![r20, r21, r22], 0).reshape([1, 3]);
        Tensor::cat(vec![row0, row1, row2], 0)
    }
}

impl<B: Backend> SpatialTransform<B> for RigidTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let center = self.center.clone().reshape([1, 3]);
        let translation = self.translation.val().reshape([1, 3]);
        let rotation = self.rotation_matrix();

        let centered = points - center.clone();
        centered.matmul(rotation.transpose()) + center + translation
    }
}
