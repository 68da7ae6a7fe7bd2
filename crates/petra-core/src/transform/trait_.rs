//! Transform trait.

use burn::tensor::{backend::Backend, Tensor};

/// A mapping from world points to world points.
///
/// Points are `[N, 3]` tensors with columns `(x, y, z)` in millimetres.
/// Following the resampling convention, a transform estimated between a
/// fixed and a moving volume maps fixed-space points into moving space.
pub trait SpatialTransform<B: Backend> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
