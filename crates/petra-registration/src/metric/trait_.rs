//! Metric trait.

use burn::tensor::{backend::Backend, Tensor};

/// Scores how well two sets of paired intensity samples agree.
///
/// Both inputs are `[N]` tensors holding intensities sampled at the same
/// world points, one from the fixed volume and one from the transformed
/// moving volume. The result is a single-element loss tensor; lower is
/// better, and gradients flow back through `moving` into the transform
/// parameters.
pub trait SimilarityMetric<B: Backend> {
    fn forward(&self, fixed: Tensor<B, 1>, moving: Tensor<B, 1>) -> Tensor<B, 1>;
}
