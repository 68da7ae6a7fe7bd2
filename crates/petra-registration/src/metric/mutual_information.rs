//! Mattes-style mutual information with Parzen soft histograms.

use burn::tensor::{backend::Backend, Tensor, TensorData};

use super::trait_::SimilarityMetric;
use crate::error::RegistrationError;

const EPS: f32 = 1e-10;

/// Negative mutual information between two intensity samples.
///
/// Each sample is min-max normalized to `[0, 1]` and soft-assigned to a
/// fixed set of histogram bins with a Gaussian kernel one bin wide. The
/// joint histogram is the matrix product of the two assignment matrices,
/// which keeps the whole score differentiable. The returned loss is
/// `-MI = H(F, M) - H(F) - H(M)`, so descending on it increases the
/// information shared by the two volumes.
#[derive(Debug, Clone)]
pub struct MutualInformationMetric {
    num_bins: usize,
}

impl MutualInformationMetric {
    /// Default bin count for PET-to-template alignment.
    pub const DEFAULT_BINS: usize = 32;

    pub fn new(num_bins: usize) -> Result<Self, RegistrationError> {
        if num_bins < 2 {
            return Err(RegistrationError::TooFewBins(num_bins));
        }
        Ok(Self { num_bins })
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Min-max normalize to `[0, 1]`.
    ///
    /// The extrema are detached: they act as a fixed rescaling, not as a
    /// path for gradients.
    fn normalize<B: Backend>(values: Tensor<B, 1>) -> Tensor<B, 1> {
        let min = values.clone().min().detach().reshape([1]);
        let max = values.clone().max().detach().reshape([1]);
        let range = max - min.clone() + EPS;
        (values - min) / range
    }

    /// Soft bin assignments, shape `[N, bins]`, rows summing to one.
    fn soft_assignments<B: Backend>(&self, values: Tensor<B, 1>) -> Tensor<B, 2> {
        let n = values.dims()[0];
        let bins = self.num_bins;
        let device = values.device();

        let centers: Vec<f32> = (0..bins)
            .map(|k| k as f32 / (bins as f32 - 1.0))
            .collect();
        let centers = Tensor::<B, 2>::from_data(TensorData::new(centers, [1, bins]), &device);

        let sigma = 1.0 / (bins as f32 - 1.0);
        let d = (values.reshape([n, 1]) - centers) / sigma;
        let w = (d.clone() * d * (-0.5)).exp();
        let row_sums = w.clone().sum_dim(1) + EPS;
        w / row_sums
    }
}

impl<B: Backend> SimilarityMetric<B> for MutualInformationMetric {
    fn forward(&self, fixed: Tensor<B, 1>, moving: Tensor<B, 1>) -> Tensor<B, 1> {
        let n = fixed.dims()[0];

        let wf = self.soft_assignments(Self::normalize(fixed));
        let wm = self.soft_assignments(Self::normalize(moving));

        // joint probability table, [bins, bins]
        let joint = wf.transpose().matmul(wm) / (n as f32);
        let pf = joint.clone().sum_dim(1);
        let pm = joint.clone().sum_dim(0);

        let log_joint = (joint.clone() + EPS).log();
        let log_pf = (pf + EPS).log();
        let log_pm = (pm + EPS).log();

        let mi = (joint * (log_joint - log_pf - log_pm)).sum();
        -mi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type B = NdArray<f32>;

    fn tensor(vals: Vec<f32>) -> Tensor<B, 1> {
        let n = vals.len();
        Tensor::from_data(TensorData::new(vals, [n]), &Default::default())
    }

    fn score(fixed: Vec<f32>, moving: Vec<f32>) -> f64 {
        let metric = MutualInformationMetric::new(32).unwrap();
        metric
            .forward(tensor(fixed), tensor(moving))
            .into_scalar()
            .elem::<f64>()
    }

    #[test]
    fn test_rejects_degenerate_bins() {
        assert!(MutualInformationMetric::new(1).is_err());
        assert!(MutualInformationMetric::new(2).is_ok());
    }

    #[test]
    fn test_identical_signals_score_better_than_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let a: Vec<f32> = (0..512).map(|_| rng.gen_range(0.0..1.0)).collect();
        let b: Vec<f32> = (0..512).map(|_| rng.gen_range(0.0..1.0)).collect();

        let matched = score(a.clone(), a.clone());
        let mismatched = score(a, b);
        assert!(
            matched < mismatched,
            "matched {matched} should beat mismatched {mismatched}"
        );
    }

    #[test]
    fn test_invariant_to_affine_intensity_rescaling() {
        let mut rng = StdRng::seed_from_u64(11);
        let a: Vec<f32> = (0..512).map(|_| rng.gen_range(0.0..1.0)).collect();
        let rescaled: Vec<f32> = a.iter().map(|v| v * 250.0 + 40.0).collect();

        let plain = score(a.clone(), a.clone());
        let scaled = score(a, rescaled);
        assert!((plain - scaled).abs() < 1e-4);
    }

    #[test]
    fn test_loss_is_finite_for_constant_input() {
        let s = score(vec![0.5; 64], vec![0.5; 64]);
        assert!(s.is_finite());
    }
}
