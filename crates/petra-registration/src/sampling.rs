//! Stochastic voxel sampling for the metric evaluation.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::RegistrationError;

/// Draws a random subset of voxel indices each iteration.
///
/// The generator is re-seeded from `seed` and the iteration number, so a
/// run with the same inputs and configuration is fully reproducible.
#[derive(Debug, Clone)]
pub struct VoxelSampler {
    fraction: f64,
    seed: u64,
}

impl VoxelSampler {
    pub fn new(fraction: f64, seed: u64) -> Result<Self, RegistrationError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(RegistrationError::InvalidSamplingFraction(fraction));
        }
        Ok(Self { fraction, seed })
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Distinct voxel indices for one metric evaluation.
    ///
    /// At least one index is always returned.
    pub fn sample(&self, total: usize, iteration: usize) -> Vec<i64> {
        let amount = ((total as f64 * self.fraction) as usize).clamp(1, total);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(iteration as u64));
        rand::seq::index::sample(&mut rng, total, amount)
            .into_iter()
            .map(|i| i as i64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_fraction() {
        assert!(VoxelSampler::new(0.0, 1).is_err());
        assert!(VoxelSampler::new(1.5, 1).is_err());
        assert!(VoxelSampler::new(0.2, 1).is_ok());
    }

    #[test]
    fn test_sample_size_and_bounds() {
        let sampler = VoxelSampler::new(0.2, 1234).unwrap();
        let idx = sampler.sample(1000, 0);
        assert_eq!(idx.len(), 200);
        assert!(idx.iter().all(|&i| i >= 0 && i < 1000));
    }

    #[test]
    fn test_reproducible_per_iteration() {
        let sampler = VoxelSampler::new(0.5, 42).unwrap();
        assert_eq!(sampler.sample(100, 3), sampler.sample(100, 3));
        assert_ne!(sampler.sample(100, 3), sampler.sample(100, 4));
    }

    #[test]
    fn test_tiny_volume_still_samples() {
        let sampler = VoxelSampler::new(0.01, 7).unwrap();
        assert_eq!(sampler.sample(3, 0).len(), 1);
    }
}
