//! Resampling of one volume onto another volume's grid.

use burn::tensor::backend::Backend;

use crate::error::VolumeError;
use crate::interpolation::Interpolator;
use crate::transform::SpatialTransform;
use crate::volume::{index_grid, Volume};

/// Resamples a moving volume onto a reference grid through a transform.
///
/// For every voxel of the reference grid: map its index to a reference
/// world point, push that point through the transform into moving space,
/// convert to a continuous moving index and interpolate. Voxels that land
/// outside the moving volume's support receive `fill_value`.
#[derive(Debug, Clone)]
pub struct ResampleVolumeFilter<I> {
    interpolator: I,
    fill_value: f32,
}

impl<I> ResampleVolumeFilter<I> {
    pub fn new(interpolator: I, fill_value: f32) -> Self {
        Self {
            interpolator,
            fill_value,
        }
    }

    /// Resample `moving` onto the grid and geometry of `reference`.
    pub fn resample<B, T>(
        &self,
        moving: &Volume<B>,
        reference: &Volume<B>,
        transform: &T,
    ) -> Result<Volume<B>, VolumeError>
    where
        B: Backend,
        I: Interpolator<B>,
        T: SpatialTransform<B>,
    {
        let device = moving.device();
        let dims = reference.dims();

        let grid = index_grid::<B>(dims, &device);
        let world = reference.index_to_world_batch(grid);
        let mapped = transform.transform_points(world);
        let moving_indices = moving.world_to_index_batch(mapped);

        let values = self
            .interpolator
            .interpolate(moving.data(), moving_indices, self.fill_value);

        let [nz, ny, nx] = dims;
        reference.like(values.reshape([nz, ny, nx]))
    }
}
