//! Nearest-neighbour interpolation.

use burn::tensor::{backend::Backend, Tensor};

use super::trait_::{gather_clamped, inside_mask, split_columns, Interpolator};

/// Nearest-neighbour sampling.
///
/// Picks the value of the closest voxel, so label and mask volumes keep
/// their discrete values under resampling. A point counts as inside the
/// support while its rounded index stays on the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate(
        &self,
        data: &Tensor<B, 3>,
        indices: Tensor<B, 2>,
        fill_value: f32,
    ) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let (x, y, z) = split_columns(indices);

        let cx = (x.clone() + 0.5).floor();
        let cy = (y.clone() + 0.5).floor();
        let cz = (z.clone() + 0.5).floor();
        let value = gather_clamped(data, cx, cy, cz);

        let hi = [
            (nx as f32) - 0.5,
            (ny as f32) - 0.5,
            (nz as f32) - 0.5,
        ];
        let inside = inside_mask(&x, &y, &z, -0.5, hi);
        value.mask_fill(inside.lower_elem(0.5), fill_value)
    }
}
