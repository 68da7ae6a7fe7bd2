//! Trilinear interpolation.

use burn::tensor::{backend::Backend, Tensor};

use super::trait_::{gather_clamped, inside_mask, split_columns, Interpolator};

/// Trilinear interpolation over the eight surrounding voxels.
///
/// Differentiable with respect to the continuous indices: gradients flow
/// through the fractional corner weights, so this interpolator can sit
/// inside a registration loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(
        &self,
        data: &Tensor<B, 3>,
        indices: Tensor<B, 2>,
        fill_value: f32,
    ) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let (x, y, z) = split_columns(indices);

        let x0 = x.clone().floor();
        let y0 = y.clone().floor();
        let z0 = z.clone().floor();
        let fx = x.clone() - x0.clone();
        let fy = y.clone() - y0.clone();
        let fz = z.clone() - z0.clone();

        let wx1 = fx.clone();
        let wx0 = -fx + 1.0;
        let wy1 = fy.clone();
        let wy0 = -fy + 1.0;
        let wz1 = fz.clone();
        let wz0 = -fz + 1.0;

        let x1 = x0.clone() + 1.0;
        let y1 = y0.clone() + 1.0;
        let z1 = z0.clone() + 1.0;

        let c000 = gather_clamped(data, x0.clone(), y0.clone(), z0.clone());
        let c100 = gather_clamped(data, x1.clone(), y0.clone(), z0.clone());
        let c010 = gather_clamped(data, x0.clone(), y1.clone(), z0.clone());
        let c110 = gather_clamped(data, x1.clone(), y1.clone(), z0);
        let c001 = gather_clamped(data, x0.clone(), y0.clone(), z1.clone());
        let c101 = gather_clamped(data, x1.clone(), y0, z1.clone());
        let c011 = gather_clamped(data, x0, y1.clone(), z1.clone());
        let c111 = gather_clamped(data, x1, y1, z1);

        let value = c000 * wx0.clone() * wy0.clone() * wz0.clone()
            + c100 * wx1.clone() * wy0.clone() * wz0.clone()
            + c010 * wx0.clone() * wy1.clone() * wz0.clone()
            + c110 * wx1.clone() * wy1.clone() * wz0
            + c001 * wx0.clone() * wy0.clone() * wz1.clone()
            + c101 * wx1.clone() * wy0 * wz1.clone()
            + c011 * wx0 * wy1.clone() * wz1.clone()
            + c111 * wx1 * wy1 * wz1;

        // mask_fill rather than an arithmetic blend: a NaN border voxel
        // must not leak through the fill for out-of-support samples
        let hi = [(nx - 1) as f32, (ny - 1) as f32, (nz - 1) as f32];
        let inside = inside_mask(&x, &y, &z, 0.0, hi);
        value.mask_fill(inside.lower_elem(0.5), fill_value)
    }
}
