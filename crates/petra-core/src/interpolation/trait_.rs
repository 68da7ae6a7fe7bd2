//! Interpolator trait.

use burn::tensor::{backend::Backend, Tensor};

/// Samples a `[Z, Y, X]` volume at continuous voxel indices.
///
/// `indices` is `[N, 3]` with columns `(x, y, z)`. Points outside the
/// volume's support evaluate to `fill_value`.
pub trait Interpolator<B: Backend> {
    fn interpolate(
        &self,
        data: &Tensor<B, 3>,
        indices: Tensor<B, 2>,
        fill_value: f32,
    ) -> Tensor<B, 1>;
}

/// Split an `[N, 3]` index tensor into its `(x, y, z)` columns.
pub(crate) fn split_columns<B: Backend>(
    indices: Tensor<B, 2>,
) -> (Tensor<B, 1>, Tensor<B, 1>, Tensor<B, 1>) {
    let n = indices.dims()[0];
    let x = indices.clone().slice([0..n, 0..1]).reshape([n]);
    let y = indices.clone().slice([0..n, 1..2]).reshape([n]);
    let z = indices.slice([0..n, 2..3]).reshape([n]);
    (x, y, z)
}

/// Gather voxel values at integer coordinates, clamping to the grid.
///
/// Coordinates are float tensors holding integral values; clamping keeps
/// the flat index valid so the caller can mask out-of-support rows
/// afterwards.
pub(crate) fn gather_clamped<B: Backend>(
    data: &Tensor<B, 3>,
    cx: Tensor<B, 1>,
    cy: Tensor<B, 1>,
    cz: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let [nz, ny, nx] = data.dims();
    let ix = cx.clamp(0.0, (nx - 1) as f32).int();
    let iy = cy.clamp(0.0, (ny - 1) as f32).int();
    let iz = cz.clamp(0.0, (nz - 1) as f32).int();
    let flat = iz * ((ny * nx) as i32) + iy * (nx as i32) + ix;
    data.clone().reshape([nz * ny * nx]).select(0, flat)
}

/// 1.0 where the continuous index lies within `[lo, hi]` on every axis,
/// 0.0 elsewhere.
pub(crate) fn inside_mask<B: Backend>(
    x: &Tensor<B, 1>,
    y: &Tensor<B, 1>,
    z: &Tensor<B, 1>,
    lo: f32,
    hi: [f32; 3],
) -> Tensor<B, 1> {
    let in_x = x.clone().greater_equal_elem(lo).float() * x.clone().lower_equal_elem(hi[0]).float();
    let in_y = y.clone().greater_equal_elem(lo).float() * y.clone().lower_equal_elem(hi[1]).float();
    let in_z = z.clone().greater_equal_elem(lo).float() * z.clone().lower_equal_elem(hi[2]).float();
    in_x * in_y * in_z
}
