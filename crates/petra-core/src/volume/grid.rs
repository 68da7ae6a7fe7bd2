//! Voxel index grid generation.

use burn::tensor::{backend::Backend, Tensor, TensorData};

/// All voxel indices of a `[Z, Y, X]` grid as an `[N, 3]` float tensor.
///
/// Columns are `(x, y, z)`. Rows are emitted with `x` fastest, matching the
/// flat layout of a `[Z, Y, X]` tensor, so values sampled at these rows can
/// be reshaped straight back to `[Z, Y, X]`.
pub fn index_grid<B: Backend>(dims: [usize; 3], device: &B::Device) -> Tensor<B, 2> {
    let [nz, ny, nx] = dims;
    let n = nx * ny * nz;
    let mut coords = Vec::with_capacity(n * 3);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                coords.push(x as f32);
                coords.push(y as f32);
                coords.push(z as f32);
            }
        }
    }
    Tensor::from_data(TensorData::new(coords, [n, 3]), device)
}
