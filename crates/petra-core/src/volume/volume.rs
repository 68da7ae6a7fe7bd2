//! Volume: a 3D scalar field anchored in physical space.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use nalgebra::SMatrix;

use crate::error::VolumeError;
use crate::spatial::{Direction3, Point, Point3, Spacing3};

/// A 3D volume of voxel intensities with physical-space geometry.
///
/// Voxel data is stored as a tensor of shape `[Z, Y, X]`, so axis `x` is the
/// fastest-varying. Geometry follows the factored affine convention: the
/// world position of voxel index `i = (x, y, z)` is
///
/// ```text
/// world(i) = origin + direction * (spacing .* i)
/// ```
///
/// Index coordinates are always given in `(x, y, z)` order; index axis `j`
/// corresponds to tensor dimension `2 - j`.
#[derive(Debug, Clone)]
pub struct Volume<B: Backend> {
    data: Tensor<B, 3>,
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
}

impl<B: Backend> Volume<B> {
    /// Create a volume from voxel data and geometry.
    ///
    /// Fails if any spacing component is not strictly positive, if the
    /// direction matrix is singular, or if any axis is empty.
    pub fn new(
        data: Tensor<B, 3>,
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Result<Self, VolumeError> {
        let dims = data.dims();
        if dims.iter().any(|&d| d == 0) {
            return Err(VolumeError::EmptyVolume { dims });
        }
        for axis in 0..3 {
            if spacing[axis] <= 0.0 || !spacing[axis].is_finite() {
                return Err(VolumeError::NonPositiveSpacing {
                    axis,
                    value: spacing[axis],
                });
            }
        }
        if direction.try_inverse().is_none() {
            return Err(VolumeError::SingularDirection);
        }
        Ok(Self {
            data,
            origin,
            spacing,
            direction,
        })
    }

    /// A volume with default geometry: origin zero, unit spacing, identity
    /// direction.
    pub fn from_tensor(data: Tensor<B, 3>) -> Result<Self, VolumeError> {
        Self::new(
            data,
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
        )
    }

    /// A new volume sharing this volume's geometry.
    ///
    /// Fails if `data` does not match this volume's voxel grid.
    pub fn like(&self, data: Tensor<B, 3>) -> Result<Self, VolumeError> {
        let expected = self.dims();
        let actual = data.dims();
        if expected != actual {
            return Err(VolumeError::GridMismatch { expected, actual });
        }
        Ok(Self {
            data,
            origin: self.origin,
            spacing: self.spacing,
            direction: self.direction,
        })
    }

    /// Voxel data, shape `[Z, Y, X]`.
    pub fn data(&self) -> &Tensor<B, 3> {
        &self.data
    }

    /// Consume the volume, returning its voxel data.
    pub fn into_data(self) -> Tensor<B, 3> {
        self.data
    }

    /// Tensor dimensions in storage order `[Z, Y, X]`.
    pub fn dims(&self) -> [usize; 3] {
        self.data.dims()
    }

    /// Grid size in index order `(x, y, z)`.
    pub fn size(&self) -> [usize; 3] {
        let [nz, ny, nx] = self.dims();
        [nx, ny, nz]
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn spacing(&self) -> Spacing3 {
        self.spacing
    }

    pub fn direction(&self) -> Direction3 {
        self.direction
    }

    pub fn device(&self) -> B::Device {
        self.data.device()
    }

    /// True when both volumes live on the same voxel grid with the same
    /// geometry, up to `tol` on origin, spacing and direction entries.
    pub fn same_grid(&self, other: &Self, tol: f64) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        let dp = (self.origin - other.origin).norm();
        let ds = (self.spacing - other.spacing).norm();
        let dd = (self.direction.inner() - other.direction.inner()).norm();
        dp <= tol && ds <= tol && dd <= tol
    }

    /// The matrix `A = direction * diag(spacing)` so that
    /// `world = A * index + origin`.
    pub fn world_matrix(&self) -> SMatrix<f64, 3, 3> {
        let mut m = *self.direction.inner();
        for j in 0..3 {
            let mut col = m.column_mut(j);
            col *= self.spacing[j];
        }
        m
    }

    /// Inverse of [`world_matrix`](Self::world_matrix).
    ///
    /// Always invertible for a constructed volume (spacing positive and
    /// direction non-singular are checked in `new`).
    pub fn index_matrix(&self) -> SMatrix<f64, 3, 3> {
        self.world_matrix()
            .try_inverse()
            .unwrap_or_else(SMatrix::identity)
    }

    /// Map a continuous voxel index `(x, y, z)` to a world point.
    pub fn index_to_world(&self, index: Point3) -> Point3 {
        let a = self.world_matrix();
        Point(nalgebra::Point3::from(a * index.0.coords + self.origin.0.coords))
    }

    /// Map a world point to a continuous voxel index `(x, y, z)`.
    pub fn world_to_index(&self, point: Point3) -> Point3 {
        let a = self.index_matrix();
        Point(nalgebra::Point3::from(a * (point - self.origin).0))
    }

    /// Map a batch of continuous voxel indices, shape `[N, 3]` with columns
    /// `(x, y, z)`, to world points.
    pub fn index_to_world_batch(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();
        let a_t = matrix_transpose_tensor::<B>(&self.world_matrix(), &device);
        let origin = row_tensor::<B>(self.origin.coords(), &device);
        indices.matmul(a_t) + origin
    }

    /// Map a batch of world points, shape `[N, 3]`, to continuous voxel
    /// indices with columns `(x, y, z)`.
    pub fn world_to_index_batch(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let a_t = matrix_transpose_tensor::<B>(&self.index_matrix(), &device);
        let origin = row_tensor::<B>(self.origin.coords(), &device);
        (points - origin).matmul(a_t)
    }

    /// World position of the grid's geometric centre, the continuous index
    /// `((nx-1)/2, (ny-1)/2, (nz-1)/2)`.
    pub fn geometric_center(&self) -> Point3 {
        let [nx, ny, nz] = self.size();
        let center_index = Point3::new([
            (nx as f64 - 1.0) / 2.0,
            (ny as f64 - 1.0) / 2.0,
            (nz as f64 - 1.0) / 2.0,
        ]);
        self.index_to_world(center_index)
    }

    /// Translate the geometry without touching voxel data.
    pub fn with_origin(mut self, origin: Point3) -> Self {
        self.origin = origin;
        self
    }
}

/// `[1, 3]` row tensor from f64 coordinates.
fn row_tensor<B: Backend>(coords: [f64; 3], device: &B::Device) -> Tensor<B, 2> {
    let vals: Vec<f32> = coords.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(vals, [1, 3]), device)
}

/// `[3, 3]` tensor holding the transpose of `m`.
fn matrix_transpose_tensor<B: Backend>(
    m: &SMatrix<f64, 3, 3>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut vals = Vec::with_capacity(9);
    for i in 0..3 {
        for j in 0..3 {
            vals.push(m[(j, i)] as f32);
        }
    }
    Tensor::from_data(TensorData::new(vals, [3, 3]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn device() -> <B as Backend>::Device {
        Default::default()
    }

    fn volume(dims: [usize; 3]) -> Volume<B> {
        let data = Tensor::<B, 3>::zeros(dims, &device());
        Volume::new(
            data,
            Point3::new([10.0, -5.0, 2.0]),
            Spacing3::new([2.0, 2.0, 3.0]),
            Direction3::identity(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let data = Tensor::<B, 3>::zeros([2, 2, 2], &device());
        let bad = Volume::new(
            data,
            Point3::origin(),
            Spacing3::new([1.0, 0.0, 1.0]),
            Direction3::identity(),
        );
        assert!(matches!(
            bad,
            Err(VolumeError::NonPositiveSpacing { axis: 1, .. })
        ));
    }

    #[test]
    fn test_index_world_round_trip() {
        let vol = volume([4, 5, 6]);
        let idx = Point3::new([1.0, 2.0, 3.0]);
        let world = vol.index_to_world(idx);
        assert_eq!(world[0], 10.0 + 2.0);
        assert_eq!(world[1], -5.0 + 4.0);
        assert_eq!(world[2], 2.0 + 9.0);

        let back = vol.world_to_index(world);
        assert!((back - idx).norm() < 1e-9);
    }

    #[test]
    fn test_batch_matches_scalar_path() {
        let vol = volume([3, 4, 5]);
        let idx = Point3::new([2.0, 1.0, 0.5]);
        let expected = vol.index_to_world(idx);

        let batch = Tensor::<B, 2>::from_data(
            TensorData::new(vec![2.0f32, 1.0, 0.5], [1, 3]),
            &device(),
        );
        let world = vol.index_to_world_batch(batch);
        let vals = world.to_data().to_vec::<f32>().unwrap();
        assert!((vals[0] as f64 - expected[0]).abs() < 1e-5);
        assert!((vals[1] as f64 - expected[1]).abs() < 1e-5);
        assert!((vals[2] as f64 - expected[2]).abs() < 1e-5);
    }

    #[test]
    fn test_geometric_center() {
        let vol = volume([3, 3, 3]);
        let c = vol.geometric_center();
        assert_eq!(c[0], 10.0 + 2.0);
        assert_eq!(c[1], -5.0 + 2.0);
        assert_eq!(c[2], 2.0 + 3.0);
    }

    #[test]
    fn test_same_grid() {
        let a = volume([3, 4, 5]);
        let b = volume([3, 4, 5]);
        let c = volume([3, 4, 4]);
        assert!(a.same_grid(&b, 1e-9));
        assert!(!a.same_grid(&c, 1e-9));
        let shifted = b.with_origin(Point3::new([10.0, -5.0, 2.5]));
        assert!(!a.same_grid(&shifted, 1e-3));
    }
}
