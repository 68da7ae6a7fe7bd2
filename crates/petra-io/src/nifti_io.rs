//! NIfTI-1 volume reading and writing.

use std::path::Path;

use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::SMatrix;
use ndarray::{Array3, Axis};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use tracing::debug;

use petra_core::spatial::{Direction, Point, Spacing, Vector};
use petra_core::volume::{Mask, Volume};

/// Read a 3D NIfTI file into a volume.
///
/// Geometry comes from the sform when present, the qform otherwise, and
/// plain pixdim scaling as a last resort. The voxel tensor is permuted
/// from NIfTI's `[X, Y, Z]` storage to the `[Z, Y, X]` convention used by
/// the volume model.
pub fn read_volume<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Volume<B>> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI file {}", path.display()))?;
    let header = obj.header();
    let affine = affine_from_header(header);

    let origin = Point::new([affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]]);
    let (spacing, direction) = decompose_affine(&affine);

    let mut array = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("failed to decode NIfTI voxel data")?;
    if array.ndim() == 4 {
        // multi-frame acquisition: keep the first frame
        if array.shape()[3] == 0 {
            bail!("empty fourth dimension in {}", path.display());
        }
        debug!(frames = array.shape()[3], path = %path.display(), "selecting first frame");
        array = array.index_axis_move(Axis(3), 0);
    }
    let shape = array.shape().to_vec();
    if shape.len() != 3 {
        bail!(
            "expected a 3D NIfTI volume, found {} dimensions in {}",
            shape.len(),
            path.display()
        );
    }
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);
    debug!(?shape, path = %path.display(), "loaded NIfTI volume");

    // force C layout so the flat vector is [X, Y, Z] row-major
    let data_vec: Vec<f32> = array.as_standard_layout().iter().copied().collect();
    let tensor = Tensor::<B, 3>::from_data(TensorData::new(data_vec, [nx, ny, nz]), device);
    let tensor = tensor.permute([2, 1, 0]);

    Volume::new(tensor, origin, spacing, direction)
        .with_context(|| format!("invalid geometry in {}", path.display()))
}

/// Read a NIfTI file and binarize it into a mask.
pub fn read_mask<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Mask<B>> {
    Ok(Mask::from_volume(read_volume(path, device)?))
}

/// Write a volume as a NIfTI-1 file, carrying its geometry in the sform.
pub fn write_volume<B: Backend, P: AsRef<Path>>(path: P, volume: &Volume<B>) -> Result<()> {
    use nifti::writer::WriterOptions;

    let [nz, ny, nx] = volume.dims();
    let tensor = volume.data().clone().permute([2, 1, 0]);
    let data = tensor.to_data();
    let slice = data
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("failed to read tensor data: {e:?}"))?;

    let array = Array3::from_shape_vec((nx, ny, nz), slice.to_vec())
        .context("voxel buffer does not match volume dimensions")?;

    let header = header_from_geometry(volume);
    let path = path.as_ref();
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| anyhow::anyhow!("failed to write NIfTI file {}: {e}", path.display()))?;
    Ok(())
}

/// Voxel-to-world affine from the header, following the NIfTI-1 rules.
fn affine_from_header(header: &NiftiHeader) -> SMatrix<f64, 3, 4> {
    if header.sform_code > 0 {
        return rows_to_affine(header.srow_x, header.srow_y, header.srow_z);
    }
    if header.qform_code > 0 {
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();
        let qfac = if header.pixdim[0] == 0.0 {
            1.0
        } else {
            header.pixdim[0] as f64
        };

        let dx = header.pixdim[1] as f64;
        let dy = header.pixdim[2] as f64;
        let dz = header.pixdim[3] as f64 * qfac;

        let rot = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * b * c - 2.0 * a * d,
                2.0 * b * d + 2.0 * a * c,
            ],
            [
                2.0 * b * c + 2.0 * a * d,
                a * a + c * c - b * b - d * d,
                2.0 * c * d - 2.0 * a * b,
            ],
            [
                2.0 * b * d - 2.0 * a * c,
                2.0 * c * d + 2.0 * a * b,
                a * a + d * d - c * c - b * b,
            ],
        ];

        let mut m = SMatrix::<f64, 3, 4>::zeros();
        for i in 0..3 {
            m[(i, 0)] = rot[i][0] * dx;
            m[(i, 1)] = rot[i][1] * dy;
            m[(i, 2)] = rot[i][2] * dz;
        }
        m[(0, 3)] = header.quatern_x as f64;
        m[(1, 3)] = header.quatern_y as f64;
        m[(2, 3)] = header.quatern_z as f64;
        return m;
    }

    // no orientation information: pixdim scaling only
    let mut m = SMatrix::<f64, 3, 4>::zeros();
    for i in 0..3 {
        m[(i, i)] = header.pixdim[i + 1] as f64;
    }
    m
}

fn rows_to_affine(rx: [f32; 4], ry: [f32; 4], rz: [f32; 4]) -> SMatrix<f64, 3, 4> {
    let mut m = SMatrix::<f64, 3, 4>::zeros();
    for j in 0..4 {
        m[(0, j)] = rx[j] as f64;
        m[(1, j)] = ry[j] as f64;
        m[(2, j)] = rz[j] as f64;
    }
    m
}

/// Split the linear part of the affine into spacing magnitudes and unit
/// direction columns.
fn decompose_affine(affine: &SMatrix<f64, 3, 4>) -> (Spacing<3>, Direction<3>) {
    let mut spacing = [1.0f64; 3];
    let mut columns = [nalgebra::Vector3::x_axis().into_inner(); 3];
    let fallback = [
        nalgebra::Vector3::x_axis().into_inner(),
        nalgebra::Vector3::y_axis().into_inner(),
        nalgebra::Vector3::z_axis().into_inner(),
    ];

    for j in 0..3 {
        let col = nalgebra::Vector3::new(affine[(0, j)], affine[(1, j)], affine[(2, j)]);
        let norm = col.norm();
        if norm > 1e-9 {
            spacing[j] = norm;
            columns[j] = col / norm;
        } else {
            columns[j] = fallback[j];
        }
    }

    let direction = Direction(SMatrix::<f64, 3, 3>::from_columns(&columns));
    (Vector::new(spacing), direction)
}

fn header_from_geometry<B: Backend>(volume: &Volume<B>) -> NiftiHeader {
    let a = volume.world_matrix();
    let origin = volume.origin();
    let spacing = volume.spacing();

    let row = |i: usize| {
        [
            a[(i, 0)] as f32,
            a[(i, 1)] as f32,
            a[(i, 2)] as f32,
            origin[i] as f32,
        ]
    };

    let mut pixdim = [1.0f32; 8];
    for j in 0..3 {
        pixdim[j + 1] = spacing[j] as f32;
    }

    NiftiHeader {
        pixdim,
        sform_code: 1,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        ..Default::default()
    }
}
