//! NaN-aware region statistics.

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use petra_core::error::VolumeError;
use petra_core::volume::{Mask, Volume};

use crate::error::QuantError;

/// Summary of a volume restricted to a mask.
///
/// `voxel_count` is the number of voxels the mask selects. `mean` averages
/// the finite intensities among them: NaN samples inside the mask are
/// excluded from the average, never counted as zero. An empty selection, or
/// one containing only NaN, leaves the mean NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub mean: f64,
    pub voxel_count: usize,
}

impl RegionStats {
    /// True when the mean carries a usable value.
    pub fn is_defined(&self) -> bool {
        self.mean.is_finite()
    }
}

/// Mean intensity of `volume` under `mask`.
///
/// The mask must live on the same voxel grid as the volume; transfer it
/// with nearest-neighbour resampling first if it does not.
pub fn region_mean<B: Backend>(
    volume: &Volume<B>,
    mask: &Mask<B>,
) -> Result<RegionStats, QuantError> {
    let vol_dims = volume.dims();
    let mask_dims = mask.volume().dims();
    if vol_dims != mask_dims {
        return Err(VolumeError::GridMismatch {
            expected: vol_dims,
            actual: mask_dims,
        }
        .into());
    }

    let values = volume
        .data()
        .to_data()
        .to_vec::<f32>()
        .expect("f32 tensor data");
    let selector = mask
        .indicator()
        .to_data()
        .to_vec::<f32>()
        .expect("f32 tensor data");

    let mut voxel_count = 0usize;
    let mut finite_count = 0usize;
    let mut sum = 0.0f64;
    for (v, m) in values.iter().zip(&selector) {
        if *m > 0.0 {
            voxel_count += 1;
            let v = *v as f64;
            if v.is_finite() {
                finite_count += 1;
                sum += v;
            }
        }
    }

    let mean = if finite_count > 0 {
        sum / finite_count as f64
    } else {
        f64::NAN
    };

    Ok(RegionStats { mean, voxel_count })
}
