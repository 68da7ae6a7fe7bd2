//! Binary masks over a volume grid.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};

use crate::volume::Volume;

/// Threshold above which a voxel counts as foreground.
///
/// Chosen so that nearest-neighbour resampled label values survive minor
/// floating point noise around 0 and 1.
pub const FOREGROUND_THRESHOLD: f32 = 0.5;

/// A binary region mask sharing a volume's grid and geometry.
///
/// Voxels hold exactly 0.0 or 1.0.
#[derive(Debug, Clone)]
pub struct Mask<B: Backend> {
    volume: Volume<B>,
}

impl<B: Backend> Mask<B> {
    /// Binarize a volume at [`FOREGROUND_THRESHOLD`].
    pub fn from_volume(volume: Volume<B>) -> Self {
        Self::from_volume_at(volume, FOREGROUND_THRESHOLD)
    }

    /// Binarize a volume at an explicit threshold: foreground where
    /// `value > threshold`.
    pub fn from_volume_at(volume: Volume<B>, threshold: f32) -> Self {
        let binary = volume.data().clone().greater_elem(threshold).float();
        // binarizing keeps the grid, so `like` cannot fail
        let volume = volume.like(binary).expect("same voxel grid");
        Self { volume }
    }

    /// The underlying 0/1 volume.
    pub fn volume(&self) -> &Volume<B> {
        &self.volume
    }

    pub fn into_volume(self) -> Volume<B> {
        self.volume
    }

    /// Number of foreground voxels.
    pub fn num_foreground(&self) -> usize {
        let total: f32 = self
            .volume
            .data()
            .clone()
            .sum()
            .into_scalar()
            .elem::<f32>();
        total.round() as usize
    }

    /// True when the mask selects no voxels.
    pub fn is_empty(&self) -> bool {
        self.num_foreground() == 0
    }

    /// Foreground indicator as a tensor, shape `[Z, Y, X]`.
    pub fn indicator(&self) -> &Tensor<B, 3> {
        self.volume.data()
    }
}
