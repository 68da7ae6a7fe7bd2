//! Single-subject quantification pipeline.
//!
//! Registers the subject PET onto the template, resamples it into template
//! space, carries both masks onto that grid and quantifies the uptake
//! ratio. Collaborators load the volumes beforehand and serialize the
//! output afterwards; nothing here touches storage.

use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use tracing::info;

use petra_core::filter::ResampleVolumeFilter;
use petra_core::interpolation::NearestNeighborInterpolator;
use petra_core::transform::MatrixTransform;
use petra_core::volume::{Mask, Volume};
use petra_registration::{
    EstimatedTransform, OptimizationReport, RegistrationConfig, RegistrationEngine,
};

use crate::calibration::{CalibrationTable, TracerMode};
use crate::error::QuantError;
use crate::quantify::{quantify, QuantificationResult};
use crate::stats::{region_mean, RegionStats};

/// Everything a run needs besides the volumes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub registration: RegistrationConfig,
    pub tracer: String,
    pub mode: TracerMode,
}

/// Output of one subject run, handed to the reporting collaborator.
#[derive(Debug, Clone)]
pub struct PipelineOutput<B: AutodiffBackend> {
    /// Estimated template-to-subject mapping, kept for audit and replay.
    pub transform: EstimatedTransform,
    /// Subject PET resampled onto the template grid.
    pub registered_pet: Volume<B>,
    /// Target mask on the registered grid.
    pub target_mask: Mask<B>,
    /// Reference mask on the registered grid.
    pub reference_mask: Mask<B>,
    pub target_stats: RegionStats,
    pub reference_stats: RegionStats,
    pub result: QuantificationResult,
    pub initial_stage: Option<OptimizationReport>,
    pub final_stage: OptimizationReport,
}

/// Orchestrates registration, mask transfer and quantification.
#[derive(Debug, Clone)]
pub struct QuantificationPipeline {
    config: PipelineConfig,
    calibration: CalibrationTable,
}

impl QuantificationPipeline {
    pub fn new(config: PipelineConfig, calibration: CalibrationTable) -> Self {
        Self {
            config,
            calibration,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one subject.
    ///
    /// `pet` is the subject acquisition, `template` the fixed reference
    /// volume. Both masks are defined in template physical space; their
    /// grids may differ from the template's, the transfer step resamples
    /// them either way.
    pub fn run<B: AutodiffBackend>(
        &self,
        pet: &Volume<B>,
        template: &Volume<B>,
        target_mask: &Mask<B>,
        reference_mask: &Mask<B>,
    ) -> Result<PipelineOutput<B>, QuantError> {
        info!(
            tracer = %self.config.tracer,
            mode = %self.config.mode,
            "starting quantification run"
        );

        let engine = RegistrationEngine::new(self.config.registration.clone());
        let (outcome, registered_pet) = engine.register_and_resample(template, pet)?;
        info!(dims = ?registered_pet.dims(), "subject volume registered to template space");

        let labels = ResampleVolumeFilter::new(NearestNeighborInterpolator, 0.0);
        let identity = MatrixTransform::identity();
        let target = Mask::from_volume(labels.resample(
            target_mask.volume(),
            &registered_pet,
            &identity,
        )?);
        let reference = Mask::from_volume(labels.resample(
            reference_mask.volume(),
            &registered_pet,
            &identity,
        )?);

        let target_stats = region_mean(&registered_pet, &target)?;
        let reference_stats = region_mean(&registered_pet, &reference)?;

        let result = quantify(
            &target_stats,
            &reference_stats,
            &self.config.tracer,
            self.config.mode,
            &self.calibration,
        );

        Ok(PipelineOutput {
            transform: outcome.transform,
            registered_pet,
            target_mask: target,
            reference_mask: reference,
            target_stats,
            reference_stats,
            result,
            initial_stage: outcome.initial_stage,
            final_stage: outcome.final_stage,
        })
    }
}
