//! The optimization loop driving one registration stage.

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Int, Tensor, TensorData};
use tracing::{debug, info};

use petra_core::interpolation::{Interpolator, LinearInterpolator};
use petra_core::transform::SpatialTransform;
use petra_core::volume::{index_grid, Volume};

use crate::error::RegistrationError;
use crate::metric::SimilarityMetric;
use crate::optimizer::GradientDescent;
use crate::sampling::VoxelSampler;

/// Knobs for a single optimization stage.
#[derive(Debug, Clone)]
pub struct StageOptions {
    pub iterations: usize,
    pub learning_rate: f64,
    pub convergence_tolerance: f64,
    pub convergence_window: usize,
}

/// What happened during a stage.
#[derive(Debug, Clone)]
pub struct OptimizationReport {
    pub iterations_run: usize,
    pub final_loss: f64,
    pub converged: bool,
}

/// Stops a stage once the loss has flattened out.
///
/// Converged when a full trailing window of losses spans less than the
/// tolerance.
struct ConvergenceChecker {
    tolerance: f64,
    window: usize,
    history: Vec<f64>,
}

impl ConvergenceChecker {
    fn new(tolerance: f64, window: usize) -> Self {
        Self {
            tolerance,
            window,
            history: Vec::new(),
        }
    }

    fn update(&mut self, loss: f64) -> bool {
        self.history.push(loss);
        if self.window == 0 || self.history.len() < self.window {
            return false;
        }
        let tail = &self.history[self.history.len() - self.window..];
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in tail {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        hi - lo < self.tolerance
    }
}

/// Optimize a transform so the moving volume matches the fixed volume.
///
/// Each iteration draws a fresh voxel subset from the fixed volume, maps
/// the corresponding world points through the transform, samples the
/// moving volume there with trilinear interpolation and descends on the
/// metric. Runs until the iteration budget is spent or the loss flattens.
///
/// Non-convergence within the budget is not an error; the transform at
/// cutoff is returned with `converged = false`. A non-finite loss is
/// different: the optimization has diverged and the stage aborts with
/// [`RegistrationError::NonFiniteLoss`].
pub fn optimize<B, M>(
    mut transform: M,
    fixed: &Volume<B>,
    moving: &Volume<B>,
    metric: &impl SimilarityMetric<B>,
    sampler: &VoxelSampler,
    options: &StageOptions,
) -> Result<(M, OptimizationReport), RegistrationError>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + SpatialTransform<B>,
{
    if options.iterations == 0 {
        return Err(RegistrationError::NoIterations);
    }
    if !(options.learning_rate.is_finite() && options.learning_rate > 0.0) {
        return Err(RegistrationError::InvalidLearningRate(options.learning_rate));
    }

    let device = fixed.device();
    let total = fixed.num_voxels();

    // sampled rows index into both of these
    let fixed_flat = fixed.data().clone().reshape([total]);
    let fixed_world = fixed.index_to_world_batch(index_grid::<B>(fixed.dims(), &device));

    let interpolator = LinearInterpolator;
    let mut optim = GradientDescent::new(options.learning_rate);
    let mut checker =
        ConvergenceChecker::new(options.convergence_tolerance, options.convergence_window);

    let mut final_loss = f64::NAN;
    let mut converged = false;
    let mut iterations_run = 0;

    for iteration in 0..options.iterations {
        let idx = sampler.sample(total, iteration);
        let n = idx.len();
        let idx = Tensor::<B, 1, Int>::from_data(TensorData::new(idx, [n]), &device);

        let fixed_values = fixed_flat.clone().select(0, idx.clone());
        let points = fixed_world.clone().select(0, idx);

        let mapped = transform.transform_points(points);
        let moving_indices = moving.world_to_index_batch(mapped);
        let moving_values = interpolator.interpolate(moving.data(), moving_indices, 0.0);

        let loss = metric.forward(fixed_values, moving_values);
        let loss_value = loss.clone().into_scalar().elem::<f64>();
        if !loss_value.is_finite() {
            return Err(RegistrationError::NonFiniteLoss { iteration });
        }

        let grads = GradientsParams::from_grads(loss.backward(), &transform);
        transform = optim.step(transform, grads);

        debug!(iteration, loss = loss_value, "descent step");
        final_loss = loss_value;
        iterations_run = iteration + 1;

        if checker.update(loss_value) {
            converged = true;
            break;
        }
    }

    info!(
        iterations = iterations_run,
        loss = final_loss,
        converged,
        "stage finished"
    );

    Ok((
        transform,
        OptimizationReport {
            iterations_run,
            final_loss,
            converged,
        },
    ))
}
