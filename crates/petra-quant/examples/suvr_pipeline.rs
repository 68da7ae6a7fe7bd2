//! Run the full quantification pipeline on a synthetic study.
//!
//! Builds a template, a shifted subject PET and two spherical masks in
//! memory, registers the subject, transfers the masks and prints the
//! quantification record.

use anyhow::Result;
use burn::backend::Autodiff;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use petra_core::spatial::{Direction3, Point3, Spacing3};
use petra_core::volume::{Mask, Volume};
use petra_quant::{
    CalibrationTable, PipelineConfig, QuantificationPipeline, TracerMode,
};
use petra_registration::RegistrationConfig;

type B = Autodiff<NdArray<f32>>;

const N: usize = 16;

fn volume_from(vals: Vec<f32>, origin: [f64; 3]) -> Result<Volume<B>> {
    let data = Tensor::<B, 3>::from_data(TensorData::new(vals, [N, N, N]), &Default::default());
    Ok(Volume::new(
        data,
        Point3::new(origin),
        Spacing3::uniform(2.0),
        Direction3::identity(),
    )?)
}

fn blob(center: [f64; 3], width: f64, amplitude: f32) -> Vec<f32> {
    let mut vals = Vec::with_capacity(N * N * N);
    for z in 0..N {
        for y in 0..N {
            for x in 0..N {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let dz = z as f64 - center[2];
                vals.push(amplitude * (-(dx * dx + dy * dy + dz * dz) / width).exp() as f32);
            }
        }
    }
    vals
}

fn ball(center: [f64; 3], radius: f64) -> Vec<f32> {
    let mut vals = vec![0.0f32; N * N * N];
    for z in 0..N {
        for y in 0..N {
            for x in 0..N {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let dz = z as f64 - center[2];
                if (dx * dx + dy * dy + dz * dz).sqrt() <= radius {
                    vals[z * N * N + y * N + x] = 1.0;
                }
            }
        }
    }
    vals
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let center = [7.5, 7.5, 7.5];
    let template = volume_from(blob(center, 20.0, 1.0), [0.0; 3])?;
    let pet = volume_from(blob(center, 20.0, 1600.0), [3.0, -1.0, 0.0])?;
    let target = Mask::from_volume(volume_from(ball(center, 3.0), [0.0; 3])?);
    let reference = Mask::from_volume(volume_from(ball(center, 6.0), [0.0; 3])?);

    let calibration = CalibrationTable::from_yaml_str(
        "amyloid:\n  generic:\n    slope: 100.0\n    intercept: -100.0\n",
    )?;

    let mut registration = RegistrationConfig::rigid();
    registration.rigid_iterations = 40;
    registration.learning_rate = 0.1;

    let pipeline = QuantificationPipeline::new(
        PipelineConfig {
            registration,
            tracer: "flutemetamol".to_owned(),
            mode: TracerMode::Amyloid,
        },
        calibration,
    );

    let output = pipeline.run(&pet, &template, &target, &reference)?;

    println!("tracer          : {}", output.result.tracer);
    println!("target mean     : {:.3}", output.result.target_mean);
    println!("reference mean  : {:.3}", output.result.reference_mean);
    println!("SUVR            : {:.4}", output.result.ratio);
    println!(
        "scaled value    : {:.2} {}",
        output.result.scaled_value, output.result.scaled_units
    );
    println!(
        "registration    : {} iterations, converged = {}",
        output.final_stage.iterations_run, output.final_stage.converged
    );

    Ok(())
}
