//! Full pipeline runs on small synthetic studies.

use burn::backend::Autodiff;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use petra_core::spatial::{Direction3, Point3, Spacing3};
use petra_core::volume::{Mask, Volume};
use petra_quant::{CalibrationTable, PipelineConfig, QuantificationPipeline, TracerMode};
use petra_registration::RegistrationConfig;

type B = Autodiff<NdArray<f32>>;

const N: usize = 12;

fn volume_from(vals: Vec<f32>, origin: [f64; 3]) -> Volume<B> {
    let data = Tensor::<B, 3>::from_data(TensorData::new(vals, [N, N, N]), &Default::default());
    Volume::new(
        data,
        Point3::new(origin),
        Spacing3::uniform(2.0),
        Direction3::identity(),
    )
    .unwrap()
}

fn blob(center: [f64; 3], width: f64, amplitude: f32) -> Vec<f32> {
    let mut vals = Vec::with_capacity(N * N * N);
    for z in 0..N {
        for y in 0..N {
            for x in 0..N {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let dz = z as f64 - center[2];
                let r2 = dx * dx + dy * dy + dz * dz;
                vals.push(amplitude * (-r2 / width).exp() as f32);
            }
        }
    }
    vals
}

fn ball_mask(center: [f64; 3], radius: f64, origin: [f64; 3]) -> Mask<B> {
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
    Mask::from_volume(volume_from(vals, origin))
}

fn quick_pipeline(tracer: &str, mode: TracerMode, table: CalibrationTable) -> QuantificationPipeline {
    let mut registration = RegistrationConfig::rigid();
    registration.rigid_iterations = 10;
    registration.learning_rate = 0.05;
    QuantificationPipeline::new(
        PipelineConfig {
            registration,
            tracer: tracer.to_owned(),
            mode,
        },
        table,
    )
}

#[test]
fn pipeline_produces_a_complete_output() {
    let center = [5.5, 5.5, 5.5];
    let template = volume_from(blob(center, 12.0, 1.0), [0.0; 3]);
    // subject volume shifted 2mm in world space
    let pet = volume_from(blob(center, 12.0, 1500.0), [2.0, 0.0, 0.0]);

    let target = ball_mask(center, 3.0, [0.0; 3]);
    let reference = ball_mask(center, 5.0, [0.0; 3]);

    let pipeline = quick_pipeline("unknown", TracerMode::Amyloid, CalibrationTable::empty());
    let output = pipeline.run(&pet, &template, &target, &reference).unwrap();

    assert_eq!(output.registered_pet.dims(), template.dims());
    assert_eq!(output.target_mask.volume().dims(), template.dims());
    assert!(output.target_stats.voxel_count > 0);
    assert!(output.reference_stats.voxel_count > 0);
    assert!(output.final_stage.iterations_run > 0);
    assert!(output.initial_stage.is_none());

    // hot centre against wider reference: ratio is defined and above 1
    assert!(output.result.ratio.is_finite());
    assert!(output.result.ratio >= 1.0, "ratio {}", output.result.ratio);
    assert_eq!(output.result.scaled_value, output.result.ratio);
    assert_eq!(output.result.scaled_units, "Centiloid");

    // the estimated transform stays auditable and invertible
    assert!(output.transform.to_matrix_transform().try_inverse().is_some());
}

#[test]
fn pipeline_reports_nan_for_non_overlapping_reference() {
    let center = [5.5, 5.5, 5.5];
    let template = volume_from(blob(center, 12.0, 1.0), [0.0; 3]);
    let pet = volume_from(blob(center, 12.0, 1500.0), [0.0; 3]);

    let target = ball_mask(center, 3.0, [0.0; 3]);
    // reference mask far outside the template grid: no overlap at all
    let reference = ball_mask(center, 3.0, [500.0, 500.0, 500.0]);

    let pipeline = quick_pipeline("any", TracerMode::Tau, CalibrationTable::empty());
    let output = pipeline.run(&pet, &template, &target, &reference).unwrap();

    assert_eq!(output.reference_stats.voxel_count, 0);
    assert!(output.reference_stats.mean.is_nan());
    assert!(output.result.ratio.is_nan());
    assert!(output.result.scaled_value.is_nan());
}

#[test]
fn pipeline_applies_the_matched_calibration() {
    let center = [5.5, 5.5, 5.5];
    let template = volume_from(blob(center, 12.0, 1.0), [0.0; 3]);
    let pet = volume_from(blob(center, 12.0, 1500.0), [0.0; 3]);
    let target = ball_mask(center, 3.0, [0.0; 3]);
    let reference = ball_mask(center, 5.0, [0.0; 3]);

    let table = CalibrationTable::from_yaml_str(
        "amyloid:\n  generic:\n    slope: 100.0\n    intercept: -100.0\n",
    )
    .unwrap();
    let pipeline = quick_pipeline("XYZ", TracerMode::Amyloid, table);
    let output = pipeline.run(&pet, &template, &target, &reference).unwrap();

    let expected = 100.0 * output.result.ratio - 100.0;
    assert!((output.result.scaled_value - expected).abs() < 1e-9);
}
