//! End-to-end registration runs on small synthetic volumes.

use burn::backend::Autodiff;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use petra_core::spatial::{Direction3, Point3, Spacing3};
use petra_core::volume::Volume;
use petra_registration::{RegistrationConfig, RegistrationEngine, RegistrationMode};

type B = Autodiff<NdArray<f32>>;

/// A Gaussian blob centred at `center` (voxel units) in a 12x12x12 grid.
fn blob_volume(center: [f64; 3], origin: [f64; 3]) -> Volume<B> {
    let n = 12usize;
    let mut vals = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let dz = z as f64 - center[2];
                let r2 = dx * dx + dy * dy + dz * dz;
                vals.push((-r2 / 8.0).exp() as f32);
            }
        }
    }
    let data = Tensor::<B, 3>::from_data(TensorData::new(vals, [n, n, n]), &Default::default());
    Volume::new(
        data,
        Point3::new(origin),
        Spacing3::uniform(2.0),
        Direction3::identity(),
    )
    .unwrap()
}

fn quick_config(mode: RegistrationMode) -> RegistrationConfig {
    let mut cfg = match mode {
        RegistrationMode::Rigid => RegistrationConfig::rigid(),
        RegistrationMode::Affine => RegistrationConfig::affine(),
    };
    cfg.rigid_iterations = 15;
    cfg.rigid_init_iterations = 10;
    cfg.affine_iterations = 15;
    cfg.learning_rate = 0.05;
    cfg
}

fn assert_finite(matrix: &[[f64; 3]; 3], translation: &[f64; 3]) {
    for row in matrix {
        for v in row {
            assert!(v.is_finite());
        }
    }
    for v in translation {
        assert!(v.is_finite());
    }
}

#[test]
fn rigid_registration_completes_with_finite_parameters() {
    let fixed = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);
    let moving = blob_volume([5.5, 5.5, 5.5], [4.0, 0.0, 0.0]);

    let engine = RegistrationEngine::new(quick_config(RegistrationMode::Rigid));
    let outcome = engine.register(&fixed, &moving).unwrap();

    assert_eq!(outcome.transform.mode, RegistrationMode::Rigid);
    assert!(outcome.initial_stage.is_none());
    assert!(outcome.final_stage.iterations_run > 0);
    assert!(outcome.final_stage.final_loss.is_finite());
    assert_finite(
        &outcome.transform.parameters.matrix,
        &outcome.transform.parameters.translation,
    );

    // the moving grid sits 4mm away along x, so the centred initialization
    // keeps the translation in that neighbourhood
    let tx = outcome.transform.parameters.translation[0];
    assert!(tx > 1.0 && tx < 7.0, "translation x = {tx}");
}

#[test]
fn affine_registration_runs_both_stages() {
    let fixed = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);
    let moving = blob_volume([5.0, 6.0, 5.5], [0.0; 3]);

    let engine = RegistrationEngine::new(quick_config(RegistrationMode::Affine));
    let outcome = engine.register(&fixed, &moving).unwrap();

    assert_eq!(outcome.transform.mode, RegistrationMode::Affine);
    let initial = outcome.initial_stage.expect("rigid seeding stage");
    assert!(initial.iterations_run > 0);
    assert!(outcome.final_stage.iterations_run > 0);
    assert_finite(
        &outcome.transform.parameters.matrix,
        &outcome.transform.parameters.translation,
    );
}

#[test]
fn register_and_resample_lands_on_the_fixed_grid() {
    let fixed = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);
    let moving = blob_volume([5.5, 5.5, 5.5], [2.0, 0.0, 0.0]);

    let engine = RegistrationEngine::new(quick_config(RegistrationMode::Rigid));
    let (outcome, registered) = engine.register_and_resample(&fixed, &moving).unwrap();

    assert!(registered.same_grid(&fixed, 1e-9));
    assert!(outcome.final_stage.final_loss.is_finite());

    let vals = registered.data().to_data().to_vec::<f32>().unwrap();
    assert!(vals.iter().all(|v| v.is_finite()));
}

#[test]
fn zero_learning_rate_is_rejected() {
    let fixed = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);
    let moving = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);

    let mut cfg = quick_config(RegistrationMode::Rigid);
    cfg.learning_rate = 0.0;
    let engine = RegistrationEngine::new(cfg);
    assert!(engine.register(&fixed, &moving).is_err());
}

#[test]
fn identical_volumes_register_near_identity() {
    let fixed = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);
    let moving = blob_volume([5.5, 5.5, 5.5], [0.0; 3]);

    let engine = RegistrationEngine::new(RegistrationConfig::rigid());
    let (outcome, registered) = engine.register_and_resample(&fixed, &moving).unwrap();

    let m = outcome.transform.parameters.matrix;
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                (m[i][j] - expected).abs() < 0.05,
                "matrix[{i}][{j}] = {}",
                m[i][j]
            );
        }
    }
    for v in outcome.transform.parameters.translation {
        assert!(v.abs() < 0.1, "translation {v}");
    }

    let a = fixed.data().to_data().to_vec::<f32>().unwrap();
    let b = registered.data().to_data().to_vec::<f32>().unwrap();
    let max_err = a
        .iter()
        .zip(&b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max);
    assert!(max_err < 0.15, "max voxel error {max_err}");
}
