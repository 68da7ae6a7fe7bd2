//! SUVR computation and calibration to a standardized scale.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calibration::{CalibrationTable, TracerMode};
use crate::stats::RegionStats;

/// One quantified run: the region means, their ratio (SUVR) and the
/// calibrated value.
///
/// `ratio` is defined only when the reference mean is finite and strictly
/// positive; otherwise it is NaN, and `scaled_value` follows suit. An
/// undefined result is a reportable outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantificationResult {
    pub tracer: String,
    pub mode: TracerMode,
    pub target_mean: f64,
    pub reference_mean: f64,
    pub ratio: f64,
    pub scaled_value: f64,
    pub scaled_units: String,
}

impl QuantificationResult {
    /// True when the ratio (and so the scaled value) carries a number.
    pub fn is_defined(&self) -> bool {
        self.ratio.is_finite()
    }
}

/// Form the SUVR from target and reference statistics and calibrate it.
///
/// All arithmetic is f64. A degenerate reference (NaN, zero or negative
/// mean, or an empty region) propagates NaN through the ratio and the
/// scaled value rather than substituting a default.
pub fn quantify(
    target: &RegionStats,
    reference: &RegionStats,
    tracer: &str,
    mode: TracerMode,
    table: &CalibrationTable,
) -> QuantificationResult {
    let ratio = if reference.mean.is_finite() && reference.mean > 0.0 {
        target.mean / reference.mean
    } else {
        f64::NAN
    };

    let entry = table.resolve(mode, tracer);
    let scaled_value = entry.apply(ratio);

    info!(
        tracer,
        %mode,
        target_mean = target.mean,
        reference_mean = reference.mean,
        ratio,
        scaled_value,
        "quantified uptake"
    );

    QuantificationResult {
        tracer: tracer.to_owned(),
        mode,
        target_mean: target.mean,
        reference_mean: reference.mean,
        ratio,
        scaled_value,
        scaled_units: mode.scale_units().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean: f64, voxel_count: usize) -> RegionStats {
        RegionStats { mean, voxel_count }
    }

    #[test]
    fn test_ratio_is_target_over_reference() {
        let r = quantify(
            &stats(1800.0, 100),
            &stats(1000.0, 100),
            "XYZ",
            TracerMode::Amyloid,
            &CalibrationTable::empty(),
        );
        assert!((r.ratio - 1.8).abs() < 1e-12);
        assert_eq!(r.scaled_value, r.ratio);
        assert_eq!(r.scaled_units, "Centiloid");
        assert!(r.is_defined());
    }

    #[test]
    fn test_ratio_invariant_to_uniform_rescaling() {
        let a = quantify(
            &stats(1800.0, 10),
            &stats(1000.0, 10),
            "t",
            TracerMode::Tau,
            &CalibrationTable::empty(),
        );
        let b = quantify(
            &stats(3.6, 10),
            &stats(2.0, 10),
            "t",
            TracerMode::Tau,
            &CalibrationTable::empty(),
        );
        assert!((a.ratio - b.ratio).abs() < 1e-12);
    }

    #[test]
    fn test_identity_calibration_returns_ratio_exactly() {
        let table = CalibrationTable::from_yaml_str(
            "amyloid:\n  pib:\n    slope: 1.0\n    intercept: 0.0\n",
        )
        .unwrap();
        let r = quantify(
            &stats(2.5, 5),
            &stats(1.25, 5),
            "pib",
            TracerMode::Amyloid,
            &table,
        );
        assert_eq!(r.scaled_value, r.ratio);
    }

    #[test]
    fn test_generic_fallback_scales() {
        let table = CalibrationTable::from_yaml_str(
            "amyloid:\n  generic:\n    slope: 2.0\n    intercept: 1.0\n",
        )
        .unwrap();
        let r = quantify(
            &stats(3.0, 5),
            &stats(2.0, 5),
            "XYZ",
            TracerMode::Amyloid,
            &table,
        );
        assert!((r.scaled_value - (2.0 * 1.5 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_mode_leaves_ratio_unscaled() {
        let table = CalibrationTable::from_yaml_str(
            "amyloid:\n  generic:\n    slope: 2.0\n    intercept: 1.0\n",
        )
        .unwrap();
        let r = quantify(
            &stats(3.0, 5),
            &stats(2.0, 5),
            "anything",
            TracerMode::Tau,
            &table,
        );
        assert_eq!(r.scaled_value, r.ratio);
        assert_eq!(r.scaled_units, "CenTauR (experimental)");
    }

    #[test]
    fn test_degenerate_reference_propagates_nan() {
        for reference in [
            stats(f64::NAN, 0),
            stats(0.0, 10),
            stats(-5.0, 10),
            stats(f64::INFINITY, 10),
        ] {
            let r = quantify(
                &stats(1800.0, 100),
                &reference,
                "XYZ",
                TracerMode::Amyloid,
                &CalibrationTable::empty(),
            );
            assert!(r.ratio.is_nan(), "reference {reference:?}");
            assert!(r.scaled_value.is_nan());
            assert!(!r.is_defined());
        }
    }

    #[test]
    fn test_nan_target_propagates() {
        let r = quantify(
            &stats(f64::NAN, 0),
            &stats(1000.0, 10),
            "XYZ",
            TracerMode::Amyloid,
            &CalibrationTable::empty(),
        );
        assert!(r.ratio.is_nan());
        assert!(r.scaled_value.is_nan());
    }

    #[test]
    fn test_result_serializes_for_reporting() {
        let r = quantify(
            &stats(1800.0, 100),
            &stats(1000.0, 100),
            "flutemetamol",
            TracerMode::Amyloid,
            &CalibrationTable::empty(),
        );
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"scaled_units\":\"Centiloid\""));
    }
}
