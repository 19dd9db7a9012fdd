//! Difference-in-differences estimator.
//!
//! Each panel is reduced to the unweighted mean of its per-region
//! `post - pre` log-revenue differences. The point estimate is the gap
//! between the two means and the standard error is the Welch-type
//! `sqrt(s1^2/n1 + s0^2/n0)` with Bessel-corrected variances. The interval
//! uses a Normal quantile with no small-sample correction.

use crate::domain::model::{EstimationResult, GroupPanel, RegionSummary};
use crate::utils::error::{DidError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// z for a two-sided 95% interval.
pub const DEFAULT_CONFIDENCE_Z: f64 = 1.96;

/// Mean and unbiased variance of one panel's per-region differences.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DiffMoments {
    regions: usize,
    mean: f64,
    variance: f64,
}

impl DiffMoments {
    fn variance_of_mean(&self) -> f64 {
        self.variance / self.regions as f64
    }
}

fn ensure_finite(panel: &GroupPanel, region: &RegionSummary, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        return Ok(());
    }
    Err(DidError::InvalidInput {
        group: panel.group().to_string(),
        region: region.region_id.clone(),
        reason: format!("{} is not finite ({})", field, value),
    })
}

fn panel_moments(panel: &GroupPanel) -> Result<DiffMoments> {
    if panel.is_empty() {
        return Err(DidError::EmptyPanel {
            group: panel.group().to_string(),
        });
    }

    let mut diffs = Vec::with_capacity(panel.len());
    for region in panel.regions() {
        ensure_finite(panel, region, "log_revenue_pre", region.log_revenue_pre)?;
        ensure_finite(panel, region, "log_revenue_post", region.log_revenue_post)?;
        let diff = region.diff();
        ensure_finite(panel, region, "pre-to-post difference", diff)?;
        diffs.push(diff);
    }

    if diffs.len() < 2 {
        return Err(DidError::DegenerateSample {
            group: panel.group().to_string(),
            regions: diffs.len(),
        });
    }

    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(DiffMoments {
        regions: diffs.len(),
        mean,
        variance,
    })
}

/// Estimates the DID effect of treatment on log revenue.
///
/// Panels are validated in order (treated, then untreated): an empty panel
/// fails with [`DidError::EmptyPanel`], a non-finite value with
/// [`DidError::InvalidInput`] and a single-region panel with
/// [`DidError::DegenerateSample`]. An estimate whose interval or level-scale
/// values are not finite fails with [`DidError::ProcessingError`].
pub fn estimate(
    treated: &GroupPanel,
    untreated: &GroupPanel,
    confidence_z: f64,
) -> Result<EstimationResult> {
    if !confidence_z.is_finite() || confidence_z < 0.0 {
        return Err(DidError::InvalidConfigValueError {
            field: "confidence_z".to_string(),
            value: confidence_z.to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        });
    }

    let treated_moments = panel_moments(treated)?;
    let untreated_moments = panel_moments(untreated)?;

    let point_estimate = treated_moments.mean - untreated_moments.mean;
    let standard_error =
        (treated_moments.variance_of_mean() + untreated_moments.variance_of_mean()).sqrt();

    if !point_estimate.is_finite() || !standard_error.is_finite() {
        return Err(DidError::ProcessingError {
            message: format!(
                "estimate overflowed (point estimate {}, standard error {})",
                point_estimate, standard_error
            ),
        });
    }

    let margin = confidence_z * standard_error;
    let ci_low = point_estimate - margin;
    let ci_high = point_estimate + margin;

    // exp 超過約 709.78 會變成 inf，JSON 會寫成 null
    let point_estimate_level = point_estimate.exp();
    let ci_low_level = ci_low.exp();
    let ci_high_level = ci_high.exp();
    if ![ci_low, ci_high, point_estimate_level, ci_low_level, ci_high_level]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(DidError::ProcessingError {
            message: format!(
                "level-scale estimate overflowed (log estimate {}, interval [{}, {}])",
                point_estimate, ci_low, ci_high
            ),
        });
    }

    Ok(EstimationResult {
        point_estimate,
        standard_error,
        ci_low,
        ci_high,
        point_estimate_level,
        ci_low_level,
        ci_high_level,
        treated_mean_diff: treated_moments.mean,
        untreated_mean_diff: untreated_moments.mean,
        treated_regions: treated_moments.regions,
        untreated_regions: untreated_moments.regions,
        confidence_z,
    })
}

pub fn estimate_default(treated: &GroupPanel, untreated: &GroupPanel) -> Result<EstimationResult> {
    estimate(treated, untreated, DEFAULT_CONFIDENCE_Z)
}

/// Two-sided Normal quantile for a confidence level in (0, 1), e.g. 0.95 -> 1.95996.
pub fn z_for_confidence_level(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(DidError::InvalidConfigValueError {
            field: "confidence_level".to_string(),
            value: level.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| DidError::ProcessingError {
        message: format!("standard normal unavailable: {}", e),
    })?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TreatmentGroup;

    const TOLERANCE: f64 = 1e-9;

    fn panel(group: TreatmentGroup, diffs: &[f64]) -> GroupPanel {
        let regions = diffs
            .iter()
            .enumerate()
            .map(|(i, d)| RegionSummary::new(format!("{}", 500 + i), 0.0, *d))
            .collect();
        GroupPanel::new(group, regions).unwrap()
    }

    fn scenario_one() -> (GroupPanel, GroupPanel) {
        (
            panel(TreatmentGroup::Treated, &[0.1, 0.3, 0.2]),
            panel(TreatmentGroup::Untreated, &[0.05, 0.05]),
        )
    }

    #[test]
    fn test_scenario_one_point_estimate_and_interval() {
        let (treated, untreated) = scenario_one();
        let result = estimate_default(&treated, &untreated).unwrap();

        assert!((result.treated_mean_diff - 0.2).abs() < TOLERANCE);
        assert!((result.untreated_mean_diff - 0.05).abs() < TOLERANCE);
        assert!((result.point_estimate - 0.15).abs() < TOLERANCE);
        assert!((result.standard_error - (0.01f64 / 3.0).sqrt()).abs() < TOLERANCE);
        assert!((result.standard_error - 0.05774).abs() < 1e-5);
        assert!((result.ci_low - 0.0368).abs() < 1e-4);
        assert!((result.ci_high - 0.2632).abs() < 1e-4);
        assert_eq!(result.treated_regions, 3);
        assert_eq!(result.untreated_regions, 2);
        assert_eq!(result.confidence_z, DEFAULT_CONFIDENCE_Z);
    }

    #[test]
    fn test_scenario_one_level_transform() {
        let (treated, untreated) = scenario_one();
        let result = estimate_default(&treated, &untreated).unwrap();

        assert!((result.point_estimate_level - 1.1618).abs() < 1e-4);
        assert_eq!(result.point_estimate_level, result.point_estimate.exp());
        assert_eq!(result.ci_low_level, result.ci_low.exp());
        assert_eq!(result.ci_high_level, result.ci_high.exp());
    }

    #[test]
    fn test_single_region_is_degenerate() {
        let treated = panel(TreatmentGroup::Treated, &[0.1]);
        let untreated = panel(TreatmentGroup::Untreated, &[0.05, 0.07]);

        match estimate_default(&treated, &untreated).unwrap_err() {
            DidError::DegenerateSample { group, regions } => {
                assert_eq!(group, "treated");
                assert_eq!(regions, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nan_pre_is_invalid_input() {
        let treated = panel(TreatmentGroup::Treated, &[0.1, 0.3]);
        let untreated = GroupPanel::new(
            TreatmentGroup::Untreated,
            vec![
                RegionSummary::new("600", f64::NAN, 0.2),
                RegionSummary::new("601", 0.0, 0.2),
            ],
        )
        .unwrap();

        match estimate_default(&treated, &untreated).unwrap_err() {
            DidError::InvalidInput { group, region, reason } => {
                assert_eq!(group, "untreated");
                assert_eq!(region, "600");
                assert!(reason.contains("log_revenue_pre"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_infinite_post_is_invalid_input() {
        let treated = GroupPanel::new(
            TreatmentGroup::Treated,
            vec![
                RegionSummary::new("500", 0.0, f64::INFINITY),
                RegionSummary::new("501", 0.0, 0.2),
            ],
        )
        .unwrap();
        let untreated = panel(TreatmentGroup::Untreated, &[0.05, 0.07]);

        assert!(matches!(
            estimate_default(&treated, &untreated),
            Err(DidError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_empty_panel() {
        let treated = panel(TreatmentGroup::Treated, &[0.1, 0.3]);
        let untreated = GroupPanel::new(TreatmentGroup::Untreated, vec![]).unwrap();

        match estimate_default(&treated, &untreated).unwrap_err() {
            DidError::EmptyPanel { group } => assert_eq!(group, "untreated"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_swapping_labels_negates_estimate() {
        let (treated, untreated) = scenario_one();
        let forward = estimate_default(&treated, &untreated).unwrap();
        let backward = estimate_default(&untreated, &treated).unwrap();

        assert_eq!(forward.point_estimate, -backward.point_estimate);
        assert_eq!(forward.standard_error, backward.standard_error);
    }

    #[test]
    fn test_zero_within_group_variance_gives_zero_standard_error() {
        let treated = panel(TreatmentGroup::Treated, &[0.25, 0.25, 0.25]);
        let untreated = panel(TreatmentGroup::Untreated, &[0.125, 0.125]);
        let result = estimate_default(&treated, &untreated).unwrap();

        assert_eq!(result.standard_error, 0.0);
        assert_eq!(result.ci_low, result.point_estimate);
        assert_eq!(result.ci_high, result.point_estimate);
    }

    #[test]
    fn test_level_scale_overflow_is_rejected() {
        let treated = panel(TreatmentGroup::Treated, &[710.0, 710.0]);
        let untreated = panel(TreatmentGroup::Untreated, &[0.0, 0.0]);

        match estimate_default(&treated, &untreated).unwrap_err() {
            DidError::ProcessingError { message } => assert!(message.contains("level-scale")),
            other => panic!("unexpected error: {:?}", other),
        }

        // 上限內仍可正常輸出
        let treated = panel(TreatmentGroup::Treated, &[700.0, 700.0]);
        let result = estimate_default(&treated, &untreated).unwrap();
        assert!(result.ci_high_level.is_finite());
    }

    #[test]
    fn test_rejects_negative_or_nan_z() {
        let (treated, untreated) = scenario_one();
        assert!(estimate(&treated, &untreated, -1.0).is_err());
        assert!(estimate(&treated, &untreated, f64::NAN).is_err());
    }

    #[test]
    fn test_unequal_variances_are_not_pooled() {
        // 兩組變異數不同時不可合併估計
        let treated = panel(TreatmentGroup::Treated, &[0.0, 1.0]);
        let untreated = panel(TreatmentGroup::Untreated, &[0.0, 0.0, 0.0, 0.0]);
        let result = estimate_default(&treated, &untreated).unwrap();

        // var([0, 1]) = 0.5, divided by 2 regions
        assert!((result.standard_error - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_z_for_confidence_level() {
        assert!((z_for_confidence_level(0.95).unwrap() - 1.959964).abs() < 1e-5);
        assert!((z_for_confidence_level(0.90).unwrap() - 1.644854).abs() < 1e-5);
        assert!(z_for_confidence_level(1.0).is_err());
        assert!(z_for_confidence_level(0.0).is_err());
        assert!(z_for_confidence_level(f64::NAN).is_err());
    }
}
