//! Aggregate CASA parameters over the analyzed tracks.

use serde::{Deserialize, Serialize};

use super::track_metrics::CasaTrackResult;
use super::MotilityClass;
use crate::utils::{mean, percentage, unit_ratio};

/// Summary kinematics of one analysis run.
///
/// Every kinematic field is `None` ("no data") when no track could be analyzed, so an
/// empty sample is never mistaken for a stationary one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CasaSummary {
    /// Tracks that contributed to the metrics.
    pub track_count: usize,
    /// Every track the tracker ever spawned, including those filtered out as noise.
    pub total_detected_tracks: usize,
    /// Exported tracks dropped for a degenerate duration.
    pub excluded_tracks: usize,

    pub mean_vcl: Option<f64>,
    pub mean_vsl: Option<f64>,
    pub mean_vap: Option<f64>,
    pub mean_alh: Option<f64>,
    pub mean_bcf: Option<f64>,

    /// mean(VSL) / mean(VCL), clamped to [0, 1].
    #[serde(rename = "lin")]
    pub linearity: Option<f64>,
    /// mean(VSL) / mean(VAP), clamped to [0, 1].
    #[serde(rename = "str")]
    pub straightness: Option<f64>,
    /// mean(VAP) / mean(VCL), clamped to [0, 1].
    #[serde(rename = "wob")]
    pub wobble: Option<f64>,

    /// Motile tracks as a percentage of all detected tracks.
    pub motility_percent: Option<f64>,
    /// Progressive tracks as a percentage of all detected tracks.
    pub progressive_percent: Option<f64>,
    pub progressive_count: usize,
    pub non_progressive_count: usize,
    pub immotile_count: usize,

    /// Mean of the per-track quality scores.
    pub quality_score: Option<f64>,
}

/// Per-track results together with their summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CasaResult {
    pub summary: CasaSummary,
    pub tracks: Vec<CasaTrackResult>,
}

/// Aggregate per-track results.
///
/// # Arguments
/// * `tracks` - Results of the analyzed tracks
/// * `excluded` - Number of exported tracks that could not be analyzed
/// * `total_detected` - Denominator of the motility percentages
pub fn summarize(
    tracks: &[CasaTrackResult],
    excluded: usize,
    total_detected: usize,
) -> CasaSummary {
    let column = |f: fn(&CasaTrackResult) -> f64| -> Option<f64> {
        let values: Vec<f64> = tracks.iter().map(f).collect();
        mean(&values)
    };

    let mean_vcl = column(|r| r.vcl);
    let mean_vsl = column(|r| r.vsl);
    let mean_vap = column(|r| r.vap);

    let count = |class: MotilityClass| tracks.iter().filter(|r| r.motility == class).count();
    let progressive_count = count(MotilityClass::Progressive);
    let non_progressive_count = count(MotilityClass::NonProgressive);
    let immotile_count = count(MotilityClass::Immotile);

    // Never report more than 100% if the caller undercounts
    let denominator = total_detected.max(tracks.len() + excluded);

    CasaSummary {
        track_count: tracks.len(),
        total_detected_tracks: total_detected,
        excluded_tracks: excluded,
        mean_vcl,
        mean_vsl,
        mean_vap,
        mean_alh: column(|r| r.alh),
        mean_bcf: column(|r| r.bcf),
        linearity: ratio_of_means(mean_vsl, mean_vcl),
        straightness: ratio_of_means(mean_vsl, mean_vap),
        wobble: ratio_of_means(mean_vap, mean_vcl),
        motility_percent: percentage(progressive_count + non_progressive_count, denominator),
        progressive_percent: percentage(progressive_count, denominator),
        progressive_count,
        non_progressive_count,
        immotile_count,
        quality_score: column(|r| r.quality_score),
    }
}

fn ratio_of_means(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    unit_ratio(numerator?, denominator?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn result(
        track_id: u32,
        vcl: f64,
        vsl: f64,
        vap: f64,
        motility: MotilityClass,
    ) -> CasaTrackResult {
        CasaTrackResult {
            track_id,
            point_count: 10,
            duration: 1.0,
            vcl,
            vsl,
            vap,
            alh: 1.0,
            bcf: 10.0,
            linearity: unit_ratio(vsl, vcl),
            straightness: unit_ratio(vsl, vap),
            wobble: unit_ratio(vap, vcl),
            quality_score: 0.5,
            motility,
        }
    }

    #[test]
    fn test_summary_means_and_ratios() {
        let tracks = vec![
            result(1, 100.0, 60.0, 80.0, MotilityClass::Progressive),
            result(2, 50.0, 10.0, 30.0, MotilityClass::NonProgressive),
        ];
        let summary = summarize(&tracks, 0, 2);

        assert_eq!(summary.track_count, 2);
        assert_relative_eq!(summary.mean_vcl.unwrap(), 75.0, epsilon = 1e-12);
        assert_relative_eq!(summary.mean_vsl.unwrap(), 35.0, epsilon = 1e-12);
        assert_relative_eq!(summary.mean_vap.unwrap(), 55.0, epsilon = 1e-12);
        assert_relative_eq!(summary.linearity.unwrap(), 35.0 / 75.0, epsilon = 1e-12);
        assert_relative_eq!(summary.straightness.unwrap(), 35.0 / 55.0, epsilon = 1e-12);
        assert_relative_eq!(summary.wobble.unwrap(), 55.0 / 75.0, epsilon = 1e-12);
        assert_relative_eq!(summary.quality_score.unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_ratios_clamped_to_unit_interval() {
        // Noise can push VSL above VAP
        let tracks = vec![result(1, 40.0, 39.0, 35.0, MotilityClass::Progressive)];
        let summary = summarize(&tracks, 0, 1);
        assert_relative_eq!(summary.straightness.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentages_use_total_detected() {
        let tracks = vec![
            result(1, 100.0, 60.0, 70.0, MotilityClass::Progressive),
            result(2, 50.0, 10.0, 30.0, MotilityClass::NonProgressive),
            result(3, 2.0, 0.5, 1.0, MotilityClass::Immotile),
        ];
        // Seven more tracks were spawned and filtered out as noise
        let summary = summarize(&tracks, 0, 10);

        assert_relative_eq!(summary.motility_percent.unwrap(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(summary.progressive_percent.unwrap(), 10.0, epsilon = 1e-12);
        assert_eq!(summary.progressive_count, 1);
        assert_eq!(summary.non_progressive_count, 1);
        assert_eq!(summary.immotile_count, 1);
    }

    #[test]
    fn test_percentage_denominator_never_below_analyzed() {
        let tracks = vec![result(1, 100.0, 60.0, 70.0, MotilityClass::Progressive)];
        let summary = summarize(&tracks, 1, 0);
        assert_relative_eq!(summary.progressive_percent.unwrap(), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_summary_is_no_data() {
        let summary = summarize(&[], 0, 0);

        assert_eq!(summary.track_count, 0);
        assert_eq!(summary.mean_vcl, None);
        assert_eq!(summary.linearity, None);
        assert_eq!(summary.motility_percent, None);
        assert_eq!(summary.quality_score, None);
    }

    #[test]
    fn test_empty_summary_serializes_null() {
        let json = serde_json::to_value(summarize(&[], 0, 4)).unwrap();
        assert!(json["mean_vcl"].is_null());
        assert!(json["lin"].is_null());
        assert_eq!(json["total_detected_tracks"], 4);
        // Zero of four detected tracks analyzed is still a percentage
        assert_eq!(json["motility_percent"], 0.0);
    }
}
