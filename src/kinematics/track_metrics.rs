//! Per-track CASA kinematics.

use serde::{Deserialize, Serialize};

use super::trajectory::{
    moving_average, path_length, signed_deviations, straight_line_length, Trajectory,
};
use super::{AlhConvention, KinematicsConfig, MotilityClass};
use crate::utils::unit_ratio;

/// Deviations smaller than this (microns) are treated as lying on the average path.
const CROSSING_TOLERANCE: f64 = 1e-9;

/// Kinematic parameters of one track.
///
/// Velocities are in µm/s, ALH in µm, BCF in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasaTrackResult {
    pub track_id: u32,
    pub point_count: usize,
    /// Seconds between the first and the last point.
    pub duration: f64,
    /// Curvilinear velocity.
    pub vcl: f64,
    /// Straight-line velocity.
    pub vsl: f64,
    /// Average path velocity.
    pub vap: f64,
    /// Amplitude of lateral head displacement.
    pub alh: f64,
    /// Beat-cross frequency.
    pub bcf: f64,
    /// VSL / VCL in [0, 1], `None` for a track with no path.
    #[serde(rename = "lin")]
    pub linearity: Option<f64>,
    /// VSL / VAP in [0, 1].
    #[serde(rename = "str")]
    pub straightness: Option<f64>,
    /// VAP / VCL in [0, 1].
    #[serde(rename = "wob")]
    pub wobble: Option<f64>,
    pub quality_score: f64,
    pub motility: MotilityClass,
}

/// Compute the kinematics of one trajectory.
///
/// Returns `None` when the trajectory has fewer than two points or a non-positive
/// duration; such tracks are excluded from every metric.
pub fn compute_track_metrics(
    trajectory: &Trajectory,
    config: &KinematicsConfig,
) -> Option<CasaTrackResult> {
    let points = &trajectory.points;
    let duration = trajectory.duration();
    if points.len() < 2 || !(duration > 0.0) {
        return None;
    }

    let vcl = path_length(points) / duration;
    let vsl = straight_line_length(points) / duration;

    let average_path = moving_average(points, config.smoothing_half_window);
    let vap = path_length(&average_path) / duration;

    let deviations = signed_deviations(points, &average_path);
    let alh = lateral_amplitude(&deviations, config.alh_convention);
    let bcf = count_crossings(&deviations) as f64 / duration;

    let straightness = unit_ratio(vsl, vap);
    let motility = classify(vcl, vsl, straightness, config);

    Some(CasaTrackResult {
        track_id: trajectory.track_id,
        point_count: points.len(),
        duration,
        vcl,
        vsl,
        vap,
        alh,
        bcf,
        linearity: unit_ratio(vsl, vcl),
        straightness,
        wobble: unit_ratio(vap, vcl),
        quality_score: trajectory.quality_score,
        motility,
    })
}

/// Lateral amplitude of the raw path about the average path.
fn lateral_amplitude(deviations: &[f64], convention: AlhConvention) -> f64 {
    match convention {
        AlhConvention::HalfAmplitude => {
            deviations.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()))
        }
        AlhConvention::PeakToPeak => {
            let left = deviations.iter().fold(0.0_f64, |acc, &d| acc.max(d));
            let right = deviations.iter().fold(0.0_f64, |acc, &d| acc.min(d));
            left - right
        }
    }
}

/// Number of times the raw path crosses the average path.
///
/// Counts sign changes between successive deviations, skipping points that lie on the
/// average path.
fn count_crossings(deviations: &[f64]) -> usize {
    let mut crossings = 0;
    let mut last_side: Option<bool> = None;
    for &d in deviations {
        if d.abs() <= CROSSING_TOLERANCE {
            continue;
        }
        let side = d > 0.0;
        if let Some(previous) = last_side {
            if previous != side {
                crossings += 1;
            }
        }
        last_side = Some(side);
    }
    crossings
}

fn classify(
    vcl: f64,
    vsl: f64,
    straightness: Option<f64>,
    config: &KinematicsConfig,
) -> MotilityClass {
    if vcl <= config.motile_vcl_threshold {
        return MotilityClass::Immotile;
    }
    let straight_enough = straightness
        .map(|s| s >= config.progressive_straightness_threshold)
        .unwrap_or(false);
    if vsl >= config.progressive_vsl_threshold && straight_enough {
        MotilityClass::Progressive
    } else {
        MotilityClass::NonProgressive
    }
}
