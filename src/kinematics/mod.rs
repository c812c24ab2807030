//! CASA kinematics over finalized tracks.
//!
//! Tracks are converted to microns ([`Trajectory`]), measured one by one
//! ([`compute_track_metrics`]) and summarized ([`summarize`]). Analysis is a pure batch
//! computation: tracks are processed in parallel and the output order follows the input.

mod summary;
mod track_metrics;
mod trajectory;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub use summary::{summarize, CasaResult, CasaSummary};
pub use track_metrics::{compute_track_metrics, CasaTrackResult};
pub use trajectory::{
    moving_average, path_length, signed_deviations, straight_line_length, Trajectory,
};

/// Largest accepted `smoothing_half_window`.
pub const MAX_SMOOTHING_HALF_WINDOW: usize = 100;

/// How ALH is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlhConvention {
    /// Largest unsigned perpendicular deviation of the raw path from the average path.
    #[default]
    HalfAmplitude,
    /// Largest deviation on the left plus the largest on the right.
    PeakToPeak,
}

/// Motility grade of a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotilityClass {
    Progressive,
    NonProgressive,
    Immotile,
}

/// Parameters of the kinematic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Points on each side of the centered moving average that defines the average path.
    pub smoothing_half_window: usize,
    pub alh_convention: AlhConvention,
    /// A track is motile when its VCL exceeds this (µm/s).
    pub motile_vcl_threshold: f64,
    /// Minimum VSL of a progressive track (µm/s).
    pub progressive_vsl_threshold: f64,
    /// Minimum straightness (VSL / VAP) of a progressive track.
    pub progressive_straightness_threshold: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            smoothing_half_window: 3,
            alh_convention: AlhConvention::HalfAmplitude,
            motile_vcl_threshold: 5.0,
            progressive_vsl_threshold: 25.0,
            progressive_straightness_threshold: 0.8,
        }
    }
}

impl KinematicsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SMOOTHING_HALF_WINDOW).contains(&self.smoothing_half_window) {
            return Err(Error::InvalidConfig(format!(
                "smoothing_half_window must be in [1, {}], got {}",
                MAX_SMOOTHING_HALF_WINDOW, self.smoothing_half_window
            )));
        }
        for (name, value) in [
            ("motile_vcl_threshold", self.motile_vcl_threshold),
            ("progressive_vsl_threshold", self.progressive_vsl_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.progressive_straightness_threshold) {
            return Err(Error::InvalidConfig(format!(
                "progressive_straightness_threshold must be in [0, 1], got {}",
                self.progressive_straightness_threshold
            )));
        }
        Ok(())
    }
}

/// Compute per-track and aggregate kinematics.
///
/// Trajectories with fewer than two points or a non-positive duration are left out of
/// every metric and counted in `excluded_tracks`.
///
/// # Arguments
/// * `trajectories` - Exported tracks in microns and seconds
/// * `total_detected` - Every track the tracker spawned, the denominator of the percentages
/// * `config` - Analysis parameters
pub fn analyze_trajectories(
    trajectories: &[Trajectory],
    total_detected: usize,
    config: &KinematicsConfig,
) -> CasaResult {
    let computed: Vec<Option<CasaTrackResult>> = trajectories
        .par_iter()
        .map(|trajectory| compute_track_metrics(trajectory, config))
        .collect();

    let mut tracks = Vec::with_capacity(computed.len());
    for (trajectory, result) in trajectories.iter().zip(computed) {
        match result {
            Some(result) => tracks.push(result),
            None => debug!(
                track_id = trajectory.track_id,
                points = trajectory.points.len(),
                duration = trajectory.duration(),
                "Excluding track with degenerate duration"
            ),
        }
    }

    let excluded = trajectories.len() - tracks.len();
    let summary = summarize(&tracks, excluded, total_detected);
    CasaResult { summary, tracks }
}
