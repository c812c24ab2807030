//! End-to-end CASA analysis of a detection stream.
//!
//! [`CasaAnalysis`] feeds frames to a [`Tracker`], exports the valid tracks once the
//! stream ends, converts them to microns and computes the kinematics.

use std::ops::ControlFlow;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::kinematics::{analyze_trajectories, CasaResult, KinematicsConfig, Trajectory};
use crate::{Calibration, Error, FrameDetections, Result, Track, Tracker, TrackerConfig};

/// Configuration of a full analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub tracker: TrackerConfig,
    pub kinematics: KinematicsConfig,
    /// Speed (µm/s) at which a track's quality score saturates.
    ///
    /// Converted to pixels per second with the run's calibration; it replaces
    /// `tracker.quality_reference_speed`.
    pub quality_reference_speed_um_s: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            kinematics: KinematicsConfig::default(),
            quality_reference_speed_um_s: 50.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.kinematics.validate()?;
        let speed = self.quality_reference_speed_um_s;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "quality_reference_speed_um_s must be positive, got {}",
                speed
            )));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON configuration. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Progress of a running analysis, reported once per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProgress {
    pub frame_index: u64,
    pub frames_processed: u64,
    /// Live tracks after the frame.
    pub active_tracks: usize,
    /// Tracks spawned so far.
    pub total_tracks: usize,
}

/// A configured analysis for one video.
#[derive(Debug, Clone)]
pub struct CasaAnalysis {
    calibration: Calibration,
    config: AnalysisConfig,
}

impl CasaAnalysis {
    /// Create an analysis.
    ///
    /// # Errors
    /// Returns an error if the calibration or the configuration is invalid.
    pub fn new(calibration: Calibration, config: AnalysisConfig) -> Result<Self> {
        calibration.validate()?;
        config.validate()?;
        Ok(Self {
            calibration,
            config,
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Tracker configuration in pixel units for this calibration.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            quality_reference_speed: self
                .calibration
                .microns_to_pixels(self.config.quality_reference_speed_um_s),
            ..self.config.tracker.clone()
        }
    }

    /// Track every frame and analyze the resulting tracks.
    pub fn run<I>(&self, frames: I) -> Result<CasaResult>
    where
        I: IntoIterator<Item = FrameDetections>,
    {
        self.run_with_progress(frames, |_| ControlFlow::Continue(()))
    }

    /// Like [`run`](Self::run), invoking `on_frame` after every processed frame.
    ///
    /// Returning `ControlFlow::Break` stops the run at that frame boundary.
    ///
    /// # Errors
    /// Fails on invalid frames and returns [`Error::Cancelled`] when stopped by the
    /// callback.
    pub fn run_with_progress<I, F>(&self, frames: I, mut on_frame: F) -> Result<CasaResult>
    where
        I: IntoIterator<Item = FrameDetections>,
        F: FnMut(&FrameProgress) -> ControlFlow<()>,
    {
        let mut tracker = Tracker::new(self.tracker_config())?;

        for frame in frames {
            let update = tracker.update(&frame)?;
            let progress = FrameProgress {
                frame_index: update.frame_index,
                frames_processed: tracker.frames_processed(),
                active_tracks: update.active,
                total_tracks: tracker.total_track_count(),
            };
            if on_frame(&progress).is_break() {
                info!(
                    frames_processed = progress.frames_processed,
                    "analysis cancelled"
                );
                return Err(Error::Cancelled {
                    frames_processed: progress.frames_processed,
                });
            }
        }

        let frames_processed = tracker.frames_processed();
        let total_detected = tracker.total_track_count();
        let tracks = tracker.into_valid_tracks();
        let result = self.analyze_tracks(&tracks, total_detected);

        if result.summary.track_count == 0 {
            warn!(
                frames_processed,
                total_detected, "no track qualified for kinematic analysis"
            );
        }
        info!(
            frames_processed,
            total_detected,
            analyzed = result.summary.track_count,
            excluded = result.summary.excluded_tracks,
            mean_vcl = ?result.summary.mean_vcl,
            motility_percent = ?result.summary.motility_percent,
            "analysis complete"
        );

        Ok(result)
    }

    /// Analyze tracks exported from a tracker driven by the caller.
    ///
    /// # Arguments
    /// * `tracks` - Valid tracks in pixel space
    /// * `total_detected` - Tracks the tracker spawned in total
    pub fn analyze_tracks(&self, tracks: &[Track], total_detected: usize) -> CasaResult {
        let trajectories: Vec<Trajectory> = tracks
            .iter()
            .map(|track| Trajectory::from_track(track, &self.calibration))
            .collect();
        analyze_trajectories(&trajectories, total_detected, &self.config.kinematics)
    }
}
