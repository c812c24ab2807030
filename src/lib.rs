//! # casa-track - Motion tracking and CASA kinematics
//!
//! Multi-object tracking of point detections across a frame sequence, and derivation of
//! Computer-Assisted Sperm Analysis (CASA) motility parameters from the resulting tracks.
//!
//! ## Features
//!
//! - Constant-velocity Kalman filter per tracked object
//! - Optimal frame-to-frame association with the Hungarian (Kuhn-Munkres) algorithm
//! - Track lifecycle management (spawn, miss tolerance, termination, noise pruning)
//! - Per-track VCL, VSL, VAP, ALH, BCF and aggregate LIN, STR, WOB, motility percentages
//!
//! ## Example
//!
//! ```rust,ignore
//! use casa_track::{AnalysisConfig, Calibration, CasaAnalysis, FrameDetections};
//!
//! let calibration = Calibration::new(0.5, 25.0)?;
//! let analysis = CasaAnalysis::new(calibration, AnalysisConfig::default())?;
//!
//! let frames = vec![
//!     FrameDetections::from_frame_index(0, 25.0, vec![[100.0, 100.0]])?,
//!     FrameDetections::from_frame_index(1, 25.0, vec![[102.0, 101.0]])?,
//! ];
//! let result = analysis.run(frames)?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod analysis;
pub mod assignment;
pub mod calibration;
pub mod detection;
pub mod distances;
pub mod filter;
pub mod kinematics;
pub mod matching;
pub mod track;
pub mod tracker;
pub mod utils;

// Re-exports for convenience
pub use analysis::{AnalysisConfig, CasaAnalysis, FrameProgress};
pub use calibration::Calibration;
pub use detection::{Detection, FrameDetections};
pub use filter::{ConstantVelocityKalman, KalmanNoise};
pub use kinematics::{
    AlhConvention, CasaResult, CasaSummary, CasaTrackResult, KinematicsConfig, MotilityClass,
    Trajectory,
};
pub use track::{Track, TrackPoint};
pub use tracker::{Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur at the casa-track API boundary.
    ///
    /// Degenerate numeric situations (zero-duration tracks, no exportable tracks) are
    /// valid analysis outcomes and never surface here.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid calibration: {0}")]
        InvalidCalibration(String),

        #[error("Invalid detection: {0}")]
        InvalidDetection(String),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Frame timestamp {current} does not follow previous timestamp {previous}")]
        NonMonotonicTimestamp { previous: f64, current: f64 },

        #[error("Analysis cancelled after {frames_processed} frames")]
        Cancelled { frames_processed: u64 },

        #[error("Configuration parse error: {0}")]
        ConfigParse(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for casa-track operations
    pub type Result<T> = std::result::Result<T, Error>;
}
