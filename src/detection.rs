//! Detection input to the tracker.
//!
//! Detections are produced by an external blob detector and validated here, at the
//! boundary, before they reach the tracker.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single candidate object position in one frame, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
}

impl Detection {
    /// Create a new detection, rejecting NaN or infinite coordinates.
    pub fn new(x: f64, y: f64) -> Result<Self> {
        let detection = Self { x, y };
        detection.validate()?;
        Ok(detection)
    }

    /// Check that both coordinates are finite.
    pub fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(Error::InvalidDetection(format!(
                "coordinates must be finite, got ({}, {})",
                self.x, self.y
            )));
        }
        Ok(())
    }

    /// Position as an `(x, y)` tuple.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// All detections of one frame together with the frame's index and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    /// Index of the frame in the source video.
    pub frame_index: u64,
    /// Wall-clock time of the frame, in seconds.
    pub timestamp: f64,
    /// Detected object centroids (pixels).
    pub detections: Vec<Detection>,
}

impl FrameDetections {
    /// Create a frame from raw `[x, y]` points.
    ///
    /// # Arguments
    /// * `frame_index` - Index of the frame in the source video
    /// * `timestamp` - Frame time in seconds
    /// * `points` - Detected centroids in pixel coordinates
    pub fn new(frame_index: u64, timestamp: f64, points: Vec<[f64; 2]>) -> Result<Self> {
        let frame = Self {
            frame_index,
            timestamp,
            detections: points
                .into_iter()
                .map(|[x, y]| Detection { x, y })
                .collect(),
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Create a frame whose timestamp is derived from its index and the video frame rate.
    pub fn from_frame_index(frame_index: u64, fps: f64, points: Vec<[f64; 2]>) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "fps must be positive and finite, got {}",
                fps
            )));
        }
        Self::new(frame_index, frame_index as f64 / fps, points)
    }

    /// Validate the timestamp and every detection of the frame.
    ///
    /// Frames deserialized from external data should be validated before use.
    pub fn validate(&self) -> Result<()> {
        if !self.timestamp.is_finite() {
            return Err(Error::InvalidDetection(format!(
                "frame {} has non-finite timestamp {}",
                self.frame_index, self.timestamp
            )));
        }
        for (i, detection) in self.detections.iter().enumerate() {
            detection.validate().map_err(|_| {
                Error::InvalidDetection(format!(
                    "frame {} detection {} has non-finite coordinates ({}, {})",
                    self.frame_index, i, detection.x, detection.y
                ))
            })?;
        }
        Ok(())
    }

    /// Number of detections in this frame.
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Whether the frame has no detections.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
