//! Spatial and temporal calibration of a recording.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Calibration of one analysis run.
///
/// Converts tracked pixel positions into microns before kinematic computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Physical size of one pixel, in microns.
    pub microns_per_pixel: f64,
    /// Recording frame rate, in frames per second.
    pub fps: f64,
}

impl Calibration {
    /// Create a validated calibration.
    pub fn new(microns_per_pixel: f64, fps: f64) -> Result<Self> {
        let calibration = Self {
            microns_per_pixel,
            fps,
        };
        calibration.validate()?;
        Ok(calibration)
    }

    /// Both factors must be strictly positive and finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.microns_per_pixel.is_finite() && self.microns_per_pixel > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "microns_per_pixel must be positive and finite, got {}",
                self.microns_per_pixel
            )));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "fps must be positive and finite, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Convert a length in pixels to microns.
    #[inline]
    pub fn pixels_to_microns(&self, pixels: f64) -> f64 {
        pixels * self.microns_per_pixel
    }

    /// Convert a speed in microns per second to pixels per second.
    #[inline]
    pub fn microns_to_pixels(&self, microns: f64) -> f64 {
        microns / self.microns_per_pixel
    }
}
