//! Constant-velocity Kalman filter for a single 2D point.
//!
//! State is `[x, y, vx, vy]`, measurement is `[x, y]`. The transition advances one frame
//! step per `predict()`; real-world time between frames is not part of the model.

use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Noise parameters of the constant-velocity model.
///
/// All variances are fixed and strictly positive, which keeps the innovation covariance
/// invertible for the whole life of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanNoise {
    /// Process noise variance on position (small: trust the model over short horizons).
    pub process_position: f64,
    /// Process noise variance on velocity (larger: motion changes direction often).
    pub process_velocity: f64,
    /// Measurement noise variance (detector localization uncertainty).
    pub measurement: f64,
    /// Initial position variance of a freshly spawned track.
    pub initial_position: f64,
    /// Initial velocity variance of a freshly spawned track (velocity is unknown at birth).
    pub initial_velocity: f64,
}

impl Default for KalmanNoise {
    fn default() -> Self {
        Self {
            process_position: 0.1,
            process_velocity: 1.0,
            measurement: 1.0,
            initial_position: 10.0,
            initial_velocity: 100.0,
        }
    }
}

impl KalmanNoise {
    /// Every variance must be strictly positive and finite.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("process_position", self.process_position),
            ("process_velocity", self.process_velocity),
            ("measurement", self.measurement),
            ("initial_position", self.initial_position),
            ("initial_velocity", self.initial_velocity),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "Kalman noise {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Kalman filter with a constant-velocity motion model.
#[derive(Clone, Debug)]
pub struct ConstantVelocityKalman {
    /// State vector [x, y, vx, vy]
    x: Vector4<f64>,
    /// State covariance
    p: Matrix4<f64>,
    /// State transition
    f: Matrix4<f64>,
    /// Measurement matrix (observes position only)
    h: Matrix2x4<f64>,
    /// Process noise covariance
    q: Matrix4<f64>,
    /// Measurement noise covariance
    r: Matrix2<f64>,
}

impl ConstantVelocityKalman {
    /// Create a filter at the given position with zero velocity.
    pub fn new(x: f64, y: f64, noise: &KalmanNoise) -> Self {
        #[rustfmt::skip]
        let f = Matrix4::new(
            1.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let h = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );

        Self {
            x: Vector4::new(x, y, 0.0, 0.0),
            p: Matrix4::from_diagonal(&Vector4::new(
                noise.initial_position,
                noise.initial_position,
                noise.initial_velocity,
                noise.initial_velocity,
            )),
            f,
            h,
            q: Matrix4::from_diagonal(&Vector4::new(
                noise.process_position,
                noise.process_position,
                noise.process_velocity,
                noise.process_velocity,
            )),
            r: Matrix2::from_diagonal(&Vector2::new(noise.measurement, noise.measurement)),
        }
    }

    /// Advance the state by one frame step and return the predicted position.
    pub fn predict(&mut self) -> (f64, f64) {
        // x = F @ x
        self.x = self.f * self.x;

        // P = F @ P @ F.T + Q
        self.p = self.f * self.p * self.f.transpose() + self.q;

        self.position()
    }

    /// Correct the state with a position measurement.
    pub fn correct(&mut self, zx: f64, zy: f64) {
        let z = Vector2::new(zx, zy);

        // y = z - H @ x (innovation)
        let innovation = z - self.h * self.x;

        // S = H @ P @ H.T + R (innovation covariance)
        let s = self.h * self.p * self.h.transpose() + self.r;

        // KalmanNoise::validate keeps R positive definite, so S is invertible unless P has
        // been corrupted. Release builds skip the update.
        let s_inv = s.try_inverse();
        debug_assert!(s_inv.is_some(), "singular innovation covariance {:?}", s);
        let Some(s_inv) = s_inv else {
            return;
        };

        // K = P @ H.T @ S^-1 (Kalman gain)
        let k = self.p * self.h.transpose() * s_inv;

        // x = x + K @ y
        self.x += k * innovation;

        // P = (I - K @ H) @ P
        self.p = (Matrix4::identity() - k * self.h) * self.p;
    }

    /// Current position estimate `(x, y)`.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.x[0], self.x[1])
    }

    /// Current velocity estimate `(vx, vy)`, in units per frame step.
    #[inline]
    pub fn velocity(&self) -> (f64, f64) {
        (self.x[2], self.x[3])
    }

    /// Full state vector `[x, y, vx, vy]`.
    pub fn state(&self) -> &Vector4<f64> {
        &self.x
    }

    /// State covariance.
    pub fn covariance(&self) -> &Matrix4<f64> {
        &self.p
    }
}
