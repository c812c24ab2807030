//! Kalman filtering for tracked objects.
//!
//! A single concrete constant-velocity filter is used for every track; there is no
//! filter selection at runtime.

mod kalman;

pub use kalman::{ConstantVelocityKalman, KalmanNoise};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_static_object_converges() {
        let mut kf = ConstantVelocityKalman::new(1.0, 1.0, &KalmanNoise::default());

        for _ in 0..10 {
            kf.predict();
            kf.correct(1.0, 1.0);
        }

        assert_relative_eq!(kf.position().0, 1.0, epsilon = 1e-6);
        assert_relative_eq!(kf.position().1, 1.0, epsilon = 1e-6);
        assert_relative_eq!(kf.velocity().0, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_prediction_without_measurement_extrapolates() {
        let mut kf = ConstantVelocityKalman::new(0.0, 0.0, &KalmanNoise::default());
        for step in 1..=10 {
            kf.predict();
            kf.correct(0.0, 3.0 * step as f64);
        }

        // Coast three frames: position keeps advancing along the learnt velocity
        let before = kf.position().1;
        kf.predict();
        kf.predict();
        let after = kf.predict().1;
        assert!(after > before + 6.0, "expected extrapolation, {} -> {}", before, after);
    }
}
