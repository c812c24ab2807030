//! Track and TrackPoint: a single object's estimated state and committed history.

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::{ConstantVelocityKalman, KalmanNoise};
use crate::utils::{clamp, euclidean};
use crate::Detection;

/// A committed, timestamped position on a track.
///
/// Positions are the measured detection coordinates; the filtered estimate lives in the
/// track's state vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
    /// Time in seconds.
    pub t: f64,
    /// Instantaneous velocity from the previous point, units per second.
    /// `None` for the first point or when the elapsed time is not positive.
    pub vx: Option<f64>,
    pub vy: Option<f64>,
}

impl TrackPoint {
    /// Position as an `(x, y)` tuple.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Magnitude of the instantaneous velocity, if known.
    pub fn speed(&self) -> Option<f64> {
        match (self.vx, self.vy) {
            (Some(vx), Some(vy)) => Some(vx.hypot(vy)),
            _ => None,
        }
    }
}

/// A tracked object maintained by the tracker.
///
/// Contains the object's Kalman state, its ID, the committed point history and lifecycle
/// counters. Points are append-only and ordered by time.
#[derive(Clone)]
pub struct Track {
    /// Unique, never reused track ID.
    id: u32,

    /// Constant-velocity Kalman filter holding `[x, y, vx, vy]` and its covariance.
    filter: ConstantVelocityKalman,

    /// Committed positions, time ascending.
    points: Vec<TrackPoint>,

    /// Consecutive frames without an accepted detection.
    missed_frames: u32,

    /// Frames since the track was spawned.
    age: u32,

    /// Heuristic motion score in [0, 1], see [`Track::quality_score`].
    quality_score: f64,

    // Running sums for the quality score
    speed_sum: f64,
    speed_count: usize,

    /// Position returned by the most recent prediction.
    predicted: (f64, f64),
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("state", &self.filter.state())
            .field("points", &self.points.len())
            .field("missed_frames", &self.missed_frames)
            .field("age", &self.age)
            .field("quality_score", &self.quality_score)
            .finish()
    }
}

impl Track {
    /// Spawn a track from an unmatched detection.
    ///
    /// # Arguments
    /// * `id` - ID issued by the owning tracker
    /// * `detection` - The detection that starts the track
    /// * `t` - Frame time in seconds
    /// * `noise` - Kalman noise parameters
    pub fn new(id: u32, detection: &Detection, t: f64, noise: &KalmanNoise) -> Self {
        let filter = ConstantVelocityKalman::new(detection.x, detection.y, noise);
        Self {
            id,
            filter,
            points: vec![TrackPoint {
                x: detection.x,
                y: detection.y,
                t,
                vx: None,
                vy: None,
            }],
            missed_frames: 0,
            age: 0,
            quality_score: 0.0,
            speed_sum: 0.0,
            speed_count: 0,
            predicted: detection.position(),
        }
    }

    /// Advance the filter one frame step and return the predicted position.
    ///
    /// Committed history is not touched.
    pub fn predict(&mut self) -> (f64, f64) {
        self.age += 1;
        self.predicted = self.filter.predict();
        self.predicted
    }

    /// Correct the track with an accepted detection.
    ///
    /// Applies the Kalman update, resets the miss counter, appends a point with its
    /// instantaneous velocity and refreshes the quality score.
    ///
    /// # Arguments
    /// * `x`, `y` - Measured position
    /// * `t` - Frame time in seconds
    /// * `reference_speed` - Speed (units per second) that maps to a quality score of 1
    pub fn correct(&mut self, x: f64, y: f64, t: f64, reference_speed: f64) {
        self.filter.correct(x, y);
        self.missed_frames = 0;

        let (vx, vy) = match self.points.last() {
            Some(prev) if t - prev.t > 0.0 => {
                let dt = t - prev.t;
                (Some((x - prev.x) / dt), Some((y - prev.y) / dt))
            }
            _ => (None, None),
        };

        let point = TrackPoint { x, y, t, vx, vy };
        if let Some(speed) = point.speed() {
            self.speed_sum += speed;
            self.speed_count += 1;
        }
        self.points.push(point);

        self.quality_score = if self.speed_count == 0 || reference_speed <= 0.0 {
            0.0
        } else {
            let mean_speed = self.speed_sum / self.speed_count as f64;
            clamp(mean_speed / reference_speed, 0.0, 1.0)
        };
    }

    /// Record a frame without an accepted detection.
    pub fn mark_missed(&mut self) {
        self.missed_frames += 1;
    }

    /// Track ID.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Committed points, time ascending.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Consecutive frames without an accepted detection.
    #[inline]
    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    /// Frames since the track was spawned.
    #[inline]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Heuristic motion score in `[0, 1]`.
    ///
    /// Mean instantaneous speed over all successive point pairs, divided by the reference
    /// speed and clamped. A stationary track scores near 0 and a fast one near 1. This is
    /// not a statistical confidence.
    #[inline]
    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    /// Full state vector `[x, y, vx, vy]`.
    pub fn state_vector(&self) -> &Vector4<f64> {
        self.filter.state()
    }

    /// State covariance.
    pub fn covariance(&self) -> &Matrix4<f64> {
        self.filter.covariance()
    }

    /// Current position estimate from the filter.
    pub fn position(&self) -> (f64, f64) {
        self.filter.position()
    }

    /// Position returned by the most recent prediction (the spawn position before any).
    pub fn predicted_position(&self) -> (f64, f64) {
        self.predicted
    }

    /// Current velocity, read from the state vector (units per frame step).
    pub fn current_velocity(&self) -> (f64, f64) {
        self.filter.velocity()
    }

    /// Time between the first and the last committed point, in seconds.
    pub fn duration(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }

    /// Sum of consecutive point-to-point distances, in the units of the points.
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| euclidean(w[0].position(), w[1].position()))
            .sum()
    }

    /// Whether the track has enough points and is within the miss tolerance.
    pub fn is_valid(&self, min_points: usize, max_missed_frames: u32) -> bool {
        self.points.len() >= min_points && self.missed_frames <= max_missed_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn(x: f64, y: f64, t: f64) -> Track {
        Track::new(1, &Detection::new(x, y).unwrap(), t, &KalmanNoise::default())
    }

    #[test]
    fn test_track_new() {
        let track = spawn(10.0, 20.0, 0.5);

        assert_eq!(track.id(), 1);
        assert_eq!(track.points().len(), 1);
        assert_eq!(track.points()[0].vx, None);
        assert_eq!(track.missed_frames(), 0);
        assert_eq!(track.position(), (10.0, 20.0));
        assert_eq!(track.current_velocity(), (0.0, 0.0));
        assert_relative_eq!(track.duration(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(track.quality_score(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_does_not_touch_history() {
        let mut track = spawn(0.0, 0.0, 0.0);
        track.predict();
        track.predict();

        assert_eq!(track.points().len(), 1);
        assert_eq!(track.age(), 2);
    }

    #[test]
    fn test_correct_appends_point_with_velocity() {
        let mut track = spawn(0.0, 0.0, 0.0);
        track.mark_missed();

        track.predict();
        track.correct(3.0, 4.0, 0.5, 50.0);

        assert_eq!(track.missed_frames(), 0, "correction resets the miss counter");
        assert_eq!(track.points().len(), 2);

        let last = track.points()[1];
        assert_relative_eq!(last.vx.unwrap(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(last.vy.unwrap(), 8.0, epsilon = 1e-12);
        assert_relative_eq!(last.speed().unwrap(), 10.0, epsilon = 1e-12);

        // Mean speed 10 against reference 50
        assert_relative_eq!(track.quality_score(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_correct_with_zero_dt_leaves_velocity_unset() {
        let mut track = spawn(0.0, 0.0, 1.0);
        track.predict();
        track.correct(1.0, 1.0, 1.0, 50.0);

        let last = track.points()[1];
        assert_eq!(last.vx, None);
        assert_eq!(last.vy, None);
        assert_relative_eq!(track.quality_score(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quality_score_saturates() {
        let mut track = spawn(0.0, 0.0, 0.0);
        for i in 1..5 {
            track.predict();
            track.correct(100.0 * i as f64, 0.0, 0.1 * i as f64, 50.0);
        }
        // 1000 units/s against reference 50
        assert_relative_eq!(track.quality_score(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stationary_quality_near_zero() {
        let mut track = spawn(5.0, 5.0, 0.0);
        for i in 1..10 {
            track.predict();
            track.correct(5.0, 5.0, 0.04 * i as f64, 50.0);
        }
        assert!(track.quality_score() < 1e-9);
    }

    #[test]
    fn test_predicted_position_follows_predict() {
        let mut track = spawn(0.0, 0.0, 0.0);
        assert_eq!(track.predicted_position(), (0.0, 0.0), "spawn position before any prediction");

        for i in 1..=6 {
            track.predict();
            track.correct(4.0 * i as f64, 0.0, 0.04 * i as f64, 50.0);
        }
        let predicted = track.predict();

        assert_eq!(track.predicted_position(), predicted);
        assert!(predicted.0 > 24.0, "extrapolates along the motion: {:?}", predicted);
    }

    #[test]
    fn test_duration_and_path_length() {
        let mut track = spawn(0.0, 0.0, 0.0);
        track.predict();
        track.correct(3.0, 4.0, 0.04, 50.0);
        track.predict();
        track.correct(3.0, 10.0, 0.08, 50.0);

        assert_relative_eq!(track.duration(), 0.08, epsilon = 1e-12);
        assert_relative_eq!(track.path_length(), 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_current_velocity_reads_state() {
        let mut track = spawn(0.0, 0.0, 0.0);
        for i in 1..=12 {
            track.predict();
            track.correct(2.0 * i as f64, 0.0, 0.04 * i as f64, 50.0);
        }
        // Per frame step, not per second
        let (vx, vy) = track.current_velocity();
        assert!((vx - 2.0).abs() < 0.3, "vx = {}", vx);
        assert!(vy.abs() < 1e-9);
        assert_eq!(track.state_vector()[2], vx);
    }

    #[test]
    fn test_is_valid() {
        let mut track = spawn(0.0, 0.0, 0.0);
        assert!(!track.is_valid(3, 8));

        for i in 1..3 {
            track.predict();
            track.correct(i as f64, 0.0, 0.04 * i as f64, 50.0);
        }
        assert!(track.is_valid(3, 8));

        for _ in 0..9 {
            track.mark_missed();
        }
        assert!(!track.is_valid(3, 8));
    }
}
