//! Distance functions for matching detections to tracked objects.
//!
//! Cost between a track and a detection is the Euclidean distance from the track's
//! predicted position to the detection, in pixels.

use nalgebra::DMatrix;

use crate::utils::euclidean;
use crate::Detection;

/// Euclidean distance between a predicted position and a detection.
#[inline]
pub fn prediction_distance(predicted: (f64, f64), detection: &Detection) -> f64 {
    euclidean(predicted, detection.position())
}

/// Build the `tracks x detections` cost matrix.
///
/// # Arguments
/// * `predictions` - Predicted position of each track (one row per track)
/// * `detections` - Detections of the current frame (one column per detection)
pub fn cost_matrix(predictions: &[(f64, f64)], detections: &[Detection]) -> DMatrix<f64> {
    DMatrix::from_fn(predictions.len(), detections.len(), |i, j| {
        prediction_distance(predictions[i], &detections[j])
    })
}
