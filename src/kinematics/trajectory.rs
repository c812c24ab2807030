//! Trajectories in physical units and the geometry used by the kinematic metrics.

use serde::{Deserialize, Serialize};

use crate::utils::euclidean;
use crate::{Calibration, Track, TrackPoint};

/// A finalized track converted to microns, ready for kinematic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub track_id: u32,
    /// Points in microns and seconds, time ascending.
    pub points: Vec<TrackPoint>,
    /// Quality score carried over from the track.
    pub quality_score: f64,
}

impl Trajectory {
    pub fn new(track_id: u32, points: Vec<TrackPoint>, quality_score: f64) -> Self {
        Self {
            track_id,
            points,
            quality_score,
        }
    }

    /// Convert a pixel-space track into microns using the calibration.
    pub fn from_track(track: &Track, calibration: &Calibration) -> Self {
        let scale = |v: f64| calibration.pixels_to_microns(v);
        let points = track
            .points()
            .iter()
            .map(|p| TrackPoint {
                x: scale(p.x),
                y: scale(p.y),
                t: p.t,
                vx: p.vx.map(scale),
                vy: p.vy.map(scale),
            })
            .collect();
        Self::new(track.id(), points, track.quality_score())
    }

    /// Time between the first and last point, in seconds.
    pub fn duration(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}

/// Sum of consecutive point-to-point distances.
pub fn path_length(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| euclidean(w[0].position(), w[1].position()))
        .sum()
}

/// Distance between the first and the last point.
pub fn straight_line_length(points: &[TrackPoint]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => euclidean(first.position(), last.position()),
        _ => 0.0,
    }
}

/// Centered moving average of x, y and t over `±half_window` points.
///
/// The window is clamped at the track boundaries, so end points average over fewer
/// neighbours. Velocities of the smoothed points are left unset.
pub fn moving_average(points: &[TrackPoint], half_window: usize) -> Vec<TrackPoint> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half_window);
            let hi = i.saturating_add(half_window).min(n - 1);
            let window = &points[lo..=hi];
            let count = window.len() as f64;
            TrackPoint {
                x: window.iter().map(|p| p.x).sum::<f64>() / count,
                y: window.iter().map(|p| p.y).sum::<f64>() / count,
                t: window.iter().map(|p| p.t).sum::<f64>() / count,
                vx: None,
                vy: None,
            }
        })
        .collect()
}

/// Signed perpendicular deviation of every raw point from the average path.
///
/// `path` is the smoothed counterpart of `raw` (same length, same order). Each raw point
/// is compared with its own smoothed point, keeping only the component perpendicular to
/// the local direction of the average path. Positive deviations lie on the left of the
/// direction of travel, negative on the right. Where the average path has no direction
/// (a stationary stretch) the plain distance is used.
pub fn signed_deviations(raw: &[TrackPoint], path: &[TrackPoint]) -> Vec<f64> {
    debug_assert_eq!(raw.len(), path.len());
    let n = raw.len().min(path.len());
    (0..n)
        .map(|i| {
            let before = path[i.saturating_sub(1)].position();
            let after = path[(i + 1).min(n - 1)].position();
            signed_perpendicular(raw[i].position(), path[i].position(), before, after)
        })
        .collect()
}

/// Perpendicular offset of `p` from the line through `anchor` with direction `to - from`.
fn signed_perpendicular(
    p: (f64, f64),
    anchor: (f64, f64),
    from: (f64, f64),
    to: (f64, f64),
) -> f64 {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return euclidean(p, anchor);
    }
    // Cross product of the direction with the offset gives side and magnitude
    (dx * (p.1 - anchor.1) - dy * (p.0 - anchor.0)) / length
}
