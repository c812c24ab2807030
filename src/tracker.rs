//! Main tracker implementation.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::distances::cost_matrix;
use crate::filter::KalmanNoise;
use crate::matching::match_tracks_and_detections;
use crate::{Detection, Error, FrameDetections, Result, Track};

/// Configuration for the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track may go without an accepted detection before it is terminated.
    pub max_missed_frames: u32,

    /// Maximum distance (pixels) between a predicted position and a detection for a match.
    /// Beyond it the detection is treated as a new object.
    pub max_match_distance: f64,

    /// Minimum duration (seconds) for a track to count as a real object.
    pub min_track_duration: f64,

    /// Minimum number of committed points for a track to count as a real object.
    pub min_track_points: usize,

    /// Speed (tracker units per second) mapped to a quality score of 1.
    pub quality_reference_speed: f64,

    /// Kalman filter noise parameters shared by every track.
    pub noise: KalmanNoise,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_missed_frames: 8,
            max_match_distance: 60.0,
            min_track_duration: 0.5,
            min_track_points: 3,
            quality_reference_speed: 50.0,
            noise: KalmanNoise::default(),
        }
    }
}

impl TrackerConfig {
    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_match_distance.is_finite() && self.max_match_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_match_distance must be positive and finite, got {}",
                self.max_match_distance
            )));
        }
        if !(self.min_track_duration.is_finite() && self.min_track_duration >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_track_duration must be non-negative and finite, got {}",
                self.min_track_duration
            )));
        }
        if self.min_track_points == 0 {
            return Err(Error::InvalidConfig(
                "min_track_points must be at least 1".to_string(),
            ));
        }
        if !(self.quality_reference_speed.is_finite() && self.quality_reference_speed > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "quality_reference_speed must be positive and finite, got {}",
                self.quality_reference_speed
            )));
        }
        self.noise.validate()
    }
}

/// Summary of one processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    /// Index of the processed frame.
    pub frame_index: u64,
    /// Tracks corrected with a detection.
    pub matched: usize,
    /// Tracks spawned from unmatched detections.
    pub spawned: usize,
    /// Solver pairs rejected by the distance gate.
    pub rejected: usize,
    /// Tracks removed from the live set this frame.
    pub terminated: usize,
    /// Live tracks after the frame.
    pub active: usize,
}

/// Multi-object tracker.
///
/// Maintains the live set of tracks across frames, matching new detections to predicted
/// track positions and managing track lifecycles. Frames must arrive in strictly
/// increasing timestamp order.
pub struct Tracker {
    /// Tracker configuration.
    pub config: TrackerConfig,

    /// Live tracks.
    tracks: Vec<Track>,

    /// Terminated tracks that passed the duration and point-count thresholds.
    finished: Vec<Track>,

    /// Next track ID to issue; IDs are never reused.
    next_id: u32,

    /// Terminated tracks dropped as noise.
    discarded: usize,

    frames_processed: u64,
    last_timestamp: Option<f64>,
}

impl Tracker {
    /// Create a new tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            tracks: Vec::new(),
            finished: Vec::new(),
            next_id: 1,
            discarded: 0,
            frames_processed: 0,
            last_timestamp: None,
        })
    }

    /// Update the tracker with the detections of the next frame.
    ///
    /// # Errors
    /// Fails without touching tracker state if the frame contains non-finite values or its
    /// timestamp does not strictly follow the previous frame's.
    pub fn update(&mut self, frame: &FrameDetections) -> Result<FrameUpdate> {
        frame.validate()?;
        if let Some(previous) = self.last_timestamp {
            if frame.timestamp <= previous {
                return Err(Error::NonMonotonicTimestamp {
                    previous,
                    current: frame.timestamp,
                });
            }
        }
        self.last_timestamp = Some(frame.timestamp);
        self.frames_processed += 1;

        let t = frame.timestamp;
        let detections = &frame.detections;
        let mut update = FrameUpdate {
            frame_index: frame.frame_index,
            ..FrameUpdate::default()
        };

        if self.tracks.is_empty() {
            // Nothing to associate with: every detection starts a track
            for detection in detections {
                self.spawn(detection, t);
            }
            update.spawned = detections.len();
        } else if detections.is_empty() {
            for track in &mut self.tracks {
                track.predict();
                track.mark_missed();
            }
        } else {
            for track in &mut self.tracks {
                track.predict();
            }
            let predictions: Vec<(f64, f64)> =
                self.tracks.iter().map(Track::predicted_position).collect();
            let cost = cost_matrix(&predictions, detections);
            let matches = match_tracks_and_detections(&cost, self.config.max_match_distance);

            for pair in &matches.matches {
                let detection = &detections[pair.col_idx];
                self.tracks[pair.row_idx].correct(
                    detection.x,
                    detection.y,
                    t,
                    self.config.quality_reference_speed,
                );
            }
            for &row in &matches.unmatched_tracks {
                self.tracks[row].mark_missed();
            }
            for &col in &matches.unmatched_detections {
                self.spawn(&detections[col], t);
            }

            if matches.rejected > 0 {
                debug!(
                    frame = frame.frame_index,
                    rejected = matches.rejected,
                    max_distance = self.config.max_match_distance,
                    "rejected over-threshold matches"
                );
            }

            update.matched = matches.matches.len();
            update.spawned = matches.unmatched_detections.len();
            update.rejected = matches.rejected;
        }

        update.terminated = self.prune();
        update.active = self.tracks.len();

        trace!(
            frame = frame.frame_index,
            t,
            detections = detections.len(),
            matched = update.matched,
            spawned = update.spawned,
            active = update.active,
            "processed frame"
        );

        Ok(update)
    }

    /// Live tracks.
    pub fn active_tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Terminated tracks kept for export.
    pub fn finished_tracks(&self) -> &[Track] {
        &self.finished
    }

    /// Tracks that currently qualify for kinematic analysis.
    ///
    /// Finished tracks were checked against the duration and point-count thresholds when
    /// they were terminated; live tracks are checked now.
    pub fn valid_tracks(&self) -> Vec<&Track> {
        self.finished
            .iter()
            .chain(self.tracks.iter().filter(|track| is_exportable(track, &self.config)))
            .collect()
    }

    /// Consume the tracker and return every track that qualifies for analysis.
    pub fn into_valid_tracks(self) -> Vec<Track> {
        let Tracker {
            config,
            tracks,
            mut finished,
            ..
        } = self;
        finished.extend(tracks.into_iter().filter(|track| is_exportable(track, &config)));
        finished
    }

    /// Total number of tracks ever spawned, including ones dropped as noise.
    pub fn total_track_count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    /// Current number of live tracks.
    pub fn current_track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of terminated tracks dropped as noise.
    pub fn discarded_track_count(&self) -> usize {
        self.discarded
    }

    /// Number of frames processed so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    // Internal: create a new track with the next ID
    fn spawn(&mut self, detection: &Detection, t: f64) {
        let id = self.next_id;
        self.next_id += 1;
        debug!(track_id = id, x = detection.x, y = detection.y, t, "spawned track");
        self.tracks
            .push(Track::new(id, detection, t, &self.config.noise));
    }

    // Internal: move stale tracks out of the live set. Returns how many were removed.
    fn prune(&mut self) -> usize {
        let max_missed = self.config.max_missed_frames;
        let (stale, live): (Vec<Track>, Vec<Track>) = std::mem::take(&mut self.tracks)
            .into_iter()
            .partition(|track| track.missed_frames() > max_missed);
        self.tracks = live;

        let terminated = stale.len();
        for track in stale {
            if track.points().len() >= self.config.min_track_points
                && track.duration() >= self.config.min_track_duration
            {
                debug!(
                    track_id = track.id(),
                    points = track.points().len(),
                    duration = track.duration(),
                    "track finished"
                );
                self.finished.push(track);
            } else {
                debug!(
                    track_id = track.id(),
                    points = track.points().len(),
                    duration = track.duration(),
                    "track discarded as noise"
                );
                self.discarded += 1;
            }
        }
        terminated
    }
}

/// Whether a live track passes every export threshold.
fn is_exportable(track: &Track, config: &TrackerConfig) -> bool {
    track.is_valid(config.min_track_points, config.max_missed_frames)
        && track.duration() >= config.min_track_duration
}
