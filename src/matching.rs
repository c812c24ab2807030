//! Track-to-detection matching.
//!
//! Runs the optimal assignment solver on the cost matrix and then gates every chosen pair
//! against the maximum match distance. Over-threshold pairs become non-matches on both
//! sides.

use nalgebra::DMatrix;

use crate::assignment::{linear_sum_assignment, Assignment};

/// Outcome of matching one frame's detections against the live tracks.
#[derive(Debug, Clone, Default)]
pub struct FrameMatches {
    /// Accepted (track row, detection column) pairs within the distance gate
    pub matches: Vec<Assignment>,
    /// Rows of tracks without an accepted detection
    pub unmatched_tracks: Vec<usize>,
    /// Columns of detections not claimed by any accepted pair
    pub unmatched_detections: Vec<usize>,
    /// Number of solver pairs rejected by the distance gate
    pub rejected: usize,
}

/// Match tracks (rows) to detections (columns) with a distance gate.
///
/// # Arguments
/// * `cost_matrix` - Distance matrix (n_tracks x n_detections)
/// * `max_distance` - Maximum cost of an accepted pair (inclusive)
pub fn match_tracks_and_detections(cost_matrix: &DMatrix<f64>, max_distance: f64) -> FrameMatches {
    let solved = linear_sum_assignment(cost_matrix);

    let mut matches = Vec::with_capacity(solved.assignments.len());
    let mut rejected = 0;
    for assignment in solved.assignments {
        if assignment.cost <= max_distance {
            matches.push(assignment);
        } else {
            rejected += 1;
        }
    }

    let matched_rows: Vec<usize> = matches.iter().map(|a| a.row_idx).collect();
    let matched_cols: Vec<usize> = matches.iter().map(|a| a.col_idx).collect();

    FrameMatches {
        unmatched_tracks: get_unmatched(cost_matrix.nrows(), &matched_rows),
        unmatched_detections: get_unmatched(cost_matrix.ncols(), &matched_cols),
        matches,
        rejected,
    }
}

/// Get unmatched indices from a match result.
pub fn get_unmatched(total: usize, matched: &[usize]) -> Vec<usize> {
    let mut is_matched = vec![false; total];
    for &idx in matched {
        is_matched[idx] = true;
    }
    (0..total).filter(|&i| !is_matched[i]).collect()
}
