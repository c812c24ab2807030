//! Optimal assignment solver (Hungarian / Kuhn-Munkres).
//!
//! Solves minimum-cost bipartite matching on a rectangular cost matrix by padding it to a
//! square matrix with a sentinel cost. The solver itself has no notion of a distance
//! threshold; gating is left to the caller (see [`crate::matching`]).
#![allow(clippy::needless_range_loop)]

use nalgebra::DMatrix;

/// Cost of every padded (non-existing) row or column cell.
///
/// Large enough that a padded cell is never preferred over a real one, small enough that
/// potentials stay exact in `f64` for realistic pixel distances.
pub const PADDING_COST: f64 = 1.0e9;

/// Represents a match between a row index and column index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub row_idx: usize,
    pub col_idx: usize,
    /// Cost of the matched cell.
    pub cost: f64,
}

/// Result of a rectangular assignment with padding removed.
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    /// Real (row, col) pairs chosen by the solver
    pub assignments: Vec<Assignment>,
    /// Indices of rows that were assigned to padding
    pub unmatched_rows: Vec<usize>,
    /// Indices of columns that were assigned to padding
    pub unmatched_cols: Vec<usize>,
}

impl AssignmentResult {
    /// Sum of the costs of all real assignments.
    pub fn total_cost(&self) -> f64 {
        self.assignments.iter().map(|a| a.cost).sum()
    }
}

/// Pad a rectangular cost matrix to `k x k` with [`PADDING_COST`], `k = max(rows, cols)`.
///
/// Real cells that are not finite or exceed [`PADDING_COST`] are capped at it, so the
/// potentials stay finite and every augmenting search finds a free column.
pub fn pad_to_square(cost_matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let n_rows = cost_matrix.nrows();
    let n_cols = cost_matrix.ncols();
    let k = n_rows.max(n_cols);

    DMatrix::from_fn(k, k, |i, j| {
        if i < n_rows && j < n_cols {
            let cost = cost_matrix[(i, j)];
            if cost.is_finite() {
                cost.min(PADDING_COST)
            } else {
                PADDING_COST
            }
        } else {
            PADDING_COST
        }
    })
}

/// Solve the square assignment problem.
///
/// Returns a vector of length `k` where `result[i] = j` assigns row `i` to column `j`,
/// minimizing the total cost. Runs in `O(k^3)` using row/column potentials and shortest
/// augmenting paths. Ties resolve by scan order.
pub fn solve_square(cost: &DMatrix<f64>) -> Vec<usize> {
    let n = cost.nrows();
    debug_assert_eq!(n, cost.ncols(), "solve_square requires a square matrix");
    if n == 0 {
        return Vec::new();
    }

    // 1-based working arrays; index 0 is the virtual root column
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut col_owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut j0 = 0usize;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = col_owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < min_slack[j] {
                    min_slack[j] = reduced;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[col_owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }

            j0 = j1;
            if col_owner[j0] == 0 {
                break;
            }
        }

        // Augment along the alternating path back to the root
        loop {
            let j1 = way[j0];
            col_owner[j0] = col_owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0usize; n];
    for j in 1..=n {
        row_to_col[col_owner[j] - 1] = j - 1;
    }
    row_to_col
}

/// Solve the linear sum assignment problem on a rectangular, non-negative cost matrix.
///
/// The matrix is padded to square, solved, and padded entries are discarded.
///
/// # Arguments
/// * `cost_matrix` - Cost matrix where `cost[(i, j)]` is the cost of assigning row i to
///   column j. Infinite or NaN entries are solved as padding but reported with their
///   original cost, so a distance gate rejects them.
///
/// # Returns
/// AssignmentResult containing:
/// - assignments: every real (row, col) pair, `min(rows, cols)` of them
/// - unmatched_rows: Row indices that landed on padding
/// - unmatched_cols: Column indices that landed on padding
pub fn linear_sum_assignment(cost_matrix: &DMatrix<f64>) -> AssignmentResult {
    let n_rows = cost_matrix.nrows();
    let n_cols = cost_matrix.ncols();

    if n_rows == 0 || n_cols == 0 {
        return AssignmentResult {
            assignments: Vec::new(),
            unmatched_rows: (0..n_rows).collect(),
            unmatched_cols: (0..n_cols).collect(),
        };
    }

    let padded = pad_to_square(cost_matrix);
    let row_to_col = solve_square(&padded);

    let mut assignments = Vec::with_capacity(n_rows.min(n_cols));
    let mut matched_cols = vec![false; n_cols];
    let mut unmatched_rows = Vec::new();

    for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(n_rows) {
        if col_idx < n_cols {
            assignments.push(Assignment {
                row_idx,
                col_idx,
                cost: cost_matrix[(row_idx, col_idx)],
            });
            matched_cols[col_idx] = true;
        } else {
            unmatched_rows.push(row_idx);
        }
    }

    let unmatched_cols = (0..n_cols).filter(|&j| !matched_cols[j]).collect();

    AssignmentResult {
        assignments,
        unmatched_rows,
        unmatched_cols,
    }
}
