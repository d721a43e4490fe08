//! SciPy optimization functions port.
//!
//! Ported from scipy.optimize.linear_sum_assignment (rectangular_lsap.cpp)
//! License: BSD 3-Clause (SciPy Developers)
#![allow(clippy::needless_range_loop)]

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Represents a match between a row index and column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Assignment {
    pub row_idx: usize,
    pub col_idx: usize,
}

/// Result of linear sum assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentResult {
    /// Assigned (row, col) pairs, sorted by row index
    pub assignments: Vec<Assignment>,
    /// Indices of rows that were not matched
    pub unmatched_rows: Vec<usize>,
    /// Indices of columns that were not matched
    pub unmatched_cols: Vec<usize>,
}

impl AssignmentResult {
    fn empty(num_rows: usize, num_cols: usize) -> Self {
        Self {
            assignments: Vec::new(),
            unmatched_rows: (0..num_rows).collect(),
            unmatched_cols: (0..num_cols).collect(),
        }
    }

    /// Sum of the costs of all assigned pairs.
    pub fn total_cost(&self, cost_matrix: &DMatrix<f64>) -> f64 {
        self.assignments
            .iter()
            .map(|a| cost_matrix[(a.row_idx, a.col_idx)])
            .sum()
    }
}

/// Solve the rectangular linear sum assignment problem.
///
/// Finds exactly `min(n_rows, n_cols)` (row, col) pairs, no row or column used
/// twice, with minimum total cost. This is a port of
/// scipy.optimize.linear_sum_assignment, which uses the shortest augmenting
/// path method of Jonker-Volgenant as described by Crouse (2016).
///
/// # Arguments
/// * `cost_matrix` - Cost matrix where `cost[(i, j)]` is the cost of assigning row i to column j
///
/// # Returns
/// AssignmentResult with assignments sorted by row index, or an error if the
/// matrix contains NaN / negative infinity or admits no complete matching.
///
/// # Determinism
/// Columns are scanned in a fixed order and ties prefer unassigned columns,
/// so the same matrix always yields the same assignment.
pub fn linear_sum_assignment(cost_matrix: &DMatrix<f64>) -> Result<AssignmentResult> {
    let (num_rows, num_cols) = cost_matrix.shape();
    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult::empty(num_rows, num_cols));
    }

    if cost_matrix.iter().any(|&c| c.is_nan() || c == f64::NEG_INFINITY) {
        return Err(Error::Assignment(
            "cost matrix contains NaN or -inf entries".to_string(),
        ));
    }

    // The solver needs at least as many columns as rows.
    let transposed = num_cols < num_rows;
    let cost = if transposed {
        cost_matrix.transpose()
    } else {
        cost_matrix.clone()
    };

    let col4row = solve(&cost)?;

    let mut assignments: Vec<Assignment> = col4row
        .iter()
        .enumerate()
        .map(|(row, &col)| {
            if transposed {
                Assignment { row_idx: col, col_idx: row }
            } else {
                Assignment { row_idx: row, col_idx: col }
            }
        })
        .collect();
    assignments.sort();

    let mut matched_rows = vec![false; num_rows];
    let mut matched_cols = vec![false; num_cols];
    for a in &assignments {
        matched_rows[a.row_idx] = true;
        matched_cols[a.col_idx] = true;
    }

    let unmatched_rows: Vec<usize> = (0..num_rows).filter(|&i| !matched_rows[i]).collect();
    let unmatched_cols: Vec<usize> = (0..num_cols).filter(|&j| !matched_cols[j]).collect();

    Ok(AssignmentResult {
        assignments,
        unmatched_rows,
        unmatched_cols,
    })
}

/// Shortest augmenting path solver for `n_rows <= n_cols`.
///
/// Returns `col4row`, the column assigned to each row.
fn solve(cost: &DMatrix<f64>) -> Result<Vec<usize>> {
    let (nr, nc) = cost.shape();

    // Dual variables
    let mut u = vec![0.0; nr];
    let mut v = vec![0.0; nc];

    let mut shortest_path_costs = vec![f64::INFINITY; nc];
    let mut path: Vec<Option<usize>> = vec![None; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut visited_rows = vec![false; nr];
    let mut visited_cols = vec![false; nc];
    let mut remaining = vec![0usize; nc];

    for cur_row in 0..nr {
        let mut min_val = 0.0;
        let sink = augmenting_path(
            cost,
            &u,
            &v,
            &mut path,
            &row4col,
            &mut shortest_path_costs,
            cur_row,
            &mut visited_rows,
            &mut visited_cols,
            &mut remaining,
            &mut min_val,
        )
        .ok_or_else(|| Error::Assignment("cost matrix is infeasible".to_string()))?;

        // Update dual variables
        u[cur_row] += min_val;
        for i in 0..nr {
            if visited_rows[i] && i != cur_row {
                if let Some(j) = col4row[i] {
                    u[i] += min_val - shortest_path_costs[j];
                }
            }
        }
        for j in 0..nc {
            if visited_cols[j] {
                v[j] -= min_val - shortest_path_costs[j];
            }
        }

        // Augment previous solution
        let mut j = sink;
        loop {
            let i = path[j].ok_or_else(|| {
                Error::Assignment("broken augmenting path".to_string())
            })?;
            row4col[j] = Some(i);
            let previous = col4row[i].replace(j);
            if i == cur_row {
                break;
            }
            j = previous.ok_or_else(|| {
                Error::Assignment("broken augmenting path".to_string())
            })?;
        }
    }

    col4row
        .into_iter()
        .map(|c| c.ok_or_else(|| Error::Assignment("row left unassigned".to_string())))
        .collect()
}

/// Dijkstra-like search for the cheapest augmenting path starting at `start_row`.
///
/// Returns the sink column, or None when every remaining column is unreachable.
#[allow(clippy::too_many_arguments)]
fn augmenting_path(
    cost: &DMatrix<f64>,
    u: &[f64],
    v: &[f64],
    path: &mut [Option<usize>],
    row4col: &[Option<usize>],
    shortest_path_costs: &mut [f64],
    start_row: usize,
    visited_rows: &mut [bool],
    visited_cols: &mut [bool],
    remaining: &mut [usize],
    min_val: &mut f64,
) -> Option<usize> {
    let nc = cost.ncols();

    // Reverse order keeps tie-breaking identical to scipy.
    let mut num_remaining = nc;
    for it in 0..nc {
        remaining[it] = nc - it - 1;
    }

    visited_rows.fill(false);
    visited_cols.fill(false);
    shortest_path_costs.fill(f64::INFINITY);

    let mut i = start_row;
    loop {
        let mut index = None;
        let mut lowest = f64::INFINITY;
        visited_rows[i] = true;

        for it in 0..num_remaining {
            let j = remaining[it];

            let r = *min_val + cost[(i, j)] - u[i] - v[j];
            if r < shortest_path_costs[j] {
                path[j] = Some(i);
                shortest_path_costs[j] = r;
            }

            // Prefer unassigned columns on ties so the search terminates early.
            if shortest_path_costs[j] < lowest
                || (shortest_path_costs[j] == lowest && row4col[j].is_none())
            {
                lowest = shortest_path_costs[j];
                index = Some(it);
            }
        }

        *min_val = lowest;
        if *min_val == f64::INFINITY {
            return None;
        }
        let index = index?;

        let j = remaining[index];
        visited_cols[j] = true;
        num_remaining -= 1;
        remaining[index] = remaining[num_remaining];

        match row4col[j] {
            None => return Some(j),
            Some(next_row) => i = next_row,
        }
    }
}
