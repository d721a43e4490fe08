//! Predicted-mask to ground-truth-region matching.

use nalgebra::DMatrix;

use crate::internal::scipy::linear_sum_assignment;
use crate::mask::{check_same_shape, mask_iou, BinaryMask};
use crate::{Error, Result};

/// Check if a matrix contains NaN values.
pub fn has_nan(matrix: &DMatrix<f64>) -> bool {
    matrix.iter().any(|&x| x.is_nan())
}

/// Validate a distance matrix (no NaN values allowed).
pub fn validate_distance_matrix(matrix: &DMatrix<f64>) -> Result<()> {
    if has_nan(matrix) {
        return Err(Error::Assignment("Distance matrix contains NaN values".to_string()));
    }
    Ok(())
}

/// Build the `1 - IoU` cost matrix between predicted and ground-truth masks.
///
/// # Arguments
/// * `predicted` - Predicted masks (rows)
/// * `groundtruth` - Ground-truth region masks (columns)
///
/// # Returns
/// Matrix of shape (predicted.len(), groundtruth.len()). Either side may be
/// empty; all masks must share one shape.
pub fn mask_cost_matrix(
    predicted: &[BinaryMask],
    groundtruth: &[BinaryMask],
) -> Result<DMatrix<f64>> {
    let mut cost = DMatrix::zeros(predicted.len(), groundtruth.len());

    if let Some(first) = predicted.first().or_else(|| groundtruth.first()) {
        let shape = first.shape();
        for mask in predicted.iter().chain(groundtruth) {
            check_same_shape(shape, mask.shape())?;
        }
    }

    for (i, p) in predicted.iter().enumerate() {
        for (j, g) in groundtruth.iter().enumerate() {
            cost[(i, j)] = 1.0 - mask_iou(p, g)?;
        }
    }

    Ok(cost)
}

/// Match predicted masks to ground-truth regions by minimum total `1 - IoU`.
///
/// # Returns
/// Exactly `min(N, M)` pairs `(predicted_index, groundtruth_index)`, sorted by
/// predicted index. Unmatched masks on either side are simply absent.
pub fn assign_masks(cost_matrix: &DMatrix<f64>) -> Result<Vec<(usize, usize)>> {
    validate_distance_matrix(cost_matrix)?;

    let result = linear_sum_assignment(cost_matrix)?;
    Ok(result
        .assignments
        .iter()
        .map(|a| (a.row_idx, a.col_idx))
        .collect())
}
