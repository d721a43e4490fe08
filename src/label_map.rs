//! Painting matched predictions into a per-frame label map.

use crate::mask::{check_same_shape, BinaryMask, LabelMap};
use crate::{Error, Result};

/// Paint the final label map for one frame.
///
/// Starts from an all-zero map of `shape` and, for each
/// `(predicted_index, groundtruth_index)` pair in order, writes
/// `groundtruth_index + 1` on every foreground pixel of the predicted mask.
/// Overlapping predictions are resolved by paint order: the later pair wins.
///
/// # Arguments
/// * `shape` - Ground-truth frame shape (rows, cols)
/// * `assignments` - Matched pairs, usually sorted by predicted index
/// * `predicted` - Predicted masks indexed by `predicted_index`
pub fn paint_label_map(
    shape: (usize, usize),
    assignments: &[(usize, usize)],
    predicted: &[BinaryMask],
) -> Result<LabelMap> {
    let mut labels = LabelMap::zeros(shape.0, shape.1);

    for &(predicted_index, groundtruth_index) in assignments {
        let mask = predicted.get(predicted_index).ok_or_else(|| {
            Error::Assignment(format!(
                "assignment refers to predicted mask {} but only {} exist",
                predicted_index,
                predicted.len()
            ))
        })?;
        check_same_shape(shape, mask.shape())?;

        let label = groundtruth_index as u32 + 1;
        for (pixel, &value) in labels.iter_mut().zip(mask.iter()) {
            if value != 0 {
                *pixel = label;
            }
        }
    }

    Ok(labels)
}
