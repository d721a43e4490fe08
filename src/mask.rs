//! Binary masks and label maps.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Binary mask, shape (height, width); any nonzero value is foreground.
pub type BinaryMask = DMatrix<u8>;

/// Per-pixel integer labels, shape (height, width).
pub type LabelMap = DMatrix<u32>;

/// Number of foreground pixels in a mask.
pub fn foreground_area(mask: &BinaryMask) -> usize {
    mask.iter().filter(|&&v| v != 0).count()
}

/// Intersection over union of two binary masks.
///
/// Two empty masks have IoU 0, so an empty prediction is never preferred for
/// an empty region.
pub fn mask_iou(a: &BinaryMask, b: &BinaryMask) -> Result<f64> {
    check_same_shape(a.shape(), b.shape())?;

    let mut intersection = 0usize;
    let mut union = 0usize;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        let (fa, fb) = (va != 0, vb != 0);
        if fa && fb {
            intersection += 1;
        }
        if fa || fb {
            union += 1;
        }
    }

    if union == 0 {
        return Ok(0.0);
    }
    Ok(intersection as f64 / union as f64)
}

/// Mask of the pixels carrying `label`.
pub fn label_mask(labels: &LabelMap, label: u32) -> BinaryMask {
    labels.map(|v| u8::from(v == label))
}

/// Fail with `ShapeMismatch` unless both shapes are equal.
pub fn check_same_shape(expected: (usize, usize), got: (usize, usize)) -> Result<()> {
    if expected != got {
        return Err(Error::ShapeMismatch { expected, got });
    }
    Ok(())
}
