//! COCO run-length encoded masks.
//!
//! Masks are stored column-major (Fortran order), which is also nalgebra's
//! storage order: pixel `(row, col)` is at index `row + height * col`. The first
//! run always counts background pixels and may be zero.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// A run-length encoded binary mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle {
    /// Mask height (rows)
    pub h: usize,
    /// Mask width (columns)
    pub w: usize,
    /// Alternating background / foreground run lengths
    pub counts: Vec<u32>,
}

impl Rle {
    /// Build an RLE from uncompressed counts, checking they cover the mask exactly.
    pub fn new(h: usize, w: usize, counts: Vec<u32>) -> Result<Self> {
        let pixels = num_pixels(h, w)?;
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total != pixels as u64 {
            return Err(Error::InvalidRle(format!(
                "run lengths sum to {} but mask has {}x{} = {} pixels",
                total, h, w, pixels
            )));
        }
        Ok(Self { h, w, counts })
    }

    /// Build an RLE from the compressed COCO string form.
    pub fn from_compressed(h: usize, w: usize, s: &str) -> Result<Self> {
        Self::new(h, w, rle_from_string(s)?)
    }

    /// Compressed COCO string form of the counts.
    pub fn to_compressed(&self) -> String {
        rle_to_string(&self.counts)
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.h, self.w)
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> u64 {
        area(self)
    }
}

/// Pixel count of an `h x w` mask.
fn num_pixels(h: usize, w: usize) -> Result<usize> {
    h.checked_mul(w)
        .ok_or_else(|| Error::InvalidRle(format!("mask size {}x{} is too large", h, w)))
}

/// Encode a binary mask; any nonzero value counts as foreground.
pub fn encode(mask: &DMatrix<u8>) -> Rle {
    let (h, w) = mask.shape();

    let mut counts = Vec::new();
    let mut previous = false;
    let mut run: u32 = 0;

    // DMatrix iterates column-major, matching the RLE pixel order.
    for &value in mask.iter() {
        let value = value != 0;
        if value != previous {
            counts.push(run);
            run = 0;
            previous = value;
        }
        run += 1;
    }
    counts.push(run);

    Rle { h, w, counts }
}

/// Decode an RLE into a binary (0/1) mask of shape (h, w).
pub fn decode(rle: &Rle) -> Result<DMatrix<u8>> {
    let n = num_pixels(rle.h, rle.w)?;
    let mut data = vec![0u8; n];
    let mut idx = 0usize;
    let mut value = 0u8;

    for &count in &rle.counts {
        let end = idx + count as usize;
        if end > n {
            return Err(Error::InvalidRle(format!(
                "run lengths overflow a {}x{} mask",
                rle.h, rle.w
            )));
        }
        data[idx..end].fill(value);
        idx = end;
        value = 1 - value;
    }

    Ok(DMatrix::from_vec(rle.h, rle.w, data))
}

/// Number of foreground pixels (sum of the odd-indexed runs).
pub fn area(rle: &Rle) -> u64 {
    rle.counts
        .iter()
        .skip(1)
        .step_by(2)
        .map(|&c| c as u64)
        .sum()
}

/// Compress run lengths into the COCO LEB128-like string.
///
/// Counts after the third are stored as the difference to the count two
/// positions earlier; each value is written in 5-bit groups with bit 5 as the
/// continuation flag, offset by 48 into printable ASCII.
pub fn rle_to_string(counts: &[u32]) -> String {
    let mut s = String::new();
    for (i, &count) in counts.iter().enumerate() {
        let mut x = count as i64;
        if i > 2 {
            x -= counts[i - 2] as i64;
        }
        loop {
            let mut c = (x & 0x1f) as u8;
            x >>= 5;
            let more = if c & 0x10 != 0 { x != -1 } else { x != 0 };
            if more {
                c |= 0x20;
            }
            s.push((c + 48) as char);
            if !more {
                break;
            }
        }
    }
    s
}

/// Decompress a COCO LEB128-like string back into run lengths.
pub fn rle_from_string(s: &str) -> Result<Vec<u32>> {
    let bytes = s.as_bytes();
    let mut counts: Vec<u32> = Vec::new();
    let mut p = 0usize;

    while p < bytes.len() {
        let mut x: i64 = 0;
        let mut k = 0u32;
        loop {
            let byte = *bytes.get(p).ok_or_else(|| {
                Error::InvalidRle("string ends in the middle of a count".to_string())
            })?;
            if !(48..48 + 64).contains(&byte) {
                return Err(Error::InvalidRle(format!(
                    "unexpected character {:?} at offset {}",
                    byte as char, p
                )));
            }
            if k >= 12 {
                return Err(Error::InvalidRle("count is too long".to_string()));
            }
            let c = (byte - 48) as i64;
            x |= (c & 0x1f) << (5 * k);
            p += 1;
            k += 1;
            if c & 0x20 == 0 {
                // Sign-extend from the last group.
                if c & 0x10 != 0 {
                    x |= -1i64 << (5 * k);
                }
                break;
            }
        }
        let m = counts.len();
        if m > 2 {
            x += counts[m - 2] as i64;
        }
        let count = u32::try_from(x)
            .map_err(|_| Error::InvalidRle(format!("run length {} out of range", x)))?;
        counts.push(count);
    }

    Ok(counts)
}
