//! # fbms-oracle - Oracle mask relabelling for FBMS
//!
//! Links per-frame instance segmentation predictions to the ground-truth
//! regions of the [FBMS](https://lmb.informatik.uni-freiburg.de/resources/datasets/)
//! motion segmentation benchmark and writes the result as FBMS track files.
//!
//! ## Pipeline
//!
//! - Ground truth: `Def.dat` definition files and PGM/PPM label images
//! - Detections: per-frame files holding COCO run-length encoded masks
//! - Matching: `1 - IoU` cost matrix solved with an exact linear sum assignment
//! - Painting: one label map per frame, labelled with ground-truth region ids
//! - Tracks: label maps converted to tracks and written in the FBMS text format
//!
//! ## Example
//!
//! ```rust,ignore
//! use fbms_oracle::{DataSplit, OracleConfig, SequenceProcessor};
//!
//! let processor = SequenceProcessor::new(OracleConfig::default())?;
//! processor.process_dataset("FBMS", "detections", "output", DataSplit::All)?;
//! ```

// Internal modules (ports of scipy and pycocotools)
pub(crate) mod internal;

// Public modules
pub mod config;
pub mod mask;
pub mod matching;
pub mod label_map;
pub mod tracks;
pub mod detections;
pub mod fbms;
pub mod sequence;
pub mod utils;

// Re-exports for convenience
pub use config::{DataSplit, OracleConfig};
pub use detections::{DetectionDirectory, DetectionFile};
pub use fbms::{DefinitionFile, FbmsGroundtruth};
pub use internal::pycocotools::Rle;
pub use internal::scipy::{linear_sum_assignment, Assignment, AssignmentResult};
pub use label_map::paint_label_map;
pub use mask::{BinaryMask, LabelMap};
pub use matching::{assign_masks, mask_cost_matrix};
pub use sequence::{SequenceProcessor, SequenceReport, SplitReport};
pub use tracks::{masks_to_tracks, tracks_text, Point, Track};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    /// Errors that can occur while relabelling masks and writing tracks
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Path does not exist: {}", .0.display())]
        MissingPath(PathBuf),

        #[error("Invalid ground truth: {0}")]
        InvalidGroundtruth(String),

        #[error("Background region has color {color}, expected one of {expected:?}")]
        InvalidBackground { color: u32, expected: Vec<u32> },

        #[error("Invalid detection file: {0}")]
        InvalidDetection(String),

        #[error("Invalid RLE: {0}")]
        InvalidRle(String),

        #[error("Mask shape mismatch: expected {expected:?}, got {got:?}")]
        ShapeMismatch {
            expected: (usize, usize),
            got: (usize, usize),
        },

        #[error("Assignment error: {0}")]
        Assignment(String),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        JsonError(#[from] serde_json::Error),

        #[error("YAML error: {0}")]
        YamlError(#[from] serde_yaml::Error),

        #[error("Image error: {0}")]
        ImageError(#[from] image::ImageError),
    }

    /// Result type for fbms-oracle operations
    pub type Result<T> = std::result::Result<T, Error>;
}
