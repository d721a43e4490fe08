//! Per-frame detection result files.
//!
//! Each frame of a sequence has one file `<sequence>_<frame>.<ext>` holding
//! the detector's per-class output bundle serialized as JSON:
//!
//! ```json
//! {
//!   "boxes": [[], [[x1, y1, x2, y2, score]]],
//!   "segmentations": [[], [{"size": [h, w], "counts": "PZ13..."}]],
//!   "keypoints": null
//! }
//! ```
//!
//! Only the segmentations are used. Their order after flattening the class
//! lists defines the predicted mask indices.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::internal::pycocotools::{decode, encode, Rle};
use crate::mask::BinaryMask;
use crate::utils::{file_name_str, frame_index_from_path};
use crate::{Error, Result};

/// Run lengths in either COCO string form or as a plain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RleCounts {
    Compressed(String),
    Uncompressed(Vec<u32>),
}

/// A COCO RLE object as stored in detection files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RleObject {
    /// [height, width]
    pub size: [usize; 2],
    pub counts: RleCounts,
}

impl RleObject {
    /// Convert to an `Rle`, decompressing string counts.
    pub fn to_rle(&self) -> Result<Rle> {
        let [h, w] = self.size;
        match &self.counts {
            RleCounts::Compressed(s) => Rle::from_compressed(h, w, s),
            RleCounts::Uncompressed(counts) => Rle::new(h, w, counts.clone()),
        }
    }
}

impl From<&Rle> for RleObject {
    fn from(rle: &Rle) -> Self {
        Self {
            size: [rle.h, rle.w],
            counts: RleCounts::Compressed(rle.to_compressed()),
        }
    }
}

/// Detector output for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFile {
    /// Per-class boxes; unused
    #[serde(default)]
    pub boxes: serde_json::Value,
    /// Per-class lists of instance masks
    #[serde(default)]
    pub segmentations: Option<Vec<Option<Vec<RleObject>>>>,
    /// Per-class keypoints; unused
    #[serde(default)]
    pub keypoints: serde_json::Value,
}

impl DetectionFile {
    /// Read a detection file.
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open detection file '{}': {}", path.display(), e),
            ))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::InvalidDetection(format!("{}: {}", path.display(), e))
        })
    }

    /// Single-class detection bundle holding the given masks.
    pub fn from_masks(masks: &[BinaryMask]) -> Self {
        let rles: Vec<RleObject> = masks.iter().map(|m| RleObject::from(&encode(m))).collect();
        Self {
            boxes: serde_json::Value::Null,
            segmentations: Some(vec![Some(Vec::new()), Some(rles)]),
            keypoints: serde_json::Value::Null,
        }
    }

    /// Segmentations of all classes flattened in class order.
    pub fn rles(&self) -> Result<Vec<Rle>> {
        self.segmentations
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .map(RleObject::to_rle)
            .collect()
    }

    /// Decoded instance masks, in `rles()` order.
    pub fn masks(&self) -> Result<Vec<BinaryMask>> {
        self.rles()?.iter().map(decode).collect()
    }

    /// Write the bundle as JSON.
    pub fn save<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        fs::write(file_path, serde_json::to_vec(self)?)?;
        Ok(())
    }
}

/// Detection files of one sequence, ordered by embedded frame index.
#[derive(Debug, Clone)]
pub struct DetectionDirectory {
    path: PathBuf,
    files: Vec<PathBuf>,
}

impl DetectionDirectory {
    /// List the `*.<extension>` files in `dir`.
    ///
    /// Fails if the directory is missing or a file name carries no frame index.
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(Error::MissingPath(path));
        }

        let mut indexed = Vec::new();
        for entry in fs::read_dir(&path)? {
            let file = entry?.path();
            if !file.is_file() || file.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let index = frame_index_from_path(&file).ok_or_else(|| {
                Error::InvalidDetection(format!(
                    "no frame index in file name '{}'",
                    file_name_str(&file)
                ))
            })?;
            indexed.push((index, file));
        }
        indexed.sort();

        Ok(Self {
            path,
            files: indexed.into_iter().map(|(_, f)| f).collect(),
        })
    }

    /// Directory the files were listed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of detection files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if there are no detection files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in frame order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// File for the given frame number.
    ///
    /// Frame numbers index the sorted file list, so the n-th file (0-based)
    /// belongs to frame n.
    pub fn file_for_frame(&self, frame: usize) -> Result<&Path> {
        match self.files.get(frame) {
            Some(file) if file.exists() => Ok(file.as_path()),
            Some(file) => Err(Error::MissingPath(file.clone())),
            None => Err(Error::MissingPath(
                self.path.join(format!("<frame {}>", frame)),
            )),
        }
    }

    /// Decoded masks for the given frame number.
    pub fn load_masks(&self, frame: usize) -> Result<Vec<BinaryMask>> {
        DetectionFile::new(self.file_for_frame(frame)?)?.masks()
    }
}
