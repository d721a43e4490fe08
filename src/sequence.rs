//! Sequence driver: relabels every labeled frame of every sequence and writes
//! the FBMS track files and manifests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::detections::DetectionDirectory;
use crate::fbms::{write_all_shots, write_all_tracks, FbmsGroundtruth};
use crate::label_map::paint_label_map;
use crate::mask::{BinaryMask, LabelMap};
use crate::matching::{assign_masks, mask_cost_matrix};
use crate::tracks::{masks_to_tracks, write_tracks_file};
use crate::utils::{file_name_str, require_exists, sorted_subdirectories};
use crate::{DataSplit, OracleConfig, Result};

/// Outcome of processing one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    /// Sequence name (directory name)
    pub name: String,
    /// Written track file
    pub track_file: PathBuf,
    /// Ground-truth definition file of the sequence
    pub definition_file: PathBuf,
    /// Total number of frames in the shot
    pub num_frames: usize,
    /// Number of labeled frames that were relabelled
    pub num_labeled_frames: usize,
    /// Number of tracks in the track file
    pub num_tracks: usize,
}

/// Outcome of processing one split directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReport {
    pub output_dir: PathBuf,
    pub sequences: Vec<SequenceReport>,
    /// Path of `all_tracks.txt`
    pub all_tracks: PathBuf,
    /// Path of `all_shots.txt`
    pub all_shots: PathBuf,
}

/// Runs the relabelling pipeline over FBMS sequences.
#[derive(Debug, Clone)]
pub struct SequenceProcessor {
    config: OracleConfig,
}

impl SequenceProcessor {
    /// Create a processor; the configuration is validated first.
    pub fn new(config: OracleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Relabel one frame.
    ///
    /// # Arguments
    /// * `shape` - Ground-truth frame shape (rows, cols)
    /// * `region_masks` - One mask per foreground region, in region order
    /// * `predicted` - Predicted instance masks
    ///
    /// # Returns
    /// Label map holding `region_index + 1` under each matched prediction.
    pub fn process_frame(
        &self,
        shape: (usize, usize),
        region_masks: &[BinaryMask],
        predicted: &[BinaryMask],
    ) -> Result<LabelMap> {
        let cost = mask_cost_matrix(predicted, region_masks)?;
        let assignments = assign_masks(&cost)?;

        for &(p, g) in &assignments {
            debug!(predicted = p, region = g + 1, iou = 1.0 - cost[(p, g)], "matched mask");
        }

        paint_label_map(shape, &assignments, predicted)
    }

    /// Process one sequence directory and write `<output_dir>/<sequence>.dat`.
    pub fn process_sequence<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        sequence_dir: P,
        detections_dir: Q,
        output_dir: R,
    ) -> Result<SequenceReport> {
        let sequence_dir = sequence_dir.as_ref();
        let name = file_name_str(sequence_dir).to_string();

        let groundtruth_dir = sequence_dir.join(&self.config.groundtruth_dir_name);
        require_exists(&groundtruth_dir)?;
        let groundtruth = FbmsGroundtruth::new(&groundtruth_dir, &name)?;
        groundtruth.check_background(&self.config.background_colors)?;

        let frame_labels = groundtruth.frame_labels()?;
        let detections =
            DetectionDirectory::new(detections_dir.as_ref(), &self.config.detection_extension)?;

        let mut final_labels: BTreeMap<usize, LabelMap> = BTreeMap::new();
        for (&frame, labels) in &frame_labels {
            let region_masks = groundtruth.region_masks(labels);
            let predicted = detections.load_masks(frame)?;
            debug!(
                sequence = %name,
                frame,
                predicted = predicted.len(),
                regions = region_masks.len(),
                "relabelling frame"
            );

            let painted = self.process_frame(labels.shape(), &region_masks, &predicted)?;
            final_labels.insert(frame, painted);
        }

        let tracks = masks_to_tracks(&final_labels);
        let track_file = output_dir.as_ref().join(format!("{}.dat", name));
        write_tracks_file(&track_file, &tracks, groundtruth.num_frames())?;

        info!(
            sequence = %name,
            regions = groundtruth.definition().num_regions(),
            labeled_frames = final_labels.len(),
            tracks = tracks.len(),
            "wrote {}",
            track_file.display()
        );

        Ok(SequenceReport {
            name,
            track_file,
            definition_file: groundtruth.definition_path().to_path_buf(),
            num_frames: groundtruth.num_frames(),
            num_labeled_frames: final_labels.len(),
            num_tracks: tracks.len(),
        })
    }

    /// Process every sequence of one split and write its manifests.
    ///
    /// # Arguments
    /// * `fbms_dir` - Split directory of the dataset, e.g. `FBMS/TrainingSet`
    /// * `detections_dir` - Matching detection directory, one sub-directory per sequence
    /// * `output_dir` - Created if needed; receives track files and manifests
    pub fn process_split<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        fbms_dir: P,
        detections_dir: Q,
        output_dir: R,
    ) -> Result<SplitReport> {
        let (fbms_dir, detections_dir, output_dir) =
            (fbms_dir.as_ref(), detections_dir.as_ref(), output_dir.as_ref());
        require_exists(fbms_dir)?;
        require_exists(detections_dir)?;
        fs::create_dir_all(output_dir)?;

        let sequence_dirs = sorted_subdirectories(fbms_dir)?;
        info!(
            split = %fbms_dir.display(),
            sequences = sequence_dirs.len(),
            "processing split"
        );

        let mut sequences = Vec::with_capacity(sequence_dirs.len());
        for (i, sequence_dir) in sequence_dirs.iter().enumerate() {
            let name = file_name_str(sequence_dir);
            info!("[{}/{}] {}", i + 1, sequence_dirs.len(), name);
            let report =
                self.process_sequence(sequence_dir, detections_dir.join(name), output_dir)?;
            sequences.push(report);
        }

        let track_files: Vec<PathBuf> = sequences.iter().map(|s| s.track_file.clone()).collect();
        let definition_files: Vec<PathBuf> =
            sequences.iter().map(|s| s.definition_file.clone()).collect();
        let all_tracks = write_all_tracks(output_dir, &track_files)?;
        let all_shots = write_all_shots(output_dir, &definition_files)?;

        Ok(SplitReport {
            output_dir: output_dir.to_path_buf(),
            sequences,
            all_tracks,
            all_shots,
        })
    }

    /// Process the selected splits of a dataset root.
    ///
    /// Split directories (`TrainingSet`, `TestSet` by default) are resolved
    /// under each of the three roots.
    pub fn process_dataset<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        fbms_root: P,
        detections_root: Q,
        output_root: R,
        split: DataSplit,
    ) -> Result<Vec<SplitReport>> {
        let (fbms_root, detections_root, output_root) =
            (fbms_root.as_ref(), detections_root.as_ref(), output_root.as_ref());
        require_exists(fbms_root)?;
        require_exists(detections_root)?;
        fs::create_dir_all(output_root)?;

        self.config
            .split_dirs(split)
            .into_iter()
            .map(|dir| {
                self.process_split(
                    fbms_root.join(dir),
                    detections_root.join(dir),
                    output_root.join(dir),
                )
            })
            .collect()
    }
}
