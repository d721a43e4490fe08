//! Integration tests for the relabelling pipeline.
//!
//! These tests build small synthetic FBMS datasets on disk and run the full
//! ground truth -> detections -> matching -> track file flow.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use tempfile::TempDir;

use fbms_oracle::fbms::ALL_TRACKS_FILE;
use fbms_oracle::{
    BinaryMask, DataSplit, DetectionFile, Error, LabelMap, OracleConfig, SequenceProcessor,
};

// =============================================================================
// Dataset builders
// =============================================================================

/// Writes `<root>/<split>/<name>/GroundTruth/` with one PGM per labeled frame.
///
/// `frames` holds (frame number, grey-level image as label colors).
fn write_groundtruth(
    root: &Path,
    split: &str,
    name: &str,
    colors: &[u32],
    num_frames: usize,
    frames: &[(usize, LabelMap)],
) -> PathBuf {
    let gt_dir = root.join(split).join(name).join("GroundTruth");
    fs::create_dir_all(&gt_dir).unwrap();

    let mut text = String::from("Ground truth definition file; do not change!\n\n");
    text += &format!("Total number of regions:\n{}\n", colors.len());
    for (i, c) in colors.iter().enumerate() {
        text += &format!("Color (r*256*256+g*256+b) of region {}:\n{}\n", i, c);
    }
    for i in 0..colors.len() {
        text += &format!("Scale of region {}:\n0\n", i);
    }
    text += &format!("Total number of frames in this shot:\n{}\n", num_frames);
    text += &format!("Total number of labeled frames for this shot:\n{}\n", frames.len());

    for (frame, colors) in frames {
        let file_name = format!("{}_{:02}.pgm", name, frame);
        text += &format!(
            "Frame number:\n{}\nFile name:\n{}\nInput file name:\n{}_{:02}.jpg\n",
            frame, file_name, name, frame
        );

        let (rows, cols) = colors.shape();
        let img = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([colors[(y as usize, x as usize)] as u8])
        });
        img.save(gt_dir.join(&file_name)).unwrap();
    }

    let def_path = gt_dir.join(format!("{}Def.dat", name));
    fs::write(&def_path, text).unwrap();
    def_path
}

/// Writes one detection file per entry of `frames`, named `<name>_<index>.json`.
fn write_detections(root: &Path, split: &str, name: &str, frames: &[Vec<BinaryMask>]) {
    let dir = root.join(split).join(name);
    fs::create_dir_all(&dir).unwrap();
    for (i, masks) in frames.iter().enumerate() {
        DetectionFile::from_masks(masks)
            .save(dir.join(format!("{}_{:04}.json", name, i)))
            .unwrap();
    }
}

fn rect(rows: usize, cols: usize, r: std::ops::Range<usize>, c: std::ops::Range<usize>) -> BinaryMask {
    BinaryMask::from_fn(rows, cols, |i, j| u8::from(r.contains(&i) && c.contains(&j)))
}

/// Paints `mask` with `color` on an otherwise zero map.
fn colored(mask: &BinaryMask, color: u32) -> LabelMap {
    mask.map(|v| if v != 0 { color } else { 0 })
}

fn expected_points(mask: &BinaryMask, frame: usize) -> Vec<String> {
    let mut points = Vec::new();
    for y in 0..mask.nrows() {
        for x in 0..mask.ncols() {
            if mask[(y, x)] != 0 {
                points.push(format!("{} {} {}", x, y, frame));
            }
        }
    }
    points
}

struct Dataset {
    _dir: TempDir,
    fbms: PathBuf,
    detections: PathBuf,
    output: PathBuf,
}

fn dataset() -> Dataset {
    let dir = TempDir::new().unwrap();
    let fbms = dir.path().join("fbms");
    let detections = dir.path().join("detections");
    let output = dir.path().join("output");
    Dataset { _dir: dir, fbms, detections, output }
}

// =============================================================================
// Test 1: Perfect predictions over two frames
// =============================================================================

#[test]
fn test_integration_single_track_two_frames() {
    let ds = dataset();
    let frame_0 = rect(5, 5, 1..3, 1..4);
    let frame_1 = rect(5, 5, 2..4, 0..3);

    let def_path = write_groundtruth(
        &ds.fbms,
        "TrainingSet",
        "cars1",
        &[0, 255],
        2,
        &[(0, colored(&frame_0, 255)), (1, colored(&frame_1, 255))],
    );
    write_detections(
        &ds.detections,
        "TrainingSet",
        "cars1",
        &[vec![frame_0.clone()], vec![frame_1.clone()]],
    );

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let reports = processor
        .process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Train)
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.sequences.len(), 1);
    assert_eq!(report.sequences[0].num_tracks, 1);
    assert_eq!(report.sequences[0].num_labeled_frames, 2);

    // Track file: a single track labelled 1 spanning both frames
    let text = fs::read_to_string(ds.output.join("TrainingSet").join("cars1.dat")).unwrap();
    let mut points = expected_points(&frame_0, 0);
    points.extend(expected_points(&frame_1, 1));
    let mut expected = format!("2\n1\n1 {}\n", points.len());
    for p in &points {
        expected += p;
        expected += "\n";
    }
    assert_eq!(text, expected);

    // Manifests
    let shots = fs::read_to_string(&report.all_shots).unwrap();
    let shot_lines: Vec<&str> = shots.lines().collect();
    assert_eq!(shot_lines[0], "1");
    assert_eq!(PathBuf::from(shot_lines[1]), def_path.canonicalize().unwrap());

    let tracks = fs::read_to_string(&report.all_tracks).unwrap();
    let track_lines: Vec<&str> = tracks.lines().collect();
    assert_eq!(track_lines.len(), 1);
    assert_eq!(
        PathBuf::from(track_lines[0]),
        report.sequences[0].track_file.canonicalize().unwrap()
    );
    assert!(Path::new(track_lines[0]).is_absolute());
}

// =============================================================================
// Test 2: Frame without detections
// =============================================================================

#[test]
fn test_integration_empty_detection_frame() {
    let ds = dataset();
    let region = rect(4, 4, 0..2, 0..2);

    write_groundtruth(
        &ds.fbms,
        "TestSet",
        "dogs01",
        &[0, 200],
        3,
        &[(0, colored(&region, 200)), (1, colored(&region, 200))],
    );
    write_detections(&ds.detections, "TestSet", "dogs01", &[vec![region.clone()], vec![]]);

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let reports = processor
        .process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Test)
        .unwrap();

    assert_eq!(reports.len(), 1);
    let text = fs::read_to_string(&reports[0].sequences[0].track_file).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "3");
    assert_eq!(lines[1], "1");
    assert_eq!(lines[2], "1 4");
    // Every point belongs to frame 0
    assert!(lines[3..].iter().all(|l| l.ends_with(" 0")));
}

// =============================================================================
// Test 3: Two regions, swapped prediction order, one spurious prediction
// =============================================================================

#[test]
fn test_integration_relabels_by_region_identity() {
    let ds = dataset();
    let left = rect(6, 6, 0..6, 0..2);
    let right = rect(6, 6, 0..6, 4..6);
    let mut gt = colored(&left, 100);
    gt += colored(&right, 180);

    write_groundtruth(&ds.fbms, "TrainingSet", "people1", &[0, 100, 180], 1, &[(0, gt)]);
    // Right region predicted first, left second, plus a stray mask in the middle.
    let stray = rect(6, 6, 2..3, 2..4);
    write_detections(
        &ds.detections,
        "TrainingSet",
        "people1",
        &[vec![right.clone(), stray, left.clone()]],
    );

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let report = processor
        .process_split(
            ds.fbms.join("TrainingSet"),
            ds.detections.join("TrainingSet"),
            ds.output.join("TrainingSet"),
        )
        .unwrap();

    let text = fs::read_to_string(&report.sequences[0].track_file).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "1");
    assert_eq!(lines[1], "2");
    // Region 1 (left) comes first and only holds columns 0..2
    assert_eq!(lines[2], "1 12");
    for line in &lines[3..15] {
        let x: usize = line.split(' ').next().unwrap().parse().unwrap();
        assert!(x < 2, "unexpected point {}", line);
    }
    assert_eq!(lines[15], "2 12");
    assert_eq!(lines.len(), 28);
}

// =============================================================================
// Test 4: Several sequences, manifest order
// =============================================================================

#[test]
fn test_integration_manifest_lists_all_sequences() {
    let ds = dataset();
    let mask = rect(3, 3, 0..1, 0..3);
    for name in ["tennis", "bear01", "marple2"] {
        write_groundtruth(&ds.fbms, "TestSet", name, &[16777215, 0], 1, &[(0, LabelMap::from_element(3, 3, 0))]);
        write_detections(&ds.detections, "TestSet", name, &[vec![mask.clone()]]);
    }

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let report = processor
        .process_split(
            ds.fbms.join("TestSet"),
            ds.detections.join("TestSet"),
            ds.output.join("TestSet"),
        )
        .unwrap();

    let names: Vec<&str> = report.sequences.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["bear01", "marple2", "tennis"]);

    let shots = fs::read_to_string(&report.all_shots).unwrap();
    assert!(shots.starts_with("3\n"));
    assert_eq!(shots.lines().count(), 4);
    assert!(shots.lines().nth(1).unwrap().ends_with("bear01Def.dat"));

    let tracks = fs::read_to_string(&report.all_tracks).unwrap();
    assert_eq!(tracks.lines().count(), 3);
    assert!(tracks.lines().last().unwrap().ends_with("tennis.dat"));
}

// =============================================================================
// Test 5: Failures abort the run
// =============================================================================

#[test]
fn test_integration_missing_detection_file() {
    let ds = dataset();
    let region = rect(4, 4, 1..3, 1..3);
    write_groundtruth(
        &ds.fbms,
        "TrainingSet",
        "horses01",
        &[0, 255],
        30,
        &[(0, colored(&region, 255)), (19, colored(&region, 255))],
    );
    write_detections(&ds.detections, "TrainingSet", "horses01", &[vec![region.clone()]]);

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let result = processor.process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Train);

    assert!(matches!(result, Err(Error::MissingPath(_))));
    assert!(!ds.output.join("TrainingSet").join(ALL_TRACKS_FILE).exists());
}

#[test]
fn test_integration_missing_groundtruth_dir() {
    let ds = dataset();
    fs::create_dir_all(ds.fbms.join("TrainingSet").join("cats01")).unwrap();
    fs::create_dir_all(ds.detections.join("TrainingSet").join("cats01")).unwrap();

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let result = processor.process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Train);

    match result {
        Err(Error::MissingPath(path)) => assert!(path.ends_with("cats01/GroundTruth")),
        other => panic!("expected MissingPath, got {:?}", other),
    }
}

#[test]
fn test_integration_missing_split_dir() {
    let ds = dataset();
    fs::create_dir_all(ds.fbms.join("TrainingSet")).unwrap();
    fs::create_dir_all(&ds.detections).unwrap();

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let result = processor.process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::All);

    assert!(matches!(result, Err(Error::MissingPath(_))));
}

#[test]
fn test_integration_bad_background_color() {
    let ds = dataset();
    let region = rect(2, 2, 0..1, 0..1);
    write_groundtruth(&ds.fbms, "TestSet", "cats02", &[7, 255], 1, &[(0, colored(&region, 255))]);
    write_detections(&ds.detections, "TestSet", "cats02", &[vec![region.clone()]]);

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let result = processor.process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Test);

    assert!(matches!(result, Err(Error::InvalidBackground { color: 7, .. })));
}

#[test]
fn test_integration_prediction_shape_mismatch() {
    let ds = dataset();
    let region = rect(4, 4, 0..2, 0..2);
    write_groundtruth(&ds.fbms, "TestSet", "cats03", &[0, 255], 1, &[(0, colored(&region, 255))]);
    write_detections(&ds.detections, "TestSet", "cats03", &[vec![rect(4, 5, 0..2, 0..2)]]);

    let processor = SequenceProcessor::new(OracleConfig::default()).unwrap();
    let result = processor.process_dataset(&ds.fbms, &ds.detections, &ds.output, DataSplit::Test);

    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}
