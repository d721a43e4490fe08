//! FBMS ground-truth definition file (`<sequence>Def.dat`) parser.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Error, Result};

/// Upper bound on the declared region count.
const MAX_REGIONS: usize = u16::MAX as usize;

/// One annotated frame listed in a definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFrame {
    /// 0-based frame number within the shot
    pub frame: usize,
    /// Label image, relative to the ground-truth directory
    pub file_name: String,
    /// Source video frame the annotation belongs to
    pub input_file_name: Option<String>,
}

/// Parser for FBMS `Def.dat` files.
///
/// These files alternate between a description line and a value line:
/// ```text
/// Ground truth definition file; do not change!
///
/// Total number of regions:
/// 2
/// Color (r*256*256+g*256+b) of region 0:
/// 0
/// Color (r*256*256+g*256+b) of region 1:
/// 16777215
/// Scale of region 0:
/// 0
/// Scale of region 1:
/// 0
/// Total number of frames in this shot:
/// 19
/// Total number of labeled frames for this shot:
/// 1
/// Frame number:
/// 0
/// File name:
/// cars1_01.pgm
/// Input file name:
/// cars1_01.jpg
/// ```
#[derive(Debug, Clone)]
pub struct DefinitionFile {
    path: String,
    region_colors: Vec<u32>,
    num_frames: usize,
    labeled_frames: Vec<LabeledFrame>,
}

impl DefinitionFile {
    /// Read and parse the definition file at the given path.
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref().to_string_lossy().to_string();
        let file = File::open(&file_path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open definition file '{}': {}", path, e),
            ))
        })?;

        let reader = BufReader::new(file);
        let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;

        Self::parse(&lines, path)
    }

    /// Parse definition file lines; `path` is only used in error messages.
    pub fn parse<S: AsRef<str>>(lines: &[S], path: String) -> Result<Self> {
        let invalid = |message: String| Error::InvalidGroundtruth(format!("{}: {}", path, message));

        let mut num_regions: Option<usize> = None;
        let mut region_colors: Vec<Option<u32>> = Vec::new();
        let mut num_frames: Option<usize> = None;
        let mut num_labeled: Option<usize> = None;
        let mut labeled_frames: Vec<LabeledFrame> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].as_ref().trim();
            i += 1;

            if line.starts_with("Total number of regions:") {
                let n: usize = parse_value(lines, i, line).map_err(invalid)?;
                if n > MAX_REGIONS {
                    return Err(invalid(format!(
                        "region count {} exceeds the limit of {}",
                        n, MAX_REGIONS
                    )));
                }
                region_colors = vec![None; n];
                num_regions = Some(n);
                i += 1;
            } else if line.starts_with("Color") && line.contains("of region") {
                let region = region_index(line).map_err(invalid)?;
                let color: u32 = parse_value(lines, i, line).map_err(invalid)?;
                let slot = region_colors.get_mut(region).ok_or_else(|| {
                    invalid(format!("color given for undeclared region {}", region))
                })?;
                *slot = Some(color);
                i += 1;
            } else if line.starts_with("Scale of region") {
                // Scales are not used for labelling.
                i += 1;
            } else if line.starts_with("Total number of frames in this shot:") {
                num_frames = Some(parse_value(lines, i, line).map_err(invalid)?);
                i += 1;
            } else if line.starts_with("Total number of labeled frames for this shot:") {
                num_labeled = Some(parse_value(lines, i, line).map_err(invalid)?);
                i += 1;
            } else if line.starts_with("Frame number:") {
                let frame: usize = parse_value(lines, i, line).map_err(invalid)?;
                labeled_frames.push(LabeledFrame {
                    frame,
                    file_name: String::new(),
                    input_file_name: None,
                });
                i += 1;
            } else if line.starts_with("File name:") {
                let value = raw_value(lines, i, line).map_err(invalid)?;
                let entry = labeled_frames
                    .last_mut()
                    .ok_or_else(|| invalid("'File name:' before any 'Frame number:'".to_string()))?;
                entry.file_name = value.to_string();
                i += 1;
            } else if line.starts_with("Input file name:") {
                let value = raw_value(lines, i, line).map_err(invalid)?;
                if let Some(entry) = labeled_frames.last_mut() {
                    entry.input_file_name = Some(value.to_string());
                }
                i += 1;
            }
        }

        let num_regions = num_regions.ok_or_else(|| invalid("missing region count".to_string()))?;
        let region_colors = region_colors
            .into_iter()
            .enumerate()
            .map(|(region, color)| {
                color.ok_or_else(|| invalid(format!("missing color for region {}", region)))
            })
            .collect::<Result<Vec<u32>>>()?;
        debug_assert_eq!(region_colors.len(), num_regions);

        let num_frames = num_frames.ok_or_else(|| invalid("missing frame count".to_string()))?;
        if let Some(expected) = num_labeled {
            if expected != labeled_frames.len() {
                return Err(invalid(format!(
                    "declares {} labeled frames but lists {}",
                    expected,
                    labeled_frames.len()
                )));
            }
        }
        if let Some(frame) = labeled_frames.iter().find(|f| f.file_name.is_empty()) {
            return Err(invalid(format!("labeled frame {} has no file name", frame.frame)));
        }

        Ok(Self {
            path,
            region_colors,
            num_frames,
            labeled_frames,
        })
    }

    /// Path the file was read from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of regions, background included.
    pub fn num_regions(&self) -> usize {
        self.region_colors.len()
    }

    /// Color of each region, indexed by region id.
    pub fn region_colors(&self) -> &[u32] {
        &self.region_colors
    }

    /// Total number of frames in the shot (labeled or not).
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Annotated frames in file order.
    pub fn labeled_frames(&self) -> &[LabeledFrame] {
        &self.labeled_frames
    }
}

fn raw_value<'a, S: AsRef<str>>(lines: &'a [S], i: usize, label: &str) -> std::result::Result<&'a str, String> {
    lines
        .get(i)
        .map(|l| l.as_ref().trim())
        .ok_or_else(|| format!("missing value after '{}'", label))
}

fn parse_value<T: std::str::FromStr, S: AsRef<str>>(
    lines: &[S],
    i: usize,
    label: &str,
) -> std::result::Result<T, String> {
    let value = raw_value(lines, i, label)?;
    value
        .parse()
        .map_err(|_| format!("value '{}' after '{}' is not a number", value, label))
}

/// Region index from a line like `Color (r*256*256+g*256+b) of region 3:`.
fn region_index(line: &str) -> std::result::Result<usize, String> {
    line.rsplit("of region")
        .next()
        .map(|s| s.trim().trim_end_matches(':').trim())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("cannot read region index from '{}'", line))
}
