//! Conversion of label maps into FBMS tracks and the FBMS track-file format.
//!
//! A track groups every pixel carrying one label across all frames of a
//! sequence. Labels are ground-truth region ids, so they already link frames
//! together and no re-identification happens here.
//!
//! The track file layout read by the FBMS scorer is:
//! ```text
//! <number of frames>
//! <number of tracks>
//! <label> <number of points>
//! <x> <y> <frame>
//! ...
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::mask::LabelMap;
use crate::{Error, Result};

/// A single pixel observation of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
    /// Frame index
    pub frame: usize,
}

/// Pixels of a track in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub frame: usize,
    /// (x, y) pixel positions, row-major order
    pub pixels: Vec<(usize, usize)>,
}

/// All observations sharing one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub label: u32,
    /// One entry per frame the label appears in, ordered by frame
    pub observations: Vec<Observation>,
}

impl Track {
    /// Frames in which the track was observed.
    pub fn frames(&self) -> Vec<usize> {
        self.observations.iter().map(|o| o.frame).collect()
    }

    /// Total number of pixel observations.
    pub fn num_points(&self) -> usize {
        self.observations.iter().map(|o| o.pixels.len()).sum()
    }

    /// Iterate over all points, by frame then row-major.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.observations.iter().flat_map(|o| {
            o.pixels
                .iter()
                .map(move |&(x, y)| Point { x, y, frame: o.frame })
        })
    }
}

/// Group the labelled pixels of every frame into tracks keyed by label.
///
/// Label 0 (unassigned) never forms a track. A label missing from a frame just
/// has no observation for it.
pub fn masks_to_tracks(frame_labels: &BTreeMap<usize, LabelMap>) -> BTreeMap<u32, Track> {
    let mut tracks: BTreeMap<u32, Track> = BTreeMap::new();

    for (&frame, labels) in frame_labels {
        let mut frame_pixels: BTreeMap<u32, Vec<(usize, usize)>> = BTreeMap::new();
        for y in 0..labels.nrows() {
            for x in 0..labels.ncols() {
                let label = labels[(y, x)];
                if label != 0 {
                    frame_pixels.entry(label).or_default().push((x, y));
                }
            }
        }

        for (label, pixels) in frame_pixels {
            tracks
                .entry(label)
                .or_insert_with(|| Track { label, observations: Vec::new() })
                .observations
                .push(Observation { frame, pixels });
        }
    }

    tracks
}

/// Write tracks in the FBMS track-file format.
pub fn write_tracks<W: Write>(
    writer: &mut W,
    tracks: &BTreeMap<u32, Track>,
    num_frames: usize,
) -> io::Result<()> {
    writeln!(writer, "{}", num_frames)?;
    writeln!(writer, "{}", tracks.len())?;
    for track in tracks.values() {
        writeln!(writer, "{} {}", track.label, track.num_points())?;
        for point in track.points() {
            writeln!(writer, "{} {} {}", point.x, point.y, point.frame)?;
        }
    }
    Ok(())
}

/// Render tracks in the FBMS track-file format.
pub fn tracks_text(tracks: &BTreeMap<u32, Track>, num_frames: usize) -> Result<String> {
    let mut buffer = Vec::new();
    write_tracks(&mut buffer, tracks, num_frames)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write tracks to `path`, replacing any existing file.
pub fn write_tracks_file<P: AsRef<Path>>(
    path: P,
    tracks: &BTreeMap<u32, Track>,
    num_frames: usize,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        Error::IoError(io::Error::new(
            e.kind(),
            format!("failed to create track file '{}': {}", path.display(), e),
        ))
    })?;

    let mut writer = BufWriter::new(file);
    write_tracks(&mut writer, tracks, num_frames)?;
    writer.flush()?;
    Ok(())
}
