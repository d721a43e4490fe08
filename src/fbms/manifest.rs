//! Split-level manifest files read by the FBMS scorer.
//!
//! - `all_tracks.txt`: absolute path of every track file, one per line
//! - `all_shots.txt`: number of shots, then the absolute path of every
//!   ground-truth definition file, one per line

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::utils::absolute_path;
use crate::{Error, Result};

/// File name of the track-file manifest.
pub const ALL_TRACKS_FILE: &str = "all_tracks.txt";

/// File name of the ground-truth manifest.
pub const ALL_SHOTS_FILE: &str = "all_shots.txt";

/// Write `all_tracks.txt` into `output_dir`.
pub fn write_all_tracks<P: AsRef<Path>>(output_dir: P, track_files: &[PathBuf]) -> Result<PathBuf> {
    let path = output_dir.as_ref().join(ALL_TRACKS_FILE);
    let mut writer = create(&path)?;
    for track_file in track_files {
        writeln!(writer, "{}", absolute_path(track_file)?.display())?;
    }
    writer.flush()?;
    Ok(path)
}

/// Write `all_shots.txt` into `output_dir`.
pub fn write_all_shots<P: AsRef<Path>>(output_dir: P, definition_files: &[PathBuf]) -> Result<PathBuf> {
    let path = output_dir.as_ref().join(ALL_SHOTS_FILE);
    let mut writer = create(&path)?;
    writeln!(writer, "{}", definition_files.len())?;
    for definition_file in definition_files {
        writeln!(writer, "{}", absolute_path(definition_file)?.display())?;
    }
    writer.flush()?;
    Ok(path)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to create manifest '{}': {}", path.display(), e),
        ))
    })?;
    Ok(BufWriter::new(file))
}
