//! FBMS dataset I/O.
//!
//! This module reads and writes the files of the Freiburg-Berkeley Motion
//! Segmentation benchmark:
//!
//! - `DefinitionFile` - Parse `<sequence>Def.dat` ground-truth definitions
//! - `FbmsGroundtruth` - Load per-frame region label maps from PGM/PPM images
//! - `write_all_tracks` / `write_all_shots` - Split-level manifests for the scorer

mod definition_file;
mod groundtruth;
mod manifest;

pub use definition_file::{DefinitionFile, LabeledFrame};
pub use groundtruth::{FbmsGroundtruth, BACKGROUND_REGION};
pub use manifest::{write_all_shots, write_all_tracks, ALL_SHOTS_FILE, ALL_TRACKS_FILE};
