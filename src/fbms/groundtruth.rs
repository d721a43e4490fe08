//! FBMS ground-truth loader: definition file plus per-frame label images.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::warn;

use super::DefinitionFile;
use crate::mask::{label_mask, BinaryMask, LabelMap};
use crate::{Error, Result};

/// Region id of the background.
pub const BACKGROUND_REGION: u32 = 0;

/// Ground truth of one FBMS sequence (the contents of its `GroundTruth/` directory).
#[derive(Debug, Clone)]
pub struct FbmsGroundtruth {
    directory: PathBuf,
    definition_path: PathBuf,
    definition: DefinitionFile,
    color_to_region: HashMap<u32, u32>,
}

impl FbmsGroundtruth {
    /// Load the ground truth of `sequence` stored in `directory`.
    ///
    /// The definition file is `<directory>/<sequence>Def.dat`.
    pub fn new<P: AsRef<Path>>(directory: P, sequence: &str) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.is_dir() {
            return Err(Error::MissingPath(directory));
        }
        let definition_path = directory.join(format!("{}Def.dat", sequence));
        Self::with_definition(directory, definition_path)
    }

    /// Load the ground truth in `directory` described by an explicit definition file.
    pub fn with_definition<P: AsRef<Path>, Q: AsRef<Path>>(
        directory: P,
        definition_path: Q,
    ) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let definition_path = definition_path.as_ref().to_path_buf();
        if !definition_path.is_file() {
            return Err(Error::MissingPath(definition_path));
        }

        let definition = DefinitionFile::new(&definition_path)?;
        let mut color_to_region = HashMap::new();
        for (region, &color) in definition.region_colors().iter().enumerate() {
            if color_to_region.insert(color, region as u32).is_some() {
                return Err(Error::InvalidGroundtruth(format!(
                    "color {} used by more than one region in {}",
                    color,
                    definition_path.display()
                )));
            }
        }

        Ok(Self {
            directory,
            definition_path,
            definition,
            color_to_region,
        })
    }

    /// Path of the parsed `Def.dat` file.
    pub fn definition_path(&self) -> &Path {
        &self.definition_path
    }

    /// Parsed definition file.
    pub fn definition(&self) -> &DefinitionFile {
        &self.definition
    }

    /// Total number of frames in the shot.
    pub fn num_frames(&self) -> usize {
        self.definition.num_frames()
    }

    /// Region ids other than the background, in region order.
    pub fn foreground_regions(&self) -> Vec<u32> {
        (0..self.definition.num_regions() as u32)
            .filter(|&r| r != BACKGROUND_REGION)
            .collect()
    }

    /// Check that the background region uses one of the allowed colors.
    ///
    /// PPM annotations use white (16777215) as background, PGM annotations use 0.
    pub fn check_background(&self, allowed: &[u32]) -> Result<()> {
        let color = self
            .definition
            .region_colors()
            .get(BACKGROUND_REGION as usize)
            .copied()
            .ok_or_else(|| {
                Error::InvalidGroundtruth(format!(
                    "{} declares no regions",
                    self.definition_path.display()
                ))
            })?;

        if !allowed.contains(&color) {
            return Err(Error::InvalidBackground {
                color,
                expected: allowed.to_vec(),
            });
        }
        Ok(())
    }

    /// Region label map of every labeled frame, keyed by frame number.
    pub fn frame_labels(&self) -> Result<BTreeMap<usize, LabelMap>> {
        let mut frames = BTreeMap::new();
        for labeled in self.definition.labeled_frames() {
            let path = self.directory.join(&labeled.file_name);
            if !path.is_file() {
                return Err(Error::MissingPath(path));
            }
            let labels = self.load_labels(&path)?;
            frames.insert(labeled.frame, labels);
        }
        Ok(frames)
    }

    /// One binary mask per foreground region, in region order.
    pub fn region_masks(&self, labels: &LabelMap) -> Vec<BinaryMask> {
        self.foreground_regions()
            .into_iter()
            .map(|region| label_mask(labels, region))
            .collect()
    }

    fn load_labels(&self, path: &Path) -> Result<LabelMap> {
        let image = image::open(path)?;
        let colors = image_colors(&image);

        let mut unknown = 0usize;
        let labels = colors.map(|color| match self.color_to_region.get(&color) {
            Some(&region) => region,
            None => {
                unknown += 1;
                BACKGROUND_REGION
            }
        });

        if unknown > 0 {
            warn!(
                path = %path.display(),
                pixels = unknown,
                "label image has colors not declared in the definition file, treating them as background"
            );
        }
        Ok(labels)
    }
}

/// Per-pixel color values: grey level for PGM, `r*65536 + g*256 + b` otherwise.
fn image_colors(image: &DynamicImage) -> LabelMap {
    let (width, height) = (image.width() as usize, image.height() as usize);
    match image {
        DynamicImage::ImageLuma8(gray) => LabelMap::from_fn(height, width, |r, c| {
            gray.get_pixel(c as u32, r as u32)[0] as u32
        }),
        DynamicImage::ImageLuma16(gray) => LabelMap::from_fn(height, width, |r, c| {
            gray.get_pixel(c as u32, r as u32)[0] as u32
        }),
        other => {
            let rgb = other.to_rgb8();
            LabelMap::from_fn(height, width, |r, c| {
                let [red, green, blue] = rgb.get_pixel(c as u32, r as u32).0;
                (red as u32) * 256 * 256 + (green as u32) * 256 + blue as u32
            })
        }
    }
}
